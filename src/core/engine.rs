// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Monitor - start/stop control over one monitoring session

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{Diagnostics, EventBus, FramePipeline, FrameScheduler, SchedulerStats};
use crate::alerts::{AlertDispatcher, AlertJournal, DispatchStats, NotificationSink};
use crate::config::Config;
use crate::detection::{Detector, FrameSource};
use crate::error::MonitorError;
use crate::tracking::TrackingEngine;
use crate::zones::ZoneTable;

/// Final counters of a stopped session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub layout_id: String,
    pub uptime: Duration,
    pub scheduler: SchedulerStats,
    pub dispatch: DispatchStats,
}

struct Session {
    layout_id: String,
    started: Instant,
    shutdown_tx: broadcast::Sender<()>,
    frame_task: JoinHandle<SchedulerStats>,
    dispatcher: AlertDispatcher,
}

/// Main monitoring engine
///
/// Owns two long-lived contexts per session: the frame task, which runs
/// the tracking cycle on a fixed period, and the alert dispatcher, which
/// delivers notifications in the order they were raised. The two only
/// share the alert queue.
pub struct Monitor {
    config: Arc<Config>,
    sink: Arc<dyn NotificationSink>,
    bus: Arc<EventBus>,
    diagnostics_tx: Arc<watch::Sender<Diagnostics>>,
    diagnostics_rx: watch::Receiver<Diagnostics>,
    session: Option<Session>,
}

impl Monitor {
    pub fn new(config: Config, sink: Arc<dyn NotificationSink>) -> Self {
        let (diagnostics_tx, diagnostics_rx) = watch::channel(Diagnostics::default());

        Self {
            config: Arc::new(config),
            sink,
            bus: Arc::new(EventBus::default()),
            diagnostics_tx: Arc::new(diagnostics_tx),
            diagnostics_rx,
            session: None,
        }
    }

    /// Start monitoring `layout_id`. Must be called from within a tokio runtime.
    ///
    /// Layout problems are reported here and nothing is spawned.
    pub fn start(
        &mut self,
        layout_id: &str,
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
    ) -> Result<(), MonitorError> {
        if let Some(session) = &self.session {
            return Err(MonitorError::AlreadyRunning(session.layout_id.clone()));
        }

        let table = Arc::new(ZoneTable::from_config(&self.config, layout_id)?);
        info!(
            "Starting monitor on layout '{}' ({} zones, source {}, detector {})",
            layout_id,
            table.len(),
            source.name(),
            detector.name()
        );

        let dispatcher = AlertDispatcher::spawn(self.sink.clone(), &self.config.dispatch, self.open_journal());
        let engine = TrackingEngine::new(table, &self.config.tracking, dispatcher.queue());
        let pipeline = FramePipeline::new(
            source,
            detector,
            engine,
            self.bus.clone(),
            self.diagnostics_tx.clone(),
            dispatcher.metrics().clone(),
        );

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut scheduler = FrameScheduler::new(self.config.tracking.cycle_interval());
        let frame_task = tokio::spawn(async move {
            let mut pipeline = pipeline;
            scheduler.run(&mut pipeline, shutdown_rx).await;
            scheduler.stats()
        });

        self.diagnostics_tx.send_modify(|d| {
            *d = Diagnostics {
                running: true,
                layout_id: Some(layout_id.to_string()),
                ..Diagnostics::default()
            };
        });
        self.bus.publish_status("layout", layout_id);

        self.session = Some(Session {
            layout_id: layout_id.to_string(),
            started: Instant::now(),
            shutdown_tx,
            frame_task,
            dispatcher,
        });

        info!("Monitor running");
        Ok(())
    }

    /// Stop the frame task, then let the dispatcher drain.
    ///
    /// The frame task stops first so no new alerts are raised while the
    /// queue is draining.
    pub async fn stop(&mut self) -> Result<SessionSummary, MonitorError> {
        let session = self.session.take().ok_or(MonitorError::NotRunning)?;
        info!("Stopping monitor on layout '{}'...", session.layout_id);

        let _ = session.shutdown_tx.send(());
        let frame_result = session.frame_task.await;
        if let Err(e) = &frame_result {
            warn!("Frame task ended abnormally: {}", e);
        }

        let dispatch = session.dispatcher.shutdown().await?;
        let scheduler = frame_result?;

        self.diagnostics_tx.send_modify(|d| {
            d.running = false;
            d.queue_depth = dispatch.queue_depth;
        });
        self.bus.publish_status("layout", "stopped");

        let summary = SessionSummary {
            layout_id: session.layout_id,
            uptime: session.started.elapsed(),
            scheduler,
            dispatch,
        };
        info!(
            "Monitor stopped after {:?}: {} cycles, {} alerts delivered, {} dropped",
            summary.uptime, summary.scheduler.total_cycles, summary.dispatch.delivered, summary.dispatch.dropped_on_shutdown
        );
        Ok(summary)
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Layout of the running session
    pub fn layout_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.layout_id.as_str())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// Current diagnostics, with a live queue depth
    pub fn diagnostics(&self) -> Diagnostics {
        let mut d = self.diagnostics_rx.borrow().clone();
        if let Some(session) = &self.session {
            d.queue_depth = session.dispatcher.metrics().depth();
        }
        d
    }

    pub fn subscribe_diagnostics(&self) -> watch::Receiver<Diagnostics> {
        self.diagnostics_rx.clone()
    }

    pub fn uptime(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.started.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn open_journal(&self) -> Option<AlertJournal> {
        if !self.config.journal.enabled {
            return None;
        }
        match AlertJournal::open(&self.config.journal.path) {
            Ok(journal) => Some(journal),
            Err(e) => {
                warn!(
                    "Alert journal {:?} unavailable, continuing without it: {}",
                    self.config.journal.path, e
                );
                None
            }
        }
    }
}
