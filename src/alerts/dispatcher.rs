// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Alert dispatcher - the single consumer that drains the alert queue

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{alert_queue, AlertEvent, AlertJournal, AlertQueue, AlertReceiver, DispatchMetrics, DispatchStats, NotificationSink};
use crate::config::DispatchConfig;

/// Owns the consumer task and hands out producer handles.
///
/// Exactly one consumer exists per dispatcher, which is what keeps delivery
/// in enqueue order.
pub struct AlertDispatcher {
    queue: AlertQueue,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<DispatchStats>,
}

impl AlertDispatcher {
    /// Spawn the consumer on the current tokio runtime
    pub fn spawn(sink: Arc<dyn NotificationSink>, config: &DispatchConfig, journal: Option<AlertJournal>) -> Self {
        let (queue, receiver) = alert_queue();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let consumer = Consumer {
            receiver,
            sink,
            send_timeout: config.send_timeout(),
            shutdown_grace: config.shutdown_grace(),
            journal,
            in_flight: None,
        };
        let handle = tokio::spawn(consumer.run(shutdown_rx));

        Self {
            queue,
            shutdown_tx,
            handle,
        }
    }

    /// Producer handle for the tracking side
    pub fn queue(&self) -> AlertQueue {
        self.queue.clone()
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        self.queue.metrics()
    }

    /// Stop accepting work and drain what is already queued.
    ///
    /// Queued alerts keep being delivered until the configured grace period
    /// runs out; anything still queued after that is dropped and counted.
    pub async fn shutdown(self) -> Result<DispatchStats, JoinError> {
        let _ = self.shutdown_tx.send(());
        drop(self.queue);
        self.handle.await
    }
}

struct Consumer {
    receiver: AlertReceiver,
    sink: Arc<dyn NotificationSink>,
    send_timeout: Duration,
    shutdown_grace: Duration,
    journal: Option<AlertJournal>,
    /// Alert taken off the queue by the drain and not yet settled
    in_flight: Option<AlertEvent>,
}

impl Consumer {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> DispatchStats {
        info!("Alert dispatcher started (sink: {})", self.sink.name());

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                event = self.receiver.recv() => match event {
                    Some(event) => self.deliver(event).await,
                    None => {
                        info!("All alert producers closed, dispatcher exiting");
                        return self.receiver.metrics().snapshot();
                    }
                }
            }
        }

        let pending = self.receiver.metrics().depth();
        info!("Alert dispatcher draining {} queued alerts", pending);

        if timeout(self.shutdown_grace, self.drain()).await.is_err() {
            let mut dropped = 0u64;
            if let Some(event) = self.in_flight.take() {
                debug!("Abandoning in-flight alert {} for zone {}", event.id, event.zone_id);
                self.journal_outcome(&event, &Err("abandoned at shutdown".to_string()));
                dropped += 1;
            }
            while let Some(event) = self.receiver.try_recv() {
                debug!("Dropping alert {} for zone {}", event.id, event.zone_id);
                self.journal_outcome(&event, &Err("dropped at shutdown".to_string()));
                dropped += 1;
            }
            let metrics = self.receiver.metrics();
            metrics.dropped.fetch_add(dropped, std::sync::atomic::Ordering::Relaxed);
            warn!(
                "Shutdown grace period of {:?} elapsed, {} alerts dropped",
                self.shutdown_grace, dropped
            );
        }

        let stats = self.receiver.metrics().snapshot();
        info!(
            "Alert dispatcher stopped: {} delivered, {} failed, {} timed out, {} undeliverable",
            stats.delivered, stats.failed, stats.timed_out, stats.undeliverable
        );
        stats
    }

    async fn drain(&mut self) {
        while let Some(event) = self.receiver.try_recv() {
            self.in_flight = Some(event.clone());
            self.deliver(event).await;
            self.in_flight = None;
        }
    }

    /// Deliver one alert. Failures are logged and never retried.
    async fn deliver(&mut self, event: AlertEvent) {
        let metrics = self.receiver.metrics().clone();

        let outcome = match event.contact.as_ref() {
            None => {
                warn!(
                    "Alert {} for zone {} (track {}) has no contact, not delivered",
                    event.id, event.zone_id, event.object.id
                );
                metrics.record(&metrics.undeliverable);
                Err("no contact configured for zone".to_string())
            }
            Some(contact) => {
                let message = event.message();
                match timeout(self.send_timeout, self.sink.send(contact, &message, Some(&event.frame))).await {
                    Ok(Ok(())) => {
                        info!(
                            "Alert {} delivered to {} (zone {}, track {})",
                            event.id, contact.name, event.zone_id, event.object.id
                        );
                        metrics.record(&metrics.delivered);
                        Ok(())
                    }
                    Ok(Err(e)) => {
                        error!(
                            "Alert {} to {} failed (zone {}, track {}): {}",
                            event.id, contact.name, event.zone_id, event.object.id, e
                        );
                        metrics.record(&metrics.failed);
                        Err(e.to_string())
                    }
                    Err(_) => {
                        error!(
                            "Alert {} to {} timed out after {:?} (zone {}, track {})",
                            event.id, contact.name, self.send_timeout, event.zone_id, event.object.id
                        );
                        metrics.record(&metrics.timed_out);
                        Err(format!("timed out after {:?}", self.send_timeout))
                    }
                }
            }
        };

        self.journal_outcome(&event, &outcome);
    }

    fn journal_outcome(&mut self, event: &AlertEvent, outcome: &Result<(), String>) {
        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = journal.record(event, outcome) {
                warn!("Failed to write alert journal {:?}: {}", journal.path(), e);
            }
        }
    }
}
