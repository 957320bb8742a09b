// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Frame pipeline - acquire, detect, track, publish

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::warn;

use super::{CycleTask, Diagnostics, EventBus};
use crate::alerts::DispatchMetrics;
use crate::detection::{Detector, FrameSource};
use crate::tracking::TrackingEngine;

/// Everything the frame context owns for one monitoring session
pub struct FramePipeline {
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    engine: TrackingEngine,
    bus: Arc<EventBus>,
    diagnostics: Arc<watch::Sender<Diagnostics>>,
    dispatch_metrics: Arc<DispatchMetrics>,
    cycles_completed: u64,
    cycles_failed: u64,
}

impl FramePipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        engine: TrackingEngine,
        bus: Arc<EventBus>,
        diagnostics: Arc<watch::Sender<Diagnostics>>,
        dispatch_metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            source,
            detector,
            engine,
            bus,
            diagnostics,
            dispatch_metrics,
            cycles_completed: 0,
            cycles_failed: 0,
        }
    }

    pub fn engine(&self) -> &TrackingEngine {
        &self.engine
    }

    /// A failed stage abandons the cycle; the next tick starts fresh
    fn skip(&mut self, stage: &str, error: &anyhow::Error) {
        self.cycles_failed += 1;
        warn!("Skipping cycle: {} stage failed: {:#}", stage, error);
        self.bus.publish_skipped(stage, &error.to_string());
        self.publish_diagnostics();
    }

    fn publish_diagnostics(&self) {
        let registry = self.engine.registry();
        let layout_id = self.engine.zone_table().layout_id().to_string();
        let completed = self.cycles_completed;
        let failed = self.cycles_failed;
        let alerts = self.engine.alerts_raised();
        let rejected = self.engine.alerts_rejected();
        let depth = self.dispatch_metrics.depth();

        self.diagnostics.send_modify(|d| {
            d.running = true;
            d.layout_id = Some(layout_id);
            d.tracked_objects = registry.len();
            d.last_evicted = registry.last_evicted().to_vec();
            d.cycles_completed = completed;
            d.cycles_failed = failed;
            d.alerts_raised = alerts;
            d.alerts_rejected = rejected;
            d.queue_depth = depth;
            d.last_cycle = Some(Utc::now());
        });
    }
}

#[async_trait]
impl CycleTask for FramePipeline {
    async fn run_cycle(&mut self) {
        let frame = match self.source.get_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                let stage = format!("frame ({})", self.source.name());
                self.skip(&stage, &e);
                return;
            }
        };

        let output = match self.detector.detect(&frame).await {
            Ok(output) => output,
            Err(e) => {
                let stage = format!("detect ({})", self.detector.name());
                self.skip(&stage, &e);
                return;
            }
        };

        let report = self.engine.update(&frame, output, Instant::now());
        self.cycles_completed += 1;
        self.publish_diagnostics();
        self.bus.publish_cycle(report);
    }
}
