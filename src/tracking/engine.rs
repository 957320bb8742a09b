// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Tracking engine - one frame cycle from detections to alert events

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{TrackId, TrackRegistry};
use crate::alerts::{AlertEvent, AlertQueue};
use crate::config::TrackingConfig;
use crate::detection::{DetectionFilter, DetectorOutput, Frame};
use crate::zones::{ZoneClassifier, ZoneTable};

/// Outcome of one tracking cycle, for display and diagnostics
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub frame_sequence: u64,
    /// Alerts raised this cycle, already queued for dispatch
    pub alerts: Vec<AlertEvent>,
    pub annotated: Frame,
    pub evicted: Vec<TrackId>,
    pub new_tracks: usize,
    pub tracked: usize,
    /// Detections dropped by the filter
    pub ignored: usize,
}

/// Owns the track registry and runs the per-frame cycle.
///
/// Zones are only evaluated for tracks created in the current cycle, so an
/// object raises at most one alert for as long as it stays tracked.
pub struct TrackingEngine {
    registry: TrackRegistry,
    classifier: ZoneClassifier,
    filter: DetectionFilter,
    eviction_timeout: Duration,
    alert_reason: String,
    queue: AlertQueue,
    alerts_raised: u64,
    /// Alerts the queue refused because the dispatcher had stopped
    alerts_rejected: u64,
}

impl TrackingEngine {
    pub fn new(table: Arc<ZoneTable>, config: &TrackingConfig, queue: AlertQueue) -> Self {
        Self {
            registry: TrackRegistry::new(),
            classifier: ZoneClassifier::new(table),
            filter: DetectionFilter::from_config(config),
            eviction_timeout: config.eviction_timeout(),
            alert_reason: config.alert_reason.clone(),
            queue,
            alerts_raised: 0,
            alerts_rejected: 0,
        }
    }

    pub fn with_filter(mut self, filter: DetectionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run one cycle: evict, upsert, classify new tracks, raise alerts.
    ///
    /// `frame` is the raw frame the detections came from; alerts carry a
    /// snapshot of it.
    pub fn update(&mut self, frame: &Frame, output: DetectorOutput, now: Instant) -> CycleReport {
        let evicted = self.registry.evict(now, self.eviction_timeout);

        let mut created = Vec::new();
        let mut ignored = 0;
        for det in output.detections {
            if !self.filter.accepts(&det) {
                ignored += 1;
                continue;
            }
            let Some(id) = det.track_id else { continue };
            if self.registry.upsert(id, &det.class_label, det.bbox, now).is_new() {
                created.push(id);
            }
        }

        let mut alerts = Vec::new();
        for &id in &created {
            let Some(bbox) = self.registry.get(id).map(|o| o.bbox) else {
                continue;
            };
            let Some(zone) = self.classifier.classify(&bbox) else {
                debug!("Track {} is outside every zone", id);
                continue;
            };
            if !self.registry.mark_zone(id, &zone.id) {
                continue;
            }
            let Some(snapshot) = self.registry.snapshot(id) else {
                continue;
            };

            let event = AlertEvent::new(
                zone.id.clone(),
                zone.contact.clone(),
                snapshot,
                frame.clone(),
                self.alert_reason.as_str(),
            );
            info!(
                "Track {} ({}) entered zone {} at frame {}",
                id, event.object.class_label, event.zone_id, frame.sequence
            );

            if self.queue.push(event.clone()) {
                self.alerts_raised += 1;
            } else {
                self.alerts_rejected += 1;
            }
            alerts.push(event);
        }

        CycleReport {
            frame_sequence: frame.sequence,
            alerts,
            annotated: output.annotated,
            evicted,
            new_tracks: created.len(),
            tracked: self.registry.len(),
            ignored,
        }
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn zone_table(&self) -> &ZoneTable {
        self.classifier.table()
    }

    /// Alerts accepted by the dispatch queue
    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised
    }

    pub fn alerts_rejected(&self) -> u64 {
        self.alerts_rejected
    }
}
