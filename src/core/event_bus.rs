// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Event bus for inter-component communication

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::tracking::{CycleReport, TrackId};
use crate::zones::ZoneId;

/// Event types in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Alert,
    Eviction,
    CycleSkipped,
    SystemStatus,
}

/// Generic event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Alert {
        alert_id: Uuid,
        zone_id: ZoneId,
        track_id: TrackId,
        class_label: String,
    },
    Evicted { track_ids: Vec<TrackId> },
    CycleSkipped { stage: String, error: String },
    Status { key: String, value: String },
}

/// Fan-out of cycle results to whoever is watching (console, tests).
///
/// Publishing never blocks; slow subscribers lag and lose old messages.
pub struct EventBus {
    cycle_tx: broadcast::Sender<Arc<CycleReport>>,
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (cycle_tx, _) = broadcast::channel(capacity);
        let (event_tx, _) = broadcast::channel(capacity);

        Self {
            cycle_tx,
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    /// Publish a finished cycle plus one event per alert and eviction batch
    pub fn publish_cycle(&self, report: CycleReport) {
        for alert in &report.alerts {
            self.publish_event(
                EventType::Alert,
                EventPayload::Alert {
                    alert_id: alert.id,
                    zone_id: alert.zone_id.clone(),
                    track_id: alert.object.id,
                    class_label: alert.object.class_label.clone(),
                },
            );
        }
        if !report.evicted.is_empty() {
            self.publish_event(
                EventType::Eviction,
                EventPayload::Evicted {
                    track_ids: report.evicted.clone(),
                },
            );
        }
        let _ = self.cycle_tx.send(Arc::new(report));
    }

    pub fn publish_skipped(&self, stage: &str, error: &str) {
        self.publish_event(
            EventType::CycleSkipped,
            EventPayload::CycleSkipped {
                stage: stage.to_string(),
                error: error.to_string(),
            },
        );
    }

    pub fn publish_status(&self, key: &str, value: &str) {
        self.publish_event(
            EventType::SystemStatus,
            EventPayload::Status {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    fn publish_event(&self, event_type: EventType, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            event_type,
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_cycles(&self) -> broadcast::Receiver<Arc<CycleReport>> {
        self.cycle_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
