// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Alerts module - alert events, the FIFO alert queue and its dispatcher

mod dispatcher;
mod sink;
mod journal;

pub use dispatcher::*;
pub use sink::*;
pub use journal::*;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::config::ManagerContact;
use crate::detection::Frame;
use crate::tracking::TrackedObject;
use crate::zones::ZoneId;

/// First zone assignment of a newly tracked object.
///
/// Everything in here is an owned snapshot, so the dispatch side never
/// needs to look at tracking state.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub id: Uuid,
    pub raised_at: DateTime<Utc>,
    pub zone_id: ZoneId,
    /// Manager of the zone at the time the alert was raised
    pub contact: Option<ManagerContact>,
    pub object: TrackedObject,
    pub frame: Frame,
    pub reason: String,
}

impl AlertEvent {
    pub fn new(
        zone_id: ZoneId,
        contact: Option<ManagerContact>,
        object: TrackedObject,
        frame: Frame,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            raised_at: Utc::now(),
            zone_id,
            contact,
            object,
            frame,
            reason: reason.into(),
        }
    }

    /// Notification text sent to the zone manager
    pub fn message(&self) -> String {
        let b = &self.object.bbox;
        format!(
            "{}: zone {}, track {} ({}) at [{:.0}, {:.0}, {:.0}, {:.0}]",
            self.reason,
            self.zone_id,
            self.object.id,
            self.object.class_label,
            b.x_min,
            b.y_min,
            b.x_max,
            b.y_max
        )
    }
}

/// Live counters shared between the producer handle and the consumer
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    enqueued: AtomicU64,
    depth: AtomicUsize,
    delivered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    undeliverable: AtomicU64,
    dropped: AtomicU64,
}

impl DispatchMetrics {
    /// Events waiting in the queue right now
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            queue_depth: self.depth(),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            undeliverable: self.undeliverable.load(Ordering::Relaxed),
            dropped_on_shutdown: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn record(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub queue_depth: usize,
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub undeliverable: u64,
    pub dropped_on_shutdown: u64,
}

/// Create the unbounded alert queue
pub fn alert_queue() -> (AlertQueue, AlertReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let metrics = Arc::new(DispatchMetrics::default());
    (
        AlertQueue {
            tx,
            metrics: metrics.clone(),
        },
        AlertReceiver { rx, metrics },
    )
}

/// Producer half of the alert queue. Pushing never blocks.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    tx: mpsc::UnboundedSender<AlertEvent>,
    metrics: Arc<DispatchMetrics>,
}

impl AlertQueue {
    /// Enqueue an alert. Returns `false` if the consumer is gone.
    pub fn push(&self, event: AlertEvent) -> bool {
        self.metrics.depth.fetch_add(1, Ordering::Relaxed);
        match self.tx.send(event) {
            Ok(()) => {
                self.metrics.record(&self.metrics.enqueued);
                true
            }
            Err(rejected) => {
                self.metrics.depth.fetch_sub(1, Ordering::Relaxed);
                warn!(
                    "Alert {} for zone {} dropped: dispatcher has stopped",
                    rejected.0.id, rejected.0.zone_id
                );
                false
            }
        }
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}

/// Consumer half of the alert queue
#[derive(Debug)]
pub struct AlertReceiver {
    rx: mpsc::UnboundedReceiver<AlertEvent>,
    metrics: Arc<DispatchMetrics>,
}

impl AlertReceiver {
    /// Wait for the next alert; `None` once every producer is dropped
    pub async fn recv(&mut self) -> Option<AlertEvent> {
        let event = self.rx.recv().await;
        if event.is_some() {
            self.metrics.depth.fetch_sub(1, Ordering::Relaxed);
        }
        event
    }

    pub fn try_recv(&mut self) -> Option<AlertEvent> {
        let event = self.rx.try_recv().ok();
        if event.is_some() {
            self.metrics.depth.fetch_sub(1, Ordering::Relaxed);
        }
        event
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::event;
    use super::*;

    #[tokio::test]
    async fn test_queue_is_fifo_and_tracks_depth() {
        let (queue, mut receiver) = alert_queue();

        for id in 1..=3 {
            assert!(queue.push(event(id, "1")));
        }
        assert_eq!(queue.metrics().depth(), 3);

        for id in 1..=3 {
            assert_eq!(receiver.recv().await.unwrap().object.id, id);
        }
        assert_eq!(receiver.metrics().depth(), 0);
        assert_eq!(receiver.metrics().snapshot().enqueued, 3);
    }

    #[tokio::test]
    async fn test_push_after_consumer_dropped() {
        let (queue, receiver) = alert_queue();
        drop(receiver);

        assert!(!queue.push(event(1, "1")));
        assert_eq!(queue.metrics().depth(), 0);
    }

    #[test]
    fn test_message_mentions_zone_and_track() {
        let msg = event(42, "north").message();
        assert!(msg.starts_with("Vehicle detected"));
        assert!(msg.contains("zone north"));
        assert!(msg.contains("track 42 (truck)"));
    }
}
