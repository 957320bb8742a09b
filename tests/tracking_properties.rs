// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Property tests for zone assignment and track lifetimes
//!
//! Tests cover:
//! - At most one alert per object lifetime, however it moves
//! - Eviction boundary at exactly the timeout
//! - A new lifetime after eviction re-evaluates zones
//! - Overlap resolution picks the lowest zone id

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use zonewatch::alerts::alert_queue;
use zonewatch::config::TrackingConfig;
use zonewatch::detection::{DetectionFilter, DetectorOutput};
use zonewatch::zones::Point;
use zonewatch::{Frame, RawDetection, Rect, TrackRegistry, TrackingEngine, Zone, ZoneClassifier, ZoneId, ZoneTable};

fn overlapping_table() -> Arc<ZoneTable> {
    Arc::new(
        ZoneTable::new(
            "props",
            vec![
                Zone::new("3", Rect::new(400.0, 0.0, 640.0, 240.0)),
                Zone::new("1", Rect::new(0.0, 0.0, 300.0, 300.0)),
                Zone::new("2", Rect::new(200.0, 200.0, 500.0, 480.0)),
            ],
        )
        .unwrap(),
    )
}

fn engine(eviction_timeout_ms: u64) -> (TrackingEngine, zonewatch::alerts::AlertReceiver) {
    let config = TrackingConfig {
        eviction_timeout_ms,
        ..TrackingConfig::default()
    };
    let (queue, receiver) = alert_queue();
    let engine = TrackingEngine::new(overlapping_table(), &config, queue).with_filter(DetectionFilter::allow_all());
    (engine, receiver)
}

fn square(cx: f64, cy: f64) -> Rect {
    Rect::new(cx - 10.0, cy - 10.0, cx + 10.0, cy + 10.0)
}

fn detection(id: u64, cx: f64, cy: f64) -> RawDetection {
    RawDetection {
        track_id: Some(id),
        class_label: "truck".to_string(),
        bbox: square(cx, cy),
        confidence: 0.9,
    }
}

/// Lowest zone id containing the point, by brute force
fn expected_zone(table: &ZoneTable, p: Point) -> Option<ZoneId> {
    table
        .zones()
        .iter()
        .filter(|z| z.rect.contains(p))
        .map(|z| z.id.clone())
        .min()
}

/// Frames of detections keyed by track id, at most one box per id per frame
fn frames_strategy() -> impl Strategy<Value = Vec<BTreeMap<u64, (f64, f64)>>> {
    prop::collection::vec(
        prop::collection::btree_map(0u64..8, (0.0f64..640.0, 0.0f64..480.0), 0..6),
        1..40,
    )
}

proptest! {
    #[test]
    fn prop_at_most_one_alert_per_lifetime(frames in frames_strategy()) {
        // Long timeout: nothing is evicted, so every id has a single lifetime
        let (mut engine, mut receiver) = engine(3_600_000);
        let table = overlapping_table();
        let t0 = Instant::now();

        let mut first_seen: HashMap<u64, Point> = HashMap::new();
        for (i, dets) in frames.iter().enumerate() {
            let frame = Frame::blank(i as u64 + 1, 640, 480);
            let detections: Vec<RawDetection> = dets.iter().map(|(&id, &(x, y))| detection(id, x, y)).collect();
            for (&id, &(x, y)) in dets {
                first_seen.entry(id).or_insert(square(x, y).center());
            }
            engine.update(
                &frame,
                DetectorOutput { detections, annotated: frame.clone() },
                t0 + Duration::from_millis(100 * i as u64),
            );
        }

        let mut alerted: HashMap<u64, ZoneId> = HashMap::new();
        while let Some(alert) = receiver.try_recv() {
            prop_assert!(alerted.insert(alert.object.id, alert.zone_id).is_none());
        }

        for (id, p) in first_seen {
            prop_assert_eq!(alerted.get(&id).cloned(), expected_zone(&table, p));
        }
    }

    #[test]
    fn prop_eviction_boundary(gap_ms in 0u64..10_000, timeout_ms in 1u64..8_000) {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();
        registry.upsert(1, "truck", square(50.0, 50.0), t0);

        let evicted = registry.evict(t0 + Duration::from_millis(gap_ms), Duration::from_millis(timeout_ms));

        if gap_ms > timeout_ms {
            prop_assert_eq!(evicted, vec![1]);
            prop_assert!(!registry.contains(1));
        } else {
            prop_assert!(evicted.is_empty());
            prop_assert!(registry.contains(1));
        }
    }

    #[test]
    fn prop_reappearance_starts_new_lifetime(
        first in (0.0f64..640.0, 0.0f64..480.0),
        second in (0.0f64..640.0, 0.0f64..480.0),
        extra_ms in 1u64..5_000,
    ) {
        let (mut engine, mut receiver) = engine(5_000);
        let table = overlapping_table();
        let t0 = Instant::now();

        let frame = Frame::blank(1, 640, 480);
        engine.update(
            &frame,
            DetectorOutput { detections: vec![detection(9, first.0, first.1)], annotated: frame.clone() },
            t0,
        );

        let frame = Frame::blank(2, 640, 480);
        let report = engine.update(
            &frame,
            DetectorOutput { detections: vec![detection(9, second.0, second.1)], annotated: frame.clone() },
            t0 + Duration::from_millis(5_000 + extra_ms),
        );
        prop_assert_eq!(report.evicted, vec![9]);

        let zones: Vec<ZoneId> = std::iter::from_fn(|| receiver.try_recv()).map(|a| a.zone_id).collect();
        let expected: Vec<ZoneId> = [
            expected_zone(&table, square(first.0, first.1).center()),
            expected_zone(&table, square(second.0, second.1).center()),
        ]
        .into_iter()
        .flatten()
        .collect();
        prop_assert_eq!(zones, expected);
    }

    #[test]
    fn prop_classifier_picks_lowest_containing_zone(x in -50.0f64..700.0, y in -50.0f64..530.0) {
        let table = overlapping_table();
        let classifier = ZoneClassifier::new(table.clone());
        let p = Point::new(x, y);

        let first = classifier.classify_point(p).map(|z| z.id.clone());
        let second = classifier.classify_point(p).map(|z| z.id.clone());

        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(first, expected_zone(&table, p));
    }
}
