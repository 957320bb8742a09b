// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Track registry - owns every live tracked object

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{TrackId, TrackedObject};
use crate::zones::{Rect, ZoneId};

/// Result of feeding one observation into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

impl Upsert {
    pub fn is_new(self) -> bool {
        matches!(self, Upsert::Created)
    }
}

/// Single-writer store of tracked objects keyed by upstream track id
#[derive(Debug, Default)]
pub struct TrackRegistry {
    objects: HashMap<TrackId, TrackedObject>,
    last_evicted: Vec<TrackId>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh the object for `id`.
    ///
    /// Boxes are stored as given; degenerate boxes are not rejected.
    /// `last_seen` only ever moves forward.
    pub fn upsert(&mut self, id: TrackId, class_label: &str, bbox: Rect, now: Instant) -> Upsert {
        match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.bbox = bbox;
                obj.last_seen = obj.last_seen.max(now);
                Upsert::Updated
            }
            None => {
                self.objects.insert(id, TrackedObject::new(id, class_label, bbox, now));
                Upsert::Created
            }
        }
    }

    /// Remove every object unseen for longer than `timeout`.
    ///
    /// Returns the evicted ids in ascending order.
    pub fn evict(&mut self, now: Instant, timeout: Duration) -> Vec<TrackId> {
        let mut evicted: Vec<TrackId> = self
            .objects
            .values()
            .filter(|obj| now.saturating_duration_since(obj.last_seen) > timeout)
            .map(|obj| obj.id)
            .collect();
        evicted.sort_unstable();

        for id in &evicted {
            self.objects.remove(id);
        }

        if !evicted.is_empty() {
            debug!("Evicted {} tracks: {:?}", evicted.len(), evicted);
            self.last_evicted = evicted.clone();
        }

        evicted
    }

    /// Assign a zone if the object has none yet. Returns whether the
    /// assignment happened; unknown ids are ignored.
    pub fn mark_zone(&mut self, id: TrackId, zone: &ZoneId) -> bool {
        match self.objects.get_mut(&id) {
            Some(obj) if obj.assigned_zone.is_none() => {
                obj.assigned_zone = Some(zone.clone());
                true
            }
            _ => false,
        }
    }

    /// Owned copy of the object, detached from later updates
    pub fn snapshot(&self, id: TrackId) -> Option<TrackedObject> {
        self.objects.get(&id).cloned()
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Ids removed by the most recent eviction that removed anything
    pub fn last_evicted(&self) -> &[TrackId] {
        &self.last_evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> Rect {
        Rect::new(100.0, 100.0, 140.0, 140.0)
    }

    #[test]
    fn test_upsert_create_then_update() {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();

        assert!(registry.upsert(42, "truck", bbox(), t0).is_new());
        assert_eq!(registry.len(), 1);

        let moved = Rect::new(150.0, 100.0, 190.0, 140.0);
        let t1 = t0 + Duration::from_millis(100);
        assert_eq!(registry.upsert(42, "truck", moved, t1), Upsert::Updated);

        let obj = registry.get(42).unwrap();
        assert_eq!(obj.bbox, moved);
        assert_eq!(obj.last_seen, t1);
        assert_eq!(obj.first_seen, t0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_seen_never_decreases() {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);

        registry.upsert(1, "car", bbox(), t1);
        registry.upsert(1, "car", bbox(), t0);

        assert_eq!(registry.get(1).unwrap().last_seen, t1);
    }

    #[test]
    fn test_degenerate_box_accepted() {
        let mut registry = TrackRegistry::new();
        let flat = Rect::new(10.0, 10.0, 10.0, 10.0);

        assert!(registry.upsert(5, "bus", flat, Instant::now()).is_new());
        assert_eq!(registry.get(5).unwrap().bbox, flat);
    }

    #[test]
    fn test_evict_removes_only_stale() {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();
        let timeout = Duration::from_secs(5);

        registry.upsert(1, "truck", bbox(), t0);
        registry.upsert(2, "truck", bbox(), t0 + Duration::from_secs(3));

        // Exactly at the timeout is not yet stale
        assert!(registry.evict(t0 + timeout, timeout).is_empty());
        assert!(registry.contains(1));

        let evicted = registry.evict(t0 + Duration::from_secs(6), timeout);
        assert_eq!(evicted, vec![1]);
        assert!(!registry.contains(1));
        assert!(registry.contains(2));
        assert_eq!(registry.last_evicted(), &[1]);
    }

    #[test]
    fn test_mark_zone_only_once() {
        let mut registry = TrackRegistry::new();
        registry.upsert(42, "truck", bbox(), Instant::now());

        assert!(registry.mark_zone(42, &ZoneId::from("north")));
        assert!(!registry.mark_zone(42, &ZoneId::from("south")));
        assert_eq!(
            registry.get(42).unwrap().assigned_zone,
            Some(ZoneId::from("north"))
        );
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut registry = TrackRegistry::new();
        assert!(!registry.mark_zone(99, &ZoneId::from("north")));
        assert!(registry.snapshot(99).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();
        registry.upsert(7, "car", bbox(), t0);

        let snap = registry.snapshot(7).unwrap();
        registry.upsert(7, "car", Rect::new(0.0, 0.0, 1.0, 1.0), t0 + Duration::from_secs(1));
        registry.mark_zone(7, &ZoneId::from("1"));

        assert_eq!(snap.bbox, bbox());
        assert!(snap.assigned_zone.is_none());
    }

    #[test]
    fn test_reappearance_after_eviction_is_new() {
        let mut registry = TrackRegistry::new();
        let t0 = Instant::now();
        let timeout = Duration::from_secs(5);

        registry.upsert(7, "truck", bbox(), t0);
        registry.mark_zone(7, &ZoneId::from("1"));

        let t6 = t0 + Duration::from_secs(6);
        assert_eq!(registry.evict(t6, timeout), vec![7]);
        assert!(registry.upsert(7, "truck", bbox(), t6).is_new());
        assert!(registry.get(7).unwrap().assigned_zone.is_none());
    }
}
