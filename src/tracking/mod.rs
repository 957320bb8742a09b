// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Tracking module - object registry and the per-frame tracking cycle

mod registry;
mod engine;

pub use registry::*;
pub use engine::*;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::zones::{Rect, ZoneId};

/// Track identifier assigned by the upstream detector
pub type TrackId = u64;

/// Lifecycle of a tracked object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    /// Tracked, not in any zone at creation time
    Unassigned,
    /// Tracked and attributed to a zone
    Assigned,
}

/// An object currently held by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub id: TrackId,
    pub class_label: String,
    pub bbox: Rect,
    pub first_seen: Instant,
    pub last_seen: Instant,
    /// Set at most once per lifetime
    pub assigned_zone: Option<ZoneId>,
}

impl TrackedObject {
    pub fn new(id: TrackId, class_label: impl Into<String>, bbox: Rect, now: Instant) -> Self {
        Self {
            id,
            class_label: class_label.into(),
            bbox,
            first_seen: now,
            last_seen: now,
            assigned_zone: None,
        }
    }

    pub fn state(&self) -> TrackState {
        match self.assigned_zone {
            Some(_) => TrackState::Assigned,
            None => TrackState::Unassigned,
        }
    }
}
