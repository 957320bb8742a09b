// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Core engine module - runs the frame context and the dispatch context

mod engine;
mod event_bus;
mod pipeline;
mod scheduler;

pub use engine::{Monitor, SessionSummary};
pub use event_bus::{Event, EventBus, EventPayload, EventType};
pub use pipeline::FramePipeline;
pub use scheduler::{CycleTask, FrameScheduler, SchedulerStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracking::TrackId;

/// Live view of a monitoring session, published after every cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub running: bool,
    pub layout_id: Option<String>,
    pub tracked_objects: usize,
    /// Track ids removed by the most recent eviction that removed any
    pub last_evicted: Vec<TrackId>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub alerts_raised: u64,
    /// Alerts refused because the dispatcher had already stopped
    pub alerts_rejected: u64,
    pub queue_depth: usize,
    pub last_cycle: Option<DateTime<Utc>>,
}
