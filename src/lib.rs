// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! ZoneWatch - zone-based vehicle monitoring with manager alerts
//!
//! Objects reported by an upstream detector/tracker are assigned to the
//! first configured zone they appear in, and that zone's manager is
//! notified once per object lifetime:
//! - Rectangular zones per layout, with N x N grid generation
//! - Per-object tracking with timeout-based eviction
//! - FIFO alert queue drained by a single dispatcher
//! - LINE Notify and log notification sinks, with an optional JSONL journal
//! - Built-in scene simulator for demos and tests
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Monitor                               │
//! ├───────────────────────────────────────────────────────────────┤
//! │   frame task (every cycle_interval)                           │
//! │  ┌────────────┐  ┌──────────┐  ┌────────────────┐             │
//! │  │ FrameSource│→ │ Detector │→ │ TrackingEngine │──┐          │
//! │  └────────────┘  └──────────┘  └────────────────┘  │          │
//! │        ↓ CycleReport / Diagnostics                  │ AlertQueue│
//! │  ┌─────────────────────────────┐                    ↓          │
//! │  │          Event Bus          │   dispatch task               │
//! │  └─────────────────────────────┘  ┌─────────────────┐         │
//! │                                   │ AlertDispatcher │→ Sinks  │
//! │                                   └─────────────────┘         │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod alerts;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod tracking;
pub mod zones;

// Re-exports for convenience
pub use alerts::{AlertDispatcher, AlertEvent, ContactRouter, NotificationSink};
pub use config::Config;
pub use crate::core::{Diagnostics, EventBus, Monitor};
pub use detection::{Detector, Frame, FrameSource, RawDetection};
pub use error::{ConfigError, MonitorError};
pub use tracking::{TrackRegistry, TrackedObject, TrackingEngine};
pub use zones::{Rect, Zone, ZoneClassifier, ZoneId, ZoneTable};

/// ZoneWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ZoneWatch name
pub const NAME: &str = "ZoneWatch";
