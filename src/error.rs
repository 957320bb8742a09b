// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Typed failures surfaced by the monitoring core

use thiserror::Error;

use crate::zones::Rect;

/// Zone configuration could not be turned into a usable zone table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("layout '{0}' is not defined in the configuration")]
    UnknownLayout(String),

    #[error("layout '{0}' defines no zones")]
    EmptyLayout(String),

    #[error("layout '{layout}' defines zone '{zone}' more than once")]
    DuplicateZone { layout: String, zone: String },

    #[error("layout '{layout}' zone '{zone}' has malformed bounds {rect:?}")]
    MalformedZone {
        layout: String,
        zone: String,
        rect: Rect,
    },

    #[error("grid size must be between 1 and {max}, got {0}", max = crate::zones::MAX_GRID_SIZE)]
    InvalidGrid(u32),
}

/// Errors returned synchronously by the monitor control surface
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("monitor is already running layout '{0}'")]
    AlreadyRunning(String),

    #[error("monitor is not running")]
    NotRunning,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
