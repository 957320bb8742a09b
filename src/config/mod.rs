// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::zones::{grid_cells, grid_layout_name, Rect};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Run against the built-in scene simulator
    pub demo_mode: bool,

    /// Tracking configuration
    pub tracking: TrackingConfig,

    /// Alert dispatch configuration
    pub dispatch: DispatchConfig,

    /// Alert journal configuration
    pub journal: JournalConfig,

    /// Zone layouts keyed by layout id ("2x2", "3x3", ...)
    pub layouts: BTreeMap<String, LayoutConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut layouts = BTreeMap::new();
        let frame = Rect::new(0.0, 0.0, 1280.0, 720.0);
        if let Ok(grid) = LayoutConfig::grid(2, frame) {
            layouts.insert(grid_layout_name(2), grid);
        }

        Self {
            app_name: "ZoneWatch".to_string(),
            log_level: "info".to_string(),
            demo_mode: false,
            tracking: TrackingConfig::default(),
            dispatch: DispatchConfig::default(),
            journal: JournalConfig::default(),
            layouts,
        }
    }
}

impl Config {
    /// Load configuration from file. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("zonewatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Layout ids in sorted order
    pub fn layout_ids(&self) -> Vec<&str> {
        self.layouts.keys().map(String::as_str).collect()
    }

    /// Replace the geometry of an N x N grid layout, keeping any manager
    /// contacts already assigned to zones with the same id.
    pub fn apply_grid(&mut self, size: u32, region: Rect) -> Result<String> {
        let name = grid_layout_name(size);
        let mut grid = LayoutConfig::grid(size, region).map_err(|e| anyhow!(e))?;

        if let Some(existing) = self.layouts.get(&name) {
            for (id, zone) in grid.zones.iter_mut() {
                if let Some(old) = existing.zones.get(id) {
                    zone.manager = old.manager.clone();
                }
            }
        }

        self.layouts.insert(name.clone(), grid);
        Ok(name)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Frame cycle period in milliseconds
    pub cycle_interval_ms: u64,

    /// Drop a track after it has not been seen for this long
    pub eviction_timeout_ms: u64,

    /// Ignore detections below this confidence
    pub min_confidence: f32,

    /// Class labels to track; empty tracks everything
    pub classes: Vec<String>,

    /// Message attached to every alert
    pub alert_reason: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 100,
            eviction_timeout_ms: 5000,
            min_confidence: 0.6,
            classes: vec!["truck".to_string()],
            alert_reason: "Vehicle detected".to_string(),
        }
    }
}

impl TrackingConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn eviction_timeout(&self) -> Duration {
        Duration::from_millis(self.eviction_timeout_ms)
    }
}

/// Alert dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on a single notification delivery
    pub send_timeout_ms: u64,

    /// How long shutdown waits for queued alerts to drain
    pub shutdown_grace_ms: u64,

    /// LINE Notify endpoint
    pub line_api_url: String,

    /// Contact used for zones that have no manager of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_contact: Option<ManagerContact>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 10_000,
            shutdown_grace_ms: 5_000,
            line_api_url: "https://notify-api.line.me/api/notify".to_string(),
            default_contact: Some(ManagerContact {
                name: "operator".to_string(),
                contact_method: ContactMethod::Log,
                token: String::new(),
            }),
        }
    }
}

impl DispatchConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Alert journal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Append delivery outcomes to a JSON-lines file
    pub enabled: bool,

    /// Journal file path
    pub path: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("./log/alerts.jsonl"),
        }
    }
}

/// Zones of one layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub zones: BTreeMap<String, ZoneConfig>,
}

impl LayoutConfig {
    /// N x N grid over `region` with no contacts assigned
    pub fn grid(size: u32, region: Rect) -> Result<Self, ConfigError> {
        let zones = grid_cells(size, region)?
            .into_iter()
            .map(|(id, rect)| {
                (
                    id.to_string(),
                    ZoneConfig {
                        position: rect,
                        manager: None,
                    },
                )
            })
            .collect();
        Ok(Self { zones })
    }
}

/// A single zone entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// `[x_min, y_min, x_max, y_max]` in frame pixels
    pub position: Rect,

    /// Person responsible for this zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerContact>,
}

/// Zone manager contact details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerContact {
    pub name: String,
    pub contact_method: ContactMethod,
    /// Access token for the contact method, if it needs one
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    /// LINE Notify push message
    Line,
    /// Write the notification to the application log
    Log,
}
