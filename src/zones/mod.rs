// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Zone geometry - rectangles, zone identifiers and per-layout zone tables

mod classifier;
mod grid;

pub use classifier::*;
pub use grid::*;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, ManagerContact};
use crate::error::ConfigError;

/// A point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle `(x_min, y_min, x_max, y_max)` in frame pixels.
///
/// Serialized as a four element array so configuration files can write
/// `position = [0, 0, 640, 360]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Reference point used for zone classification
    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Closed-bounds containment: points on the edge are inside
    pub fn contains(&self, p: Point) -> bool {
        self.x_min <= p.x && p.x <= self.x_max && self.y_min <= p.y && p.y <= self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Finite coordinates with `min <= max` on both axes
    pub fn is_well_formed(&self) -> bool {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_min <= self.x_max
            && self.y_min <= self.y_max
    }
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x_min, r.y_min, r.x_max, r.y_max]
    }
}

/// Stable zone identifier, unique within a layout.
///
/// Ordering is natural: ids that parse as integers sort numerically
/// ("2" < "10") and before non-numeric ids, which sort lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ZoneId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ZoneId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named rectangular region of the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub rect: Rect,
    /// Who gets notified when an object first shows up here
    pub contact: Option<ManagerContact>,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
            contact: None,
        }
    }

    pub fn with_contact(mut self, contact: ManagerContact) -> Self {
        self.contact = Some(contact);
        self
    }
}

/// Immutable set of zones for one layout, kept in ascending zone-id order
#[derive(Debug, Clone)]
pub struct ZoneTable {
    layout_id: String,
    zones: Vec<Zone>,
}

impl ZoneTable {
    /// Validate and freeze a layout. Empty layouts, duplicate ids and
    /// malformed rectangles are rejected.
    pub fn new(layout_id: impl Into<String>, mut zones: Vec<Zone>) -> Result<Self, ConfigError> {
        let layout_id = layout_id.into();

        if zones.is_empty() {
            return Err(ConfigError::EmptyLayout(layout_id));
        }

        let mut seen = HashSet::with_capacity(zones.len());
        for zone in &zones {
            if !seen.insert(zone.id.clone()) {
                return Err(ConfigError::DuplicateZone {
                    layout: layout_id,
                    zone: zone.id.to_string(),
                });
            }
            if !zone.rect.is_well_formed() {
                return Err(ConfigError::MalformedZone {
                    layout: layout_id,
                    zone: zone.id.to_string(),
                    rect: zone.rect,
                });
            }
        }

        zones.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Zone table '{}' built with {} zones", layout_id, zones.len());

        Ok(Self { layout_id, zones })
    }

    /// Build the table for `layout_id` from the loaded configuration.
    /// Zones without a manager fall back to `dispatch.default_contact`.
    pub fn from_config(config: &Config, layout_id: &str) -> Result<Self, ConfigError> {
        let layout = config
            .layouts
            .get(layout_id)
            .ok_or_else(|| ConfigError::UnknownLayout(layout_id.to_string()))?;

        let zones = layout
            .zones
            .iter()
            .map(|(id, zone)| Zone {
                id: ZoneId::new(id.clone()),
                rect: zone.position,
                contact: zone
                    .manager
                    .clone()
                    .or_else(|| config.dispatch.default_contact.clone()),
            })
            .collect();

        Self::new(layout_id, zones)
    }

    /// Split `region` into a `size` x `size` grid of zones
    pub fn grid(layout_id: impl Into<String>, size: u32, region: Rect) -> Result<Self, ConfigError> {
        let zones = grid_cells(size, region)?
            .into_iter()
            .map(|(id, rect)| Zone::new(id, rect))
            .collect();
        Self::new(layout_id, zones)
    }

    pub fn layout_id(&self) -> &str {
        &self.layout_id
    }

    /// Zones in ascending id order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_id_natural_order() {
        let mut ids: Vec<ZoneId> = ["10", "2", "north", "1", "east"]
            .iter()
            .map(|s| ZoneId::from(*s))
            .collect();
        ids.sort();

        let sorted: Vec<&str> = ids.iter().map(|z| z.as_str()).collect();
        assert_eq!(sorted, vec!["1", "2", "10", "east", "north"]);
    }

    #[test]
    fn test_rect_closed_bounds() {
        let r = Rect::new(0.0, 0.0, 200.0, 200.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(200.0, 200.0)));
        assert!(!r.contains(Point::new(200.5, 100.0)));
        assert_eq!(r.center(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_table_sorted_by_id() {
        let table = ZoneTable::new(
            "test",
            vec![
                Zone::new("b", Rect::new(0.0, 0.0, 1.0, 1.0)),
                Zone::new("a", Rect::new(0.0, 0.0, 1.0, 1.0)),
            ],
        )
        .unwrap();

        assert_eq!(table.zones()[0].id.as_str(), "a");
        assert_eq!(table.layout_id(), "test");
        assert!(table.get(&ZoneId::from("b")).is_some());
    }

    #[test]
    fn test_table_rejects_bad_layouts() {
        assert_eq!(
            ZoneTable::new("empty", vec![]).unwrap_err(),
            ConfigError::EmptyLayout("empty".to_string())
        );

        let dup = ZoneTable::new(
            "dup",
            vec![
                Zone::new("1", Rect::new(0.0, 0.0, 1.0, 1.0)),
                Zone::new("1", Rect::new(2.0, 2.0, 3.0, 3.0)),
            ],
        );
        assert!(matches!(dup, Err(ConfigError::DuplicateZone { .. })));

        let inverted = ZoneTable::new("bad", vec![Zone::new("1", Rect::new(10.0, 0.0, 5.0, 1.0))]);
        assert!(matches!(inverted, Err(ConfigError::MalformedZone { .. })));
    }

    #[test]
    fn test_from_config_unknown_layout() {
        let config = Config::default();
        let err = ZoneTable::from_config(&config, "9x9").unwrap_err();
        assert_eq!(err, ConfigError::UnknownLayout("9x9".to_string()));
    }

    #[test]
    fn test_from_config_default_layout() {
        let config = Config::default();
        let table = ZoneTable::from_config(&config, "2x2").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.zones()[0].id.as_str(), "1");
        assert_eq!(table.zones()[0].contact.as_ref().unwrap().name, "operator");
    }

    #[test]
    fn test_from_config_prefers_zone_manager() {
        let mut config = Config::default();
        let manager = ManagerContact {
            name: "Dock B".to_string(),
            contact_method: crate::config::ContactMethod::Line,
            token: "abc".to_string(),
        };
        config.layouts.get_mut("2x2").unwrap().zones.get_mut("2").unwrap().manager = Some(manager.clone());
        config.dispatch.default_contact = None;

        let table = ZoneTable::from_config(&config, "2x2").unwrap();
        assert_eq!(table.get(&ZoneId::from("2")).unwrap().contact.as_ref(), Some(&manager));
        assert!(table.get(&ZoneId::from("1")).unwrap().contact.is_none());
    }

    #[test]
    fn test_rect_serializes_as_array() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");

        let back: Rect = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(back, r);
    }
}
