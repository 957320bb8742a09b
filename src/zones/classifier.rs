// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Zone classifier - which zone does an object's center fall in

use std::sync::Arc;

use super::{Point, Rect, Zone, ZoneTable};

/// Maps object positions to zones of the active layout.
///
/// Zones are scanned in ascending id order and the first match wins, so
/// overlapping zones always resolve to the lowest id.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    table: Arc<ZoneTable>,
}

impl ZoneClassifier {
    pub fn new(table: Arc<ZoneTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ZoneTable {
        &self.table
    }

    /// Classify a bounding box by its center point
    pub fn classify(&self, bbox: &Rect) -> Option<&Zone> {
        self.classify_point(bbox.center())
    }

    pub fn classify_point(&self, point: Point) -> Option<&Zone> {
        self.table.zones().iter().find(|zone| zone.rect.contains(point))
    }
}
