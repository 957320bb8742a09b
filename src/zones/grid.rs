// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Grid layouts - split a screen region into N x N zones

use super::{Rect, ZoneId};
use crate::error::ConfigError;

/// Largest supported grid side
pub const MAX_GRID_SIZE: u32 = 32;

/// Conventional layout name for an N x N grid, e.g. "3x3"
pub fn grid_layout_name(size: u32) -> String {
    format!("{}x{}", size, size)
}

/// Cells of a `size` x `size` grid over `region`.
///
/// Cell corners are snapped down to whole pixels. Ids count down from
/// `size * size` at the top-left to `1` at the bottom-right, matching how
/// multi-view video walls label their panes.
pub fn grid_cells(size: u32, region: Rect) -> Result<Vec<(ZoneId, Rect)>, ConfigError> {
    if size == 0 || size > MAX_GRID_SIZE {
        return Err(ConfigError::InvalidGrid(size));
    }
    let count = size * size;

    let n = size as f64;
    let cell_w = region.width() / n;
    let cell_h = region.height() / n;
    let mut cells = Vec::with_capacity(count as usize);

    for row in 0..size {
        for col in 0..size {
            let x0 = (region.x_min + col as f64 * cell_w).floor();
            let y0 = (region.y_min + row as f64 * cell_h).floor();
            let x1 = (x0 + cell_w).floor();
            let y1 = (y0 + cell_h).floor();

            let id = count - (row * size + col);
            cells.push((ZoneId::new(id.to_string()), Rect::new(x0, y0, x1, y1)));
        }
    }

    Ok(cells)
}
