//! Grid shape and the background placement math that slices one image across
//! every cell so the grid reads as a single picture.

use std::fmt;

use serde::Deserialize;

use crate::events::VerticalAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GridShape {
    pub rows: usize,
    pub columns: usize,
}

impl Default for GridShape {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl GridShape {
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    pub const fn cells(&self) -> usize {
        self.rows * self.columns
    }

    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Row-major `(row, column)` of a cell index.
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        let columns = self.columns.max(1);
        (index / columns, index % columns)
    }
}

/// A CSS length of the form `calc(<percent>% + <px>px)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub percent: f32,
    pub px: f32,
}

impl Offset {
    pub const fn percent(percent: f32) -> Self {
        Self { percent, px: 0.0 }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.px == 0.0 {
            write!(f, "{}%", self.percent)
        } else if self.px < 0.0 {
            write!(f, "calc({}% - {}px)", self.percent, -self.px)
        } else {
            write!(f, "calc({}% + {}px)", self.percent, self.px)
        }
    }
}

/// Background position of one cell for the image it currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPlacement {
    pub x: Offset,
    pub y: Offset,
}

impl fmt::Display for CellPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Size of every cell and of the background image painted into it. Fixed for
/// the lifetime of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLayout {
    pub width_percent: f32,
    pub row_height_percent: f32,
    pub background_size_percent: f32,
}

pub fn cell_layout(shape: GridShape) -> CellLayout {
    let rows = shape.rows.max(1) as f32;
    let columns = shape.columns.max(1) as f32;
    CellLayout {
        width_percent: 100.0 / columns,
        row_height_percent: 100.0 / rows,
        background_size_percent: columns * 100.0,
    }
}

/// Pixel height of one row inside a container of the given height.
pub fn item_height(container_height: f32, shape: GridShape) -> f32 {
    container_height / shape.rows.max(1) as f32
}

/// Background position that makes cell `index` show its own slice of an image
/// pinned to `anchor`.
pub fn placement(
    shape: GridShape,
    index: usize,
    anchor: VerticalAnchor,
    item_height: f32,
) -> CellPlacement {
    let (row, column) = shape.coordinates(index);
    let x = if shape.columns > 1 {
        Offset::percent(column as f32 / (shape.columns - 1) as f32 * 100.0)
    } else {
        Offset::percent(0.0)
    };

    let rows = shape.rows as f32;
    let row = row as f32;
    let y = match anchor {
        VerticalAnchor::Top => Offset {
            percent: 0.0,
            px: -(row * item_height),
        },
        VerticalAnchor::Center => Offset {
            percent: 50.0,
            px: -((row - (rows - 1.0) / 2.0) * item_height),
        },
        VerticalAnchor::Bottom => Offset {
            percent: 100.0,
            px: (rows - row - 1.0) * item_height,
        },
    };

    CellPlacement { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_renders_as_css() {
        assert_eq!(Offset::percent(50.0).to_string(), "50%");
        let up = Offset {
            percent: 50.0,
            px: -30.0,
        };
        assert_eq!(up.to_string(), "calc(50% - 30px)");
        let down = Offset {
            percent: 100.0,
            px: 12.5,
        };
        assert_eq!(down.to_string(), "calc(100% + 12.5px)");
    }

    #[test]
    fn coordinates_are_row_major() {
        let shape = GridShape::new(2, 3);
        assert_eq!(shape.coordinates(0), (0, 0));
        assert_eq!(shape.coordinates(2), (0, 2));
        assert_eq!(shape.coordinates(4), (1, 1));
    }
}
