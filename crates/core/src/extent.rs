//! Analysis extent: an axis-aligned rectangle in a known reference system.

use geo_types::{coord, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crs::CRS;

/// An axis-aligned rectangle with an attached reference system.
///
/// Coordinates are in the units of the CRS (degrees for geographic,
/// metres for projected systems).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    crs: CRS,
}

impl Extent {
    /// Create an extent from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, crs: CRS) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Whether the rectangle is non-degenerate with finite corners
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point as (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if a point falls inside the extent (boundary inclusive)
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if two extents overlap.
    ///
    /// Coordinate comparison only; callers reconcile reference systems first.
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// The extent as a closed rectangular polygon
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
        .to_polygon()
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}) [{}]",
            self.min_x, self.min_y, self.max_x, self.max_y, self.crs
        )
    }
}
