//! Analysis grid: cells, density classes, attribute field names.

use std::collections::HashMap;
use std::fmt;

use geo::Area;
use geo_types::Polygon;
use serde::{Deserialize, Serialize};

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::vector::AttributeValue;

/// Attribute field written by the coverage aggregator
pub const COVERAGE_FIELD: &str = "coverage_pct";
/// Attribute field written by the classifier
pub const CLASS_FIELD: &str = "density_class";

/// Ordinal density classes produced by the threshold classifier.
///
/// `NoData` marks cells whose coverage is missing or unparseable; the four
/// remaining classes are ordered from lowest to highest coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DensityClass {
    NoData,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl DensityClass {
    /// All classes in ascending order, useful for legends.
    pub const ALL: &[DensityClass] = &[
        Self::NoData,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::VeryHigh,
    ];

    /// Label written into the grid attribute table
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoData => "NoData",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "VeryHigh",
        }
    }

    /// Parse a label back into a class
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "NoData" => Some(Self::NoData),
            "Low" => Some(Self::Low),
            "Moderate" => Some(Self::Moderate),
            "High" => Some(Self::High),
            "VeryHigh" => Some(Self::VeryHigh),
            _ => None,
        }
    }
}

impl fmt::Display for DensityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single grid cell: a rectangle with a stable id and an attribute bag.
///
/// Geometry and id are fixed at construction; pipeline stages only add
/// attributes. The area is computed once and cached.
#[derive(Debug, Clone)]
pub struct Cell {
    id: u64,
    geometry: Polygon<f64>,
    area: f64,
    attributes: HashMap<String, AttributeValue>,
}

impl Cell {
    /// Create a cell from its rectangle geometry
    pub fn new(id: u64, geometry: Polygon<f64>) -> Self {
        let area = geometry.unsigned_area();
        Self {
            id,
            geometry,
            area,
            attributes: HashMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn geometry(&self) -> &Polygon<f64> {
        &self.geometry
    }

    /// Cached polygon area
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Remove an attribute, returning the previous value
    pub fn remove_attribute(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    /// All attributes on this cell
    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }
}

/// A regular analysis grid.
///
/// Cells are stored in generation order and `cells[i].id() == i`; the
/// constructor enforces both. Stages downstream of the builder mutate
/// cells only through their attribute bags.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    crs: CRS,
    cell_size: f64,
    extent: Extent,
}

impl Grid {
    /// Assemble a grid from generated cells.
    ///
    /// Fails when a cell id does not match its position or a cell has
    /// non-positive area.
    pub fn new(cells: Vec<Cell>, crs: CRS, cell_size: f64, extent: Extent) -> Result<Self> {
        for (i, cell) in cells.iter().enumerate() {
            if cell.id() != i as u64 {
                return Err(Error::Other(format!(
                    "cell id {} found at position {}",
                    cell.id(),
                    i
                )));
            }
            if !(cell.area() > 0.0) {
                return Err(Error::Geometry {
                    index: i,
                    reason: "cell has non-positive area".to_string(),
                });
            }
        }
        Ok(Self {
            cells,
            crs,
            cell_size,
            extent,
        })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Look up a cell by id
    pub fn cell(&self, id: u64) -> Option<&Cell> {
        self.cells.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Nominal cell edge length; edge cells may be smaller
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The extent the grid was generated from
    pub fn extent(&self) -> &Extent {
        &self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, Rect};

    fn rect_cell(id: u64, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Cell {
        Cell::new(
            id,
            Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y }).to_polygon(),
        )
    }

    fn extent() -> Extent {
        Extent::new(0.0, 0.0, 20.0, 10.0, CRS::web_mercator())
    }

    #[test]
    fn test_class_labels_round_trip() {
        for class in DensityClass::ALL {
            assert_eq!(DensityClass::from_label(class.label()), Some(*class));
        }
        assert_eq!(DensityClass::from_label("Unknown"), None);
    }

    #[test]
    fn test_class_ordering() {
        assert!(DensityClass::Low < DensityClass::Moderate);
        assert!(DensityClass::High < DensityClass::VeryHigh);
        assert!(DensityClass::NoData < DensityClass::Low);
    }

    #[test]
    fn test_cell_area_cached() {
        let cell = rect_cell(0, 0.0, 0.0, 10.0, 10.0);
        assert_eq!(cell.area(), 100.0);
        assert_eq!(cell.id(), 0);
    }

    #[test]
    fn test_cell_attributes() {
        let mut cell = rect_cell(0, 0.0, 0.0, 10.0, 10.0);
        cell.set_attribute(COVERAGE_FIELD, AttributeValue::Float(42.0));
        assert_eq!(
            cell.attribute(COVERAGE_FIELD),
            Some(&AttributeValue::Float(42.0))
        );
        assert_eq!(
            cell.remove_attribute(COVERAGE_FIELD),
            Some(AttributeValue::Float(42.0))
        );
        assert_eq!(cell.attribute(COVERAGE_FIELD), None);
    }

    #[test]
    fn test_grid_accepts_ordered_cells() {
        let cells = vec![
            rect_cell(0, 0.0, 0.0, 10.0, 10.0),
            rect_cell(1, 10.0, 0.0, 20.0, 10.0),
        ];
        let grid = Grid::new(cells, CRS::web_mercator(), 10.0, extent()).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(1).unwrap().id(), 1);
        assert!(grid.cell(2).is_none());
    }

    #[test]
    fn test_grid_rejects_misordered_ids() {
        let cells = vec![rect_cell(1, 0.0, 0.0, 10.0, 10.0)];
        assert!(Grid::new(cells, CRS::web_mercator(), 10.0, extent()).is_err());
    }

    #[test]
    fn test_grid_rejects_degenerate_cell() {
        let cells = vec![rect_cell(0, 0.0, 0.0, 0.0, 10.0)];
        assert!(Grid::new(cells, CRS::web_mercator(), 10.0, extent()).is_err());
    }
}
