//! Regular analysis grid construction
//!
//! Tiles an extent with square cells of a fixed size. Cells are numbered
//! left to right within a row and rows bottom to top, so cell 0 sits at the
//! lower-left corner of the extent. Cells in the last column/row are clipped
//! to the extent boundary when the extent is not an exact multiple of the
//! cell size, which keeps the grid congruent with the raster it came from.

use geo_types::{coord, Rect};
use tracing::info;

use urbanmatrix_core::{Algorithm, Cell, Error, Extent, Grid, Result};

/// Parameters for grid construction
#[derive(Debug, Clone)]
pub struct GridParams {
    /// Cell edge length in extent units (default 100.0)
    pub cell_size: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self { cell_size: 100.0 }
    }
}

/// Grid construction algorithm
#[derive(Debug, Clone, Default)]
pub struct GridBuilder;

impl Algorithm for GridBuilder {
    type Input = Extent;
    type Output = Grid;
    type Params = GridParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "GridBuilder"
    }

    fn description(&self) -> &'static str {
        "Tile an extent with a regular grid of square analysis cells"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        build_grid(&input, params)
    }
}

// Number of cells along one axis. The epsilon absorbs float error when the
// span is an exact multiple of the step, which would otherwise produce a
// sliver column/row.
fn span_steps(span: f64, step: f64) -> usize {
    ((span / step) - 1e-9).ceil().max(1.0) as usize
}

/// Build a regular grid of square cells over an extent.
///
/// Cell ids run left to right, then bottom to top: `id = row * cols + col`
/// with row 0 at the bottom. Boundary cells are clipped to the extent, so
/// their area can be smaller than `cell_size * cell_size`.
///
/// # Arguments
/// * `extent` - Analysis rectangle, usually taken from a raster layer
/// * `params` - Cell size
///
/// # Returns
/// Grid whose cells exactly tile the extent
pub fn build_grid(extent: &Extent, params: GridParams) -> Result<Grid> {
    if !params.cell_size.is_finite() || params.cell_size <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: params.cell_size.to_string(),
            reason: "must be a finite positive number".to_string(),
        });
    }
    if !extent.is_valid() {
        return Err(Error::InvalidParameter {
            name: "extent",
            value: extent.to_string(),
            reason: "min must be strictly below max on both axes".to_string(),
        });
    }

    let cell = params.cell_size;
    let cols = span_steps(extent.width(), cell);
    let rows = span_steps(extent.height(), cell);

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let min_y = extent.min_y() + row as f64 * cell;
        let max_y = (min_y + cell).min(extent.max_y());
        for col in 0..cols {
            let min_x = extent.min_x() + col as f64 * cell;
            let max_x = (min_x + cell).min(extent.max_x());

            let id = (row * cols + col) as u64;
            let geometry = Rect::new(
                coord! { x: min_x, y: min_y },
                coord! { x: max_x, y: max_y },
            )
            .to_polygon();
            cells.push(Cell::new(id, geometry));
        }
    }

    info!(
        "Grid: {} x {} cells of {} over {}",
        cols,
        rows,
        cell,
        extent
    );

    Grid::new(cells, extent.crs().clone(), cell, extent.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect, Centroid};
    use urbanmatrix_core::CRS;

    fn extent(max_x: f64, max_y: f64) -> Extent {
        Extent::new(0.0, 0.0, max_x, max_y, CRS::web_mercator())
    }

    #[test]
    fn test_exact_tiling() {
        let grid = build_grid(&extent(200.0, 200.0), GridParams { cell_size: 100.0 }).unwrap();

        assert_eq!(grid.len(), 4);
        for cell in grid.cells() {
            assert!((cell.area() - 10_000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cell_ordering_bottom_up() {
        let grid = build_grid(&extent(200.0, 200.0), GridParams { cell_size: 100.0 }).unwrap();

        // Cell 0 lower-left, cell 1 lower-right, cell 2 upper-left
        let c0 = grid.cell(0).unwrap().geometry().centroid().unwrap();
        let c1 = grid.cell(1).unwrap().geometry().centroid().unwrap();
        let c2 = grid.cell(2).unwrap().geometry().centroid().unwrap();

        assert_eq!((c0.x(), c0.y()), (50.0, 50.0));
        assert_eq!((c1.x(), c1.y()), (150.0, 50.0));
        assert_eq!((c2.x(), c2.y()), (50.0, 150.0));
    }

    #[test]
    fn test_boundary_cells_clipped() {
        let grid = build_grid(&extent(250.0, 150.0), GridParams { cell_size: 100.0 }).unwrap();

        // 3 cols x 2 rows; last column is 50 wide, top row 50 tall
        assert_eq!(grid.len(), 6);

        let last_col = grid.cell(2).unwrap().geometry().bounding_rect().unwrap();
        assert_eq!(last_col.max().x, 250.0);
        assert!((last_col.width() - 50.0).abs() < 1e-9);

        let top_right = grid.cell(5).unwrap();
        assert!((top_right.area() - 50.0 * 50.0).abs() < 1e-9);

        // Interior cell keeps the full size
        assert!((grid.cell(0).unwrap().area() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_sliver_on_float_accumulation() {
        // 0.1 + 0.1 + 0.1 lands slightly above 0.3, which must not
        // produce a fourth column of near-zero width
        let width = 0.1 + 0.1 + 0.1;
        let e = Extent::new(0.0, 0.0, width, 0.1, CRS::web_mercator());
        let grid = build_grid(&e, GridParams { cell_size: 0.1 }).unwrap();
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_extent_smaller_than_cell() {
        let grid = build_grid(&extent(40.0, 70.0), GridParams { cell_size: 100.0 }).unwrap();

        assert_eq!(grid.len(), 1);
        assert!((grid.cell(0).unwrap().area() - 40.0 * 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(build_grid(&extent(100.0, 100.0), GridParams { cell_size: 0.0 }).is_err());
        assert!(build_grid(&extent(100.0, 100.0), GridParams { cell_size: -5.0 }).is_err());
        assert!(build_grid(&extent(100.0, 100.0), GridParams { cell_size: f64::NAN }).is_err());
    }

    #[test]
    fn test_rejects_degenerate_extent() {
        let e = Extent::new(10.0, 0.0, 10.0, 100.0, CRS::web_mercator());
        let err = build_grid(&e, GridParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "extent", .. }));
    }

    #[test]
    fn test_algorithm_trait() {
        let grid = GridBuilder.execute_default(extent(200.0, 100.0)).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell_size(), 100.0);
    }
}
