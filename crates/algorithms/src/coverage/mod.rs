//! Per-cell built coverage from building footprints
//!
//! For every grid cell, sums the intersection area with each footprint and
//! expresses it as a percentage of the cell area. Footprint areas are summed
//! independently, not unioned first, so overlapping buildings push a cell
//! past 100%. Values above 100 are preserved as-is.
//!
//! The overlay runs in-process on `geo` boolean ops with an `rstar` R-tree
//! pruning candidates per cell. Cells are processed in parallel; attribute
//! write-back happens afterwards on one thread.

mod index;

use geo::{Area, BooleanOps, BoundingRect};
use geo_types::MultiPolygon;
use rayon::prelude::*;
use rstar::{Envelope, RTree, RTreeObject, AABB};
use tracing::{info, warn};

use urbanmatrix_core::{
    Algorithm, AttributeValue, Error, FeatureCollection, Grid, Result, COVERAGE_FIELD,
};

use index::{finite_envelope, prepare};

/// What to do when a feature's geometry cannot be intersected safely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidGeometryPolicy {
    /// Fail the whole call, naming the offending feature
    #[default]
    Fail,
    /// Skip the feature and leave every cell its envelope touches without a
    /// coverage value, to surface as no-data downstream
    MarkUnresolved,
}

/// Parameters for coverage aggregation
#[derive(Debug, Clone)]
pub struct CoverageParams {
    /// Cell attribute receiving the percentage (default `coverage_pct`)
    pub output_field: String,
    /// Invalid geometry handling
    pub on_invalid: InvalidGeometryPolicy,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            output_field: COVERAGE_FIELD.to_string(),
            on_invalid: InvalidGeometryPolicy::default(),
        }
    }
}

/// What the aggregation did, cell by cell and feature by feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageSummary {
    /// Cells that received a coverage value
    pub resolved_cells: usize,
    /// Cells left without a value because a skipped feature may touch them
    pub unresolved_cells: Vec<u64>,
    /// Feature indices skipped under [`InvalidGeometryPolicy::MarkUnresolved`]
    pub skipped_features: Vec<usize>,
    /// Features with no polygonal area (points, lines, empty geometry)
    pub zero_area_features: usize,
}

/// Coverage aggregation algorithm
#[derive(Debug, Clone, Default)]
pub struct CoverageAggregator;

impl Algorithm for CoverageAggregator {
    type Input = (Grid, FeatureCollection);
    type Output = (Grid, CoverageSummary);
    type Params = CoverageParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CoverageAggregator"
    }

    fn description(&self) -> &'static str {
        "Compute per-cell built coverage percentage from building footprints"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (mut grid, features) = input;
        let summary = compute_coverage(&mut grid, &features, params)?;
        Ok((grid, summary))
    }
}

/// Compute per-cell coverage percentages and write them onto the grid.
///
/// `coverage_pct = 100 * Σ area(cell ∩ footprint) / cell_area`, summed over
/// every footprint separately. A cell nothing touches gets `0.0`, not a
/// missing value.
///
/// # Arguments
/// * `grid` - Analysis grid; receives `params.output_field` on each cell
/// * `features` - Building footprints in the same reference system as the grid
/// * `params` - Output field and invalid geometry policy
///
/// # Returns
/// Summary of resolved/unresolved cells and skipped features
pub fn compute_coverage(
    grid: &mut Grid,
    features: &FeatureCollection,
    params: CoverageParams,
) -> Result<CoverageSummary> {
    if !features.crs().is_equivalent(grid.crs()) {
        return Err(Error::CrsMismatch(
            grid.crs().identifier(),
            features.crs().identifier(),
        ));
    }

    let mut footprints = Vec::new();
    let mut poisoned: Vec<AABB<[f64; 2]>> = Vec::new();
    let mut skipped_features = Vec::new();
    let mut zero_area_features = 0usize;

    for (index, feature) in features.iter().enumerate() {
        match prepare(index, feature.geometry.as_ref()) {
            Ok(Some(footprint)) => footprints.push(footprint),
            Ok(None) => zero_area_features += 1,
            Err(reason) => match params.on_invalid {
                InvalidGeometryPolicy::Fail => return Err(Error::Geometry { index, reason }),
                InvalidGeometryPolicy::MarkUnresolved => {
                    warn!("Skipping feature {}: {}", index, reason);
                    if let Some(envelope) = feature.geometry.as_ref().and_then(finite_envelope) {
                        poisoned.push(envelope);
                    }
                    skipped_features.push(index);
                }
            },
        }
    }

    info!(
        "Coverage: {} footprints against {} cells ({} zero-area, {} skipped)",
        footprints.len(),
        grid.len(),
        zero_area_features,
        skipped_features.len()
    );

    let tree = RTree::bulk_load(footprints);

    // Cells are axis-aligned rectangles, so the bounding box is the cell.
    let mut cell_envelopes = Vec::with_capacity(grid.len());
    for cell in grid.cells() {
        let rect = cell.geometry().bounding_rect().ok_or_else(|| Error::Geometry {
            index: cell.id() as usize,
            reason: "cell has no extent".to_string(),
        })?;
        cell_envelopes.push(AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        ));
    }

    let coverage: Vec<Option<f64>> = grid
        .cells()
        .par_iter()
        .zip(cell_envelopes.par_iter())
        .map(|(cell, cell_env)| {
            if poisoned.iter().any(|e| e.intersects(cell_env)) {
                return None;
            }

            let cell_polygons = MultiPolygon::new(vec![cell.geometry().clone()]);
            let mut covered = 0.0;
            for footprint in tree.locate_in_envelope_intersecting(cell_env) {
                covered += if cell_env.contains_envelope(&footprint.envelope()) {
                    // Entirely inside a rectangular cell: skip the boolean op
                    footprint.area
                } else {
                    cell_polygons
                        .intersection(&footprint.polygons)
                        .unsigned_area()
                };
            }
            Some(100.0 * covered / cell.area())
        })
        .collect();

    let mut summary = CoverageSummary {
        skipped_features,
        zero_area_features,
        ..Default::default()
    };
    for (cell, value) in grid.cells_mut().iter_mut().zip(coverage) {
        match value {
            Some(pct) => {
                cell.set_attribute(params.output_field.clone(), AttributeValue::Float(pct));
                summary.resolved_cells += 1;
            }
            None => {
                cell.remove_attribute(&params.output_field);
                summary.unresolved_cells.push(cell.id());
            }
        }
    }

    info!(
        "Coverage: {} cells resolved, {} unresolved",
        summary.resolved_cells,
        summary.unresolved_cells.len()
    );

    Ok(summary)
}
