//! Grid, coverage and classification chained end to end
//!
//! Stages run to completion in order; the grid built by the first stage is
//! the only state carried forward. Footprints arriving in a different
//! reference system than the extent are reprojected before the overlay.

use tracing::info;

use urbanmatrix_core::crs::transform::transform_features;
use urbanmatrix_core::{Extent, FeatureCollection, Grid, Result};

use crate::classify::{classify, ClassifyParams, ClassifySummary};
use crate::coverage::{compute_coverage, CoverageParams, CoverageSummary};
use crate::grid::{build_grid, GridParams};

/// Parameters for the full pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineParams {
    pub grid: GridParams,
    pub coverage: CoverageParams,
    pub classify: ClassifyParams,
}

/// Stage summaries of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub coverage: CoverageSummary,
    pub classes: ClassifySummary,
}

/// Build the grid, aggregate coverage and classify, in that order.
///
/// # Arguments
/// * `extent` - Analysis extent, usually a raster layer's bounds
/// * `features` - Building footprints in any supported reference system
/// * `params` - Per-stage parameters
///
/// # Returns
/// The classified grid and the per-stage summaries
pub fn run_pipeline(
    extent: &Extent,
    features: &FeatureCollection,
    params: PipelineParams,
) -> Result<(Grid, PipelineSummary)> {
    let mut grid = build_grid(extent, params.grid)?;

    let reprojected;
    let features = if features.crs().is_equivalent(grid.crs()) {
        features
    } else {
        info!(
            "Reprojecting {} footprints from {} to {}",
            features.len(),
            features.crs(),
            grid.crs()
        );
        reprojected = transform_features(features, grid.crs())?;
        &reprojected
    };

    let coverage = compute_coverage(&mut grid, features, params.coverage)?;
    let classes = classify(&mut grid, params.classify)?;

    Ok((grid, PipelineSummary { coverage, classes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::polygon;
    use urbanmatrix_core::crs::transform::transform_point;
    use urbanmatrix_core::{AttributeValue, Feature, CLASS_FIELD, COVERAGE_FIELD, CRS};

    fn coverage_of(grid: &Grid, id: u64) -> f64 {
        match grid.cell(id).unwrap().attribute(COVERAGE_FIELD) {
            Some(AttributeValue::Float(v)) => *v,
            other => panic!("cell {} has no coverage: {:?}", id, other),
        }
    }

    fn class_of(grid: &Grid, id: u64) -> &str {
        match grid.cell(id).unwrap().attribute(CLASS_FIELD) {
            Some(AttributeValue::String(s)) => s,
            other => panic!("cell {} has no class: {:?}", id, other),
        }
    }

    #[test]
    fn test_stages_chain() {
        let extent = Extent::new(0.0, 0.0, 200.0, 200.0, CRS::web_mercator());
        let mut features = FeatureCollection::with_crs(CRS::web_mercator());
        features.push(Feature::new(
            polygon![
                (x: 0.0, y: 0.0),
                (x: 50.0, y: 0.0),
                (x: 50.0, y: 50.0),
                (x: 0.0, y: 50.0),
            ]
            .into(),
        ));

        let (grid, summary) = run_pipeline(&extent, &features, PipelineParams::default()).unwrap();

        assert_eq!(grid.len(), 4);
        assert_relative_eq!(coverage_of(&grid, 0), 25.0);
        assert_eq!(class_of(&grid, 0), "Moderate");
        assert_eq!(class_of(&grid, 1), "Low");
        assert_eq!(summary.classes.moderate, 1);
        assert_eq!(summary.classes.low, 3);
        assert_eq!(summary.coverage.resolved_cells, 4);
    }

    #[test]
    fn test_footprints_reprojected_to_grid_crs() {
        let mercator = CRS::web_mercator();
        let wgs84 = CRS::wgs84();
        let extent = Extent::new(0.0, 0.0, 200.0, 200.0, mercator.clone());

        // A square that lands on (0,0)..(60,60) in the grid's system,
        // expressed in geographic coordinates
        let corners = [(0.0, 0.0), (60.0, 0.0), (60.0, 60.0), (0.0, 60.0)];
        let ring: Vec<(f64, f64)> = corners
            .iter()
            .map(|(x, y)| transform_point(*x, *y, &mercator, &wgs84).unwrap())
            .collect();

        let mut features = FeatureCollection::with_crs(wgs84);
        features.push(Feature::new(
            geo_types::Polygon::new(geo_types::LineString::from(ring), vec![]).into(),
        ));

        let (grid, _) = run_pipeline(&extent, &features, PipelineParams::default()).unwrap();

        assert_relative_eq!(coverage_of(&grid, 0), 36.0, epsilon = 1e-6);
        assert_eq!(class_of(&grid, 0), "Moderate");
    }

    #[test]
    fn test_invalid_cell_size_stops_pipeline() {
        let extent = Extent::new(0.0, 0.0, 200.0, 200.0, CRS::web_mercator());
        let features = FeatureCollection::with_crs(CRS::web_mercator());
        let params = PipelineParams {
            grid: GridParams { cell_size: -1.0 },
            ..PipelineParams::default()
        };

        assert!(run_pipeline(&extent, &features, params).is_err());
    }
}
