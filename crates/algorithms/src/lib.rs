//! # UrbanMatrix Algorithms
//!
//! Analysis algorithms for the UrbanMatrix density pipeline.
//!
//! ## Available Algorithm Categories
//!
//! - **grid**: Regular analysis grids over a raster extent
//! - **coverage**: Per-cell built coverage from building footprints
//! - **classify**: Threshold classification of coverage into density classes
//! - **pipeline**: The three stages chained end to end

pub mod classify;
pub mod coverage;
pub mod grid;
pub mod pipeline;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classify::{
        classify, ClassifyParams, ClassifySummary, MatrixClassifier, Thresholds,
    };
    pub use crate::coverage::{
        compute_coverage, CoverageAggregator, CoverageParams, CoverageSummary,
        InvalidGeometryPolicy,
    };
    pub use crate::grid::{build_grid, GridBuilder, GridParams};
    pub use crate::pipeline::{run_pipeline, PipelineParams, PipelineSummary};
    pub use urbanmatrix_core::prelude::*;
}
