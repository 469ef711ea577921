//! # UrbanMatrix Core
//!
//! Core types, traits and I/O for the UrbanMatrix grid classification library.
//!
//! This crate provides:
//! - `Extent`: Analysis rectangle with an attached reference system
//! - `Grid` / `Cell`: Regular polygon grid with per-cell attributes
//! - `Feature` / `FeatureCollection`: Vector features with attribute bags
//! - `CRS`: Coordinate Reference System handling and point transforms
//! - Algorithm traits for consistent API
//! - GeoJSON I/O

pub mod crs;
pub mod error;
pub mod extent;
pub mod grid;
pub mod io;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use extent::Extent;
pub use grid::{Cell, DensityClass, Grid, CLASS_FIELD, COVERAGE_FIELD};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::extent::Extent;
    pub use crate::grid::{Cell, DensityClass, Grid, CLASS_FIELD, COVERAGE_FIELD};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in UrbanMatrix.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
