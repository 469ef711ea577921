//! # UrbanMatrix Ingest
//!
//! Building footprint acquisition from the Microsoft Global Buildings
//! open dataset.
//!
//! The dataset publishes footprints as gzipped GeoJSON Lines files, one per
//! zoom-9 quadkey, listed in a CSV index. This crate resolves an analysis
//! extent to the quadkeys that cover it, downloads the tiles concurrently
//! and returns the footprints as a [`FeatureCollection`] in the extent's
//! reference system.

pub mod client;
pub mod error;
pub mod index;
pub mod sync_api;
pub mod tiles;

pub use client::{ClientOptions, MicrosoftBuildings};
pub use error::{IngestError, Result};
pub use index::{DatasetIndex, DATASET_INDEX_URL};
pub use sync_api::{fetch_footprints, MicrosoftBuildingsBlocking};
pub use tiles::{tiles_for_bbox, Tile, FOOTPRINT_ZOOM};

use urbanmatrix_core::{Extent, FeatureCollection};

/// A provider of building footprints for an analysis extent.
///
/// Lets the pipeline run against any footprint source: the remote dataset,
/// a local file, or a fixture in tests.
pub trait FootprintSource {
    /// Return all footprints intersecting `extent`, in the extent's
    /// reference system.
    fn footprints_for_extent(&self, extent: &Extent) -> Result<FeatureCollection>;
}
