//! Blocking (synchronous) API.
//!
//! Wraps the async [`MicrosoftBuildings`] client with a Tokio runtime so
//! callers don't need to manage their own async runtime.

use urbanmatrix_core::{Extent, FeatureCollection};

use crate::client::{ClientOptions, MicrosoftBuildings};
use crate::error::{IngestError, Result};
use crate::FootprintSource;

/// Blocking wrapper around [`MicrosoftBuildings`].
///
/// Uses an internal single-threaded Tokio runtime.
pub struct MicrosoftBuildingsBlocking {
    rt: tokio::runtime::Runtime,
    inner: MicrosoftBuildings,
}

impl MicrosoftBuildingsBlocking {
    /// Connect and download the dataset index (blocking).
    pub fn open(options: ClientOptions) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| IngestError::Network(e.to_string()))?;

        let inner = rt.block_on(MicrosoftBuildings::open(options))?;

        Ok(Self { rt, inner })
    }

    /// Fetch all footprints intersecting `extent` (blocking).
    pub fn fetch(&self, extent: &Extent) -> Result<FeatureCollection> {
        self.rt.block_on(self.inner.fetch(extent))
    }
}

impl FootprintSource for MicrosoftBuildingsBlocking {
    fn footprints_for_extent(&self, extent: &Extent) -> Result<FeatureCollection> {
        self.fetch(extent)
    }
}

/// One-shot convenience function: connect, fetch an extent, return the
/// footprints.
pub fn fetch_footprints(extent: &Extent, options: ClientOptions) -> Result<FeatureCollection> {
    let client = MicrosoftBuildingsBlocking::open(options)?;
    client.fetch(extent)
}
