//! Async client for the Microsoft Global Buildings dataset.
//!
//! Tile files are gzipped GeoJSON Lines (one feature per line) in WGS84,
//! published per zoom-9 quadkey. `fetch` resolves the extent to quadkeys,
//! downloads the covered tiles concurrently and returns the footprints that
//! intersect the extent, reprojected into the extent's reference system.

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use futures::stream::{FuturesOrdered, StreamExt};
use geo::BoundingRect;
use tracing::{debug, info, warn};

use urbanmatrix_core::crs::transform::{transform_extent, transform_features};
use urbanmatrix_core::io::feature_from_geojson;
use urbanmatrix_core::{Extent, Feature, FeatureCollection, CRS};

use crate::error::{IngestError, Result};
use crate::index::{DatasetIndex, DATASET_INDEX_URL};
use crate::tiles::{tiles_for_bbox, Tile, FOOTPRINT_ZOOM};

/// Configuration for [`MicrosoftBuildings`].
pub struct ClientOptions {
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
    /// Override the dataset index location.
    pub index_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            index_url: DATASET_INDEX_URL.to_string(),
        }
    }
}

/// Async client for the global building footprint tiles.
pub struct MicrosoftBuildings {
    client: reqwest::Client,
    options: ClientOptions,
    index: DatasetIndex,
}

impl MicrosoftBuildings {
    /// Connect and download the dataset index.
    pub async fn open(options: ClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {e}")))?;

        let csv = get_text_with_retry(&client, &options.index_url, options.max_retries).await?;
        let index = DatasetIndex::parse(&csv)?;
        info!("Building dataset index loaded: {} quadkeys", index.len());

        Ok(Self {
            client,
            options,
            index,
        })
    }

    /// The parsed dataset index.
    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    /// Fetch all footprints intersecting `extent`.
    ///
    /// The result is returned in the extent's reference system. A tile that
    /// fails after retries is skipped with a warning rather than failing the
    /// whole fetch; an extent the dataset does not cover yields an empty
    /// collection.
    pub async fn fetch(&self, extent: &Extent) -> Result<FeatureCollection> {
        let wgs84 = CRS::wgs84();
        let geographic = if extent.crs().is_equivalent(&wgs84) {
            extent.clone()
        } else {
            transform_extent(extent, &wgs84)?
        };

        let tiles = tiles_for_bbox(
            geographic.min_x(),
            geographic.min_y(),
            geographic.max_x(),
            geographic.max_y(),
            FOOTPRINT_ZOOM,
        );
        info!("Extent covers {} zoom-{} tiles", tiles.len(), FOOTPRINT_ZOOM);

        let mut futs = FuturesOrdered::new();
        for tile in tiles {
            let geographic = &geographic;
            futs.push_back(async move { (tile, self.fetch_tile(tile, geographic).await) });
        }

        let mut collection = FeatureCollection::with_crs(wgs84);
        while let Some((tile, result)) = futs.next().await {
            match result {
                Ok(features) => {
                    for feature in features {
                        collection.push(feature);
                    }
                }
                Err(e) => warn!("Skipping quadkey {}: {}", tile.quadkey(), e),
            }
        }

        if collection.is_empty() {
            warn!("No footprints found for {}", extent);
        } else {
            info!("Fetched {} footprints", collection.len());
        }

        if extent.crs().is_equivalent(collection.crs()) {
            Ok(collection)
        } else {
            Ok(transform_features(&collection, extent.crs())?)
        }
    }

    async fn fetch_tile(&self, tile: Tile, extent: &Extent) -> Result<Vec<Feature>> {
        let quadkey = tile.quadkey();
        let Some(url) = self.index.url_for(&quadkey) else {
            debug!("No dataset tile for quadkey {}", quadkey);
            return Ok(Vec::new());
        };

        debug!("Fetching quadkey {}", quadkey);
        let bytes = get_bytes_with_retry(&self.client, url, self.options.max_retries).await?;
        let text = decompress_gzip(&bytes)?;
        let features = parse_geojsonl(&text, extent)?;
        debug!(
            "Quadkey {}: {} footprints intersect the extent",
            quadkey,
            features.len()
        );
        Ok(features)
    }
}

// ── HTTP plumbing ────────────────────────────────────────────────────────

async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    max_retries: u32,
) -> Result<reqwest::Response> {
    let mut last_err: Option<reqwest::Error> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff_ms = 100u64 * 2u64.pow(attempt - 1);
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }

        match client.get(url).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    return Err(IngestError::Network(format!(
                        "HTTP {} fetching {}",
                        resp.status(),
                        url
                    )));
                }
                return Ok(resp);
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = Some(e);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(last_err
        .map(IngestError::Http)
        .unwrap_or_else(|| IngestError::Network(format!("retries exhausted for {url}"))))
}

async fn get_text_with_retry(
    client: &reqwest::Client,
    url: &str,
    max_retries: u32,
) -> Result<String> {
    let resp = get_with_retry(client, url, max_retries).await?;
    Ok(resp.text().await?)
}

async fn get_bytes_with_retry(
    client: &reqwest::Client,
    url: &str,
    max_retries: u32,
) -> Result<Vec<u8>> {
    let resp = get_with_retry(client, url, max_retries).await?;
    Ok(resp.bytes().await?.to_vec())
}

// ── Tile file decoding ───────────────────────────────────────────────────

pub(crate) fn decompress_gzip(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| IngestError::Decompress(e.to_string()))?;
    Ok(text)
}

/// Parse GeoJSON Lines, keeping only features whose bounding box touches
/// the extent. Coordinates are WGS84, like the extent passed in.
pub(crate) fn parse_geojsonl(text: &str, extent: &Extent) -> Result<Vec<Feature>> {
    let mut features = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let gj: geojson::Feature = line.parse().map_err(|e: geojson::Error| {
            IngestError::Record {
                line: line_no + 1,
                reason: e.to_string(),
            }
        })?;
        let feature = feature_from_geojson(gj).map_err(|e| IngestError::Record {
            line: line_no + 1,
            reason: e.to_string(),
        })?;

        if intersects_extent(&feature, extent) {
            features.push(feature);
        }
    }

    Ok(features)
}

fn intersects_extent(feature: &Feature, extent: &Extent) -> bool {
    let Some(geometry) = feature.geometry.as_ref() else {
        return false;
    };
    let Some(rect) = geometry.bounding_rect() else {
        return false;
    };
    rect.min().x <= extent.max_x()
        && rect.max().x >= extent.min_x()
        && rect.min().y <= extent.max_y()
        && rect.max().y >= extent.min_y()
}
