//! Integration tests for the building footprint client.
//!
//! Tests marked `#[ignore]` require network access to the live dataset.
//! Run with: `cargo test -p urbanmatrix-ingest -- --ignored`

use urbanmatrix_core::{Extent, CRS};
use urbanmatrix_ingest::{ClientOptions, MicrosoftBuildings, MicrosoftBuildingsBlocking};

/// A couple of blocks of lower Manhattan.
fn manhattan() -> Extent {
    Extent::new(-74.012, 40.705, -74.005, 40.710, CRS::wgs84())
}

/// Fetch real footprints for a dense urban extent.
#[tokio::test]
#[ignore]
async fn test_fetch_manhattan_footprints() {
    let client = MicrosoftBuildings::open(ClientOptions::default())
        .await
        .expect("failed to open dataset");

    let footprints = client.fetch(&manhattan()).await.expect("fetch failed");

    println!("Fetched {} footprints", footprints.len());
    assert!(!footprints.is_empty(), "lower Manhattan should have buildings");
    assert!(footprints.crs().is_equivalent(&CRS::wgs84()));
    assert!(footprints.iter().all(|f| f.geometry.is_some()));
}

/// The dataset index should cover well-known urban quadkeys.
#[tokio::test]
#[ignore]
async fn test_index_covers_new_york() {
    let client = MicrosoftBuildings::open(ClientOptions::default())
        .await
        .expect("failed to open dataset");

    let index = client.index();
    println!("Index holds {} quadkeys", index.len());
    assert!(index.url_for("032010110").is_some(), "NYC quadkey missing");
}

/// The blocking facade should behave like the async client.
#[test]
#[ignore]
fn test_blocking_fetch() {
    let client =
        MicrosoftBuildingsBlocking::open(ClientOptions::default()).expect("failed to open");
    let footprints = client.fetch(&manhattan()).expect("fetch failed");
    assert!(!footprints.is_empty());
}
