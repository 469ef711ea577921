//! Web Mercator tile math for the building dataset.
//!
//! The dataset partitions the world by zoom-9 quadkeys. An extent maps to
//! the slippy tiles it touches; the tiles' quadkeys select the files to
//! download.

/// Zoom level the building tiles are published at.
pub const FOOTPRINT_ZOOM: u8 = 9;

// Web Mercator latitude limit
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A slippy map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl Tile {
    /// Tile containing a WGS84 coordinate at the given zoom.
    ///
    /// Latitudes beyond the Web Mercator limit are clamped onto the
    /// outermost tile row.
    pub fn containing(lon: f64, lat: f64, z: u8) -> Self {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let n = f64::from(1u32 << z);

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - lat.to_radians().tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

        let max = i64::from((1u32 << z) - 1);
        Self {
            x: (x as i64).clamp(0, max) as u32,
            y: (y as i64).clamp(0, max) as u32,
            z,
        }
    }

    /// Bing Maps quadkey for this tile.
    ///
    /// One base-4 digit per zoom level, most significant first:
    /// bit 1 = east half, bit 2 = south half.
    pub fn quadkey(&self) -> String {
        let mut key = String::with_capacity(self.z as usize);
        for i in (1..=self.z).rev() {
            let mask = 1u32 << (i - 1);
            let mut digit = 0u8;
            if self.x & mask != 0 {
                digit += 1;
            }
            if self.y & mask != 0 {
                digit += 2;
            }
            key.push(char::from(b'0' + digit));
        }
        key
    }
}

/// All zoom-`z` tiles intersecting a WGS84 bounding box.
pub fn tiles_for_bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64, z: u8) -> Vec<Tile> {
    let top_left = Tile::containing(min_lon, max_lat, z);
    let bottom_right = Tile::containing(max_lon, min_lat, z);

    let mut tiles = Vec::new();
    for x in top_left.x..=bottom_right.x {
        for y in top_left.y..=bottom_right.y {
            tiles.push(Tile { x, y, z });
        }
    }
    tiles
}
