//! Pure-Rust point and geometry reprojection (Snyder 1987, USGS formulas).
//!
//! Covers WGS84 geographic (EPSG:4326), Web Mercator (EPSG:3857) and UTM
//! (EPSG:326xx north / 327xx south). Arbitrary pairs are routed through
//! WGS84. No external C dependencies (no libproj).

use geo::MapCoords;
use geo_types::{Coord, Geometry};

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::vector::FeatureCollection;

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude limit of the Web Mercator projection (atan(sinh(π)) in degrees).
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

// ── Public API ───────────────────────────────────────────────────────────

/// Reproject a single point.
///
/// Fails with [`Error::UnsupportedCrs`] when either side is not one of the
/// supported systems. Equivalent source and target return the point
/// unchanged.
pub fn transform_point(x: f64, y: f64, from: &CRS, to: &CRS) -> Result<(f64, f64)> {
    if from.is_equivalent(to) {
        return Ok((x, y));
    }
    let from_proj = projection_for(from)?;
    let to_proj = projection_for(to)?;
    let (lon, lat) = from_proj.to_wgs84(x, y);
    Ok(to_proj.from_wgs84(lon, lat))
}

/// Reproject every coordinate of a geometry.
pub fn transform_geometry(geometry: &Geometry<f64>, from: &CRS, to: &CRS) -> Result<Geometry<f64>> {
    if from.is_equivalent(to) {
        return Ok(geometry.clone());
    }
    let from_proj = projection_for(from)?;
    let to_proj = projection_for(to)?;
    Ok(geometry.map_coords(|c| map_coord(c, from_proj, to_proj)))
}

/// Reproject all features of a collection into the target reference system.
pub fn transform_features(collection: &FeatureCollection, to: &CRS) -> Result<FeatureCollection> {
    if collection.crs().is_equivalent(to) {
        return Ok(collection.clone());
    }
    let from_proj = projection_for(collection.crs())?;
    let to_proj = projection_for(to)?;

    let mut out = FeatureCollection::with_crs(to.clone());
    for feature in collection.iter() {
        let mut f = feature.clone();
        f.geometry = feature
            .geometry
            .as_ref()
            .map(|g| g.map_coords(|c| map_coord(c, from_proj, to_proj)));
        out.push(f);
    }
    Ok(out)
}

/// Reproject an extent by transforming all four corners and taking the
/// envelope. This handles the non-linear distortion of projected systems
/// better than transforming only min/max.
pub fn transform_extent(extent: &Extent, to: &CRS) -> Result<Extent> {
    if extent.crs().is_equivalent(to) {
        return Ok(extent.clone());
    }
    let from_proj = projection_for(extent.crs())?;
    let to_proj = projection_for(to)?;

    let corners = [
        (extent.min_x(), extent.min_y()),
        (extent.min_x(), extent.max_y()),
        (extent.max_x(), extent.min_y()),
        (extent.max_x(), extent.max_y()),
    ];

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for &(x, y) in &corners {
        let (lon, lat) = from_proj.to_wgs84(x, y);
        let (tx, ty) = to_proj.from_wgs84(lon, lat);
        min_x = min_x.min(tx);
        min_y = min_y.min(ty);
        max_x = max_x.max(tx);
        max_y = max_y.max(ty);
    }

    Ok(Extent::new(min_x, min_y, max_x, max_y, to.clone()))
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

// ── Projection dispatch ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Geographic,
    WebMercator,
    Utm { zone: u32, north: bool },
}

impl Projection {
    fn from_wgs84(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Self::Geographic => (lon, lat),
            Self::WebMercator => wgs84_to_web_mercator(lon, lat),
            Self::Utm { zone, north } => wgs84_to_utm(lon, lat, zone, north),
        }
    }

    fn to_wgs84(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Geographic => (x, y),
            Self::WebMercator => web_mercator_to_wgs84(x, y),
            Self::Utm { zone, north } => utm_to_wgs84(x, y, zone, north),
        }
    }
}

fn projection_for(crs: &CRS) -> Result<Projection> {
    let Some(code) = crs.epsg() else {
        return Err(Error::UnsupportedCrs(crs.identifier()));
    };
    match code {
        4326 => Ok(Projection::Geographic),
        3857 => Ok(Projection::WebMercator),
        _ => parse_utm_epsg(code)
            .map(|(zone, north)| Projection::Utm { zone, north })
            .ok_or_else(|| Error::UnsupportedCrs(crs.identifier())),
    }
}

fn map_coord(c: Coord<f64>, from_proj: Projection, to_proj: Projection) -> Coord<f64> {
    let (lon, lat) = from_proj.to_wgs84(c.x, c.y);
    let (x, y) = to_proj.from_wgs84(lon, lat);
    Coord { x, y }
}

// ── Web Mercator (spherical, EPSG:3857) ─────────────────────────────────

/// WGS84 degrees to Web Mercator metres. Latitude is clamped to the
/// projection's valid range.
fn wgs84_to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = A * lon.to_radians();
    let y = A * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / A).to_degrees();
    let lat = (2.0 * (y / A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

// ── UTM (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64) ─────────────────

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    // Central meridian of the zone
    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    // Meridional arc length M (Snyder eq. 3-21)
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Easting (Snyder eq. 8-9)
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2)
                * a4
                * a_coeff
                / 120.0)
        + FALSE_EASTING;

    // Northing (Snyder eq. 8-10)
    let northing = K0
        * (m
            + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// Convert UTM (easting, northing) in metres back to WGS84 degrees
/// (Snyder eqs. 8-17 to 8-25, footpoint latitude series).
fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    // Footpoint latitude (Snyder eq. 7-19 / 3-24)
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * E2 * E2 / 64.0 - 5.0 * E2 * E2 * E2 / 256.0));
    let e1 = (1.0 - (1.0 - E2).sqrt()) / (1.0 + (1.0 - E2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = A / (1.0 - E2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = A * (1.0 - E2) / (1.0 - E2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d4 = d2 * d2;
    let d6 = d4 * d2;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d4
                * d
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::point;

    /// Helper: assert two values are within `tol` of each other.
    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    #[test]
    fn parse_utm_north() {
        assert_eq!(parse_utm_epsg(32630), Some((30, true)));
        assert_eq!(parse_utm_epsg(32601), Some((1, true)));
        assert_eq!(parse_utm_epsg(32660), Some((60, true)));
    }

    #[test]
    fn parse_utm_south() {
        assert_eq!(parse_utm_epsg(32721), Some((21, false)));
        assert_eq!(parse_utm_epsg(32701), Some((1, false)));
        assert_eq!(parse_utm_epsg(32760), Some((60, false)));
    }

    #[test]
    fn parse_utm_invalid() {
        assert_eq!(parse_utm_epsg(4326), None);
        assert_eq!(parse_utm_epsg(3857), None);
        assert_eq!(parse_utm_epsg(32600), None); // zone 0 invalid
        assert_eq!(parse_utm_epsg(32661), None); // zone 61 invalid
        assert_eq!(parse_utm_epsg(32700), None);
    }

    // Reference values from pyproj (PROJ 9.x):
    //   from pyproj import Transformer
    //   t = Transformer.from_crs(4326, 32630, always_xy=True)
    //   t.transform(-3.7037, 40.4168) → (440298.94, 4474257.31)
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    // Buenos Aires: (-58.3816, -34.6037) → UTM 21S (EPSG:32721)
    //   t = Transformer.from_crs(4326, 32721, always_xy=True)
    //   t.transform(-58.3816, -34.6037) → (373317.50, 6170036.17)
    #[test]
    fn buenos_aires_wgs84_to_utm21s() {
        let (e, n) = wgs84_to_utm(-58.3816, -34.6037, 21, false);
        assert_close(e, 373_317.50, 1.0, "easting");
        assert_close(n, 6_170_036.17, 1.0, "northing");
    }

    // Equator at zone 30 central meridian (-3°): easting should be 500000
    #[test]
    fn equator_central_meridian() {
        let (e, n) = wgs84_to_utm(-3.0, 0.0, 30, true);
        assert_close(e, 500_000.0, 0.01, "easting at CM");
        assert_close(n, 0.0, 0.01, "northing at equator");
    }

    #[test]
    fn utm_inverse_matches_reference() {
        let (lon, lat) = utm_to_wgs84(440_298.94, 4_474_257.31, 30, true);
        assert_close(lon, -3.7037, 1e-4, "longitude");
        assert_close(lat, 40.4168, 1e-4, "latitude");
    }

    #[test]
    fn utm_round_trip() {
        for &(lon, lat, zone, north) in &[
            (-3.7037_f64, 40.4168_f64, 30_u32, true),
            (-58.3816, -34.6037, 21, false),
            (139.6917, 35.6895, 54, true),
        ] {
            let (e, n) = wgs84_to_utm(lon, lat, zone, north);
            let (lon2, lat2) = utm_to_wgs84(e, n, zone, north);
            assert_relative_eq!(lon, lon2, epsilon = 1e-7);
            assert_relative_eq!(lat, lat2, epsilon = 1e-7);
        }
    }

    // The projection bound: x at 180° longitude is exactly A·π.
    #[test]
    fn mercator_world_edge() {
        let (x, _) = wgs84_to_web_mercator(180.0, 0.0);
        assert_relative_eq!(x, 20_037_508.342_789_244, epsilon = 1e-6);

        let (_, y) = wgs84_to_web_mercator(0.0, MAX_MERCATOR_LAT);
        assert_relative_eq!(y, 20_037_508.342_789_244, epsilon = 1e-3);
    }

    #[test]
    fn mercator_equator_origin() {
        let (x, y) = wgs84_to_web_mercator(0.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn mercator_round_trip() {
        for &(lon, lat) in &[(-0.1278_f64, 51.5074_f64), (139.6917, 35.6895), (-74.0060, 40.7128)] {
            let (x, y) = wgs84_to_web_mercator(lon, lat);
            let (lon2, lat2) = web_mercator_to_wgs84(x, y);
            assert_relative_eq!(lon, lon2, epsilon = 1e-9);
            assert_relative_eq!(lat, lat2, epsilon = 1e-9);
        }
    }

    #[test]
    fn mercator_clamps_polar_latitudes() {
        let (_, y_pole) = wgs84_to_web_mercator(0.0, 90.0);
        let (_, y_max) = wgs84_to_web_mercator(0.0, MAX_MERCATOR_LAT);
        assert_relative_eq!(y_pole, y_max, epsilon = 1e-6);
    }

    #[test]
    fn point_same_crs_unchanged() {
        let crs = CRS::web_mercator();
        let (x, y) = transform_point(123.4, 567.8, &crs, &crs).unwrap();
        assert_eq!((x, y), (123.4, 567.8));
    }

    #[test]
    fn point_unsupported_crs_fails() {
        let err = transform_point(0.0, 0.0, &CRS::from_epsg(2154), &CRS::wgs84()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(_)));

        let err = transform_point(0.0, 0.0, &CRS::from_wkt("LOCAL_CS[..]"), &CRS::wgs84());
        assert!(err.is_err());
    }

    #[test]
    fn geometry_transform_wgs84_to_mercator() {
        let geom: Geometry<f64> = point! { x: -3.7037, y: 40.4168 }.into();
        let out = transform_geometry(&geom, &CRS::wgs84(), &CRS::web_mercator()).unwrap();
        let Geometry::Point(p) = out else {
            panic!("expected point");
        };
        let (x, y) = wgs84_to_web_mercator(-3.7037, 40.4168);
        assert_relative_eq!(p.x(), x);
        assert_relative_eq!(p.y(), y);
    }

    #[test]
    fn extent_transform_envelope() {
        let extent = Extent::new(-3.75, 40.40, -3.70, 40.45, CRS::wgs84());
        let result = transform_extent(&extent, &CRS::utm(30, true)).unwrap();

        assert!(result.min_x() > 100_000.0, "easting should be in metres");
        assert!(result.min_y() > 4_000_000.0, "northing should be in metres");

        // Width roughly 4km (0.05° lon at 40°N ≈ 4.3 km)
        let width = result.width();
        assert!(width > 3_000.0 && width < 6_000.0, "width ~4km, got {width}");

        // Height roughly 5.5km (0.05° lat ≈ 5.5 km)
        let height = result.height();
        assert!(
            height > 4_000.0 && height < 7_000.0,
            "height ~5.5km, got {height}"
        );
    }

    #[test]
    fn features_transform_carries_attributes() {
        use crate::vector::{AttributeValue, Feature};

        let mut fc = FeatureCollection::with_crs(CRS::wgs84());
        let mut f = Feature::new(point! { x: -58.3816, y: -34.6037 }.into());
        f.set_property("height", AttributeValue::Float(12.0));
        fc.push(f);

        let out = transform_features(&fc, &CRS::web_mercator()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.crs().is_equivalent(&CRS::web_mercator()));
        assert_eq!(
            out.features[0].get_property("height"),
            Some(&AttributeValue::Float(12.0))
        );
        let Some(Geometry::Point(p)) = &out.features[0].geometry else {
            panic!("expected point");
        };
        assert!(p.x() < -6_000_000.0, "x in metres, got {}", p.x());
    }
}
