//! Footprint preparation and spatial indexing
//!
//! Features are validated and flattened to multipolygons once, with area and
//! bounding box cached, then bulk-loaded into an R-tree so each cell only
//! runs the boolean overlay against nearby candidates.

use geo::{Area, BoundingRect};
use geo_types::{Geometry, MultiPolygon, Polygon};
use rstar::{RTreeObject, AABB};

/// A footprint ready for overlay: flattened polygons with cached area and envelope.
#[derive(Debug, Clone)]
pub(crate) struct IndexedFootprint {
    /// Position of the source feature in the input collection
    pub index: usize,
    pub polygons: MultiPolygon<f64>,
    pub area: f64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFootprint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Prepare one feature for the coverage overlay.
///
/// Returns `Ok(None)` for geometry with no polygonal area (points, lines,
/// missing geometry), `Ok(Some(_))` for a usable footprint, and `Err(reason)`
/// for geometry that cannot be intersected safely.
pub(crate) fn prepare(
    index: usize,
    geometry: Option<&Geometry<f64>>,
) -> std::result::Result<Option<IndexedFootprint>, String> {
    let Some(geometry) = geometry else {
        return Ok(None);
    };

    let polygons = flatten_polygons(geometry);
    if polygons.is_empty() {
        return Ok(None);
    }
    for polygon in &polygons {
        validate_polygon(polygon)?;
    }

    let polygons = MultiPolygon::new(polygons);
    let rect = polygons
        .bounding_rect()
        .ok_or_else(|| "footprint has no extent".to_string())?;

    Ok(Some(IndexedFootprint {
        index,
        area: polygons.unsigned_area(),
        envelope: AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        ),
        polygons,
    }))
}

/// Bounding box of a geometry, only if every bound is finite.
pub(crate) fn finite_envelope(geometry: &Geometry<f64>) -> Option<AABB<[f64; 2]>> {
    let rect = geometry.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    if min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite() {
        Some(AABB::from_corners([min.x, min.y], [max.x, max.y]))
    } else {
        None
    }
}

// Polygonal content of a geometry. Points and lines have zero area by
// definition and drop out here.
fn flatten_polygons(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(flatten_polygons).collect(),
        _ => Vec::new(),
    }
}

// The boolean overlay misbehaves on non-finite coordinates and rings below
// the closed-triangle minimum, so those are rejected up front.
fn validate_polygon(polygon: &Polygon<f64>) -> std::result::Result<(), String> {
    let rings = std::iter::once(("exterior", polygon.exterior()))
        .chain(polygon.interiors().iter().map(|r| ("interior", r)));

    for (ring_name, ring) in rings {
        if ring.0.len() < 4 {
            return Err(format!(
                "{} ring has {} coordinates, need at least 4",
                ring_name,
                ring.0.len()
            ));
        }
        for c in &ring.0 {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(format!("non-finite coordinate in {} ring", ring_name));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, point, polygon, Rect};

    #[test]
    fn test_prepare_polygon() {
        let geom = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]);
        let fp = prepare(3, Some(&geom)).unwrap().unwrap();

        assert_eq!(fp.index, 3);
        assert!((fp.area - 100.0).abs() < 1e-9);
        assert_eq!(fp.envelope(), AABB::from_corners([0.0, 0.0], [10.0, 10.0]));
    }

    #[test]
    fn test_rect_and_collection_flatten() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 4.0 });
        let gc = Geometry::GeometryCollection(geo_types::GeometryCollection::from(vec![
            Geometry::Rect(rect),
            Geometry::Point(point! { x: 1.0, y: 1.0 }),
        ]));

        let fp = prepare(0, Some(&gc)).unwrap().unwrap();
        assert!((fp.area - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_inputs() {
        let point = Geometry::Point(point! { x: 1.0, y: 2.0 });
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 5.0)]);

        assert!(prepare(0, Some(&point)).unwrap().is_none());
        assert!(prepare(1, Some(&line)).unwrap().is_none());
        assert!(prepare(2, None).unwrap().is_none());
    }

    #[test]
    fn test_non_finite_rejected() {
        let geom = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]);
        let reason = prepare(0, Some(&geom)).unwrap_err();
        assert!(reason.contains("non-finite"));
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        let geom = Geometry::Polygon(Polygon::new(
            geo_types::LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            vec![],
        ));
        let reason = prepare(0, Some(&geom)).unwrap_err();
        assert!(reason.contains("coordinates"));
    }

    #[test]
    fn test_finite_envelope() {
        let ok = Geometry::Polygon(polygon![
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
        ]);
        assert!(finite_envelope(&ok).is_some());

        let bad = Geometry::Polygon(polygon![
            (x: 1.0, y: f64::INFINITY),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
        ]);
        assert!(finite_envelope(&bad).is_none());
    }
}
