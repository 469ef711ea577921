//! GeoJSON reading and writing.
//!
//! Feature collections map directly. Grids are written as a
//! FeatureCollection of cell polygons with `cell_id` properties plus
//! top-level `cell_size` / `extent` / `crs` members, so a written grid can
//! be reloaded losslessly.

use std::collections::HashMap;
use std::path::Path;

use geojson::GeoJson;
use serde_json::json;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::grid::{Cell, Grid};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

// ── Value conversion ─────────────────────────────────────────────────────

fn attr_to_json(value: &AttributeValue) -> serde_json::Value {
    match value {
        AttributeValue::Null => serde_json::Value::Null,
        AttributeValue::Bool(b) => json!(b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        AttributeValue::String(s) => json!(s),
    }
}

fn json_to_attr(value: &serde_json::Value) -> AttributeValue {
    match value {
        serde_json::Value::Null => AttributeValue::Null,
        serde_json::Value::Bool(b) => AttributeValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => AttributeValue::String(s.clone()),
        // Arrays and objects are kept as their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

// ── Feature conversion ───────────────────────────────────────────────────

/// Convert a GeoJSON feature into the native representation.
pub fn feature_from_geojson(feature: geojson::Feature) -> Result<Feature> {
    let geometry = match feature.geometry {
        Some(g) => Some(
            geo_types::Geometry::<f64>::try_from(g.value)
                .map_err(|e| Error::Serde(format!("unusable geometry: {e}")))?,
        ),
        None => None,
    };

    let mut out = Feature {
        geometry,
        properties: HashMap::new(),
        id: None,
    };

    if let Some(id) = feature.id {
        out.id = Some(match id {
            geojson::feature::Id::String(s) => s,
            geojson::feature::Id::Number(n) => n.to_string(),
        });
    }

    if let Some(props) = feature.properties {
        for (k, v) in props {
            out.properties.insert(k, json_to_attr(&v));
        }
    }

    Ok(out)
}

/// Convert a native feature into GeoJSON.
pub fn feature_to_geojson(feature: &Feature) -> geojson::Feature {
    let mut properties = geojson::JsonObject::new();
    for (k, v) in &feature.properties {
        properties.insert(k.clone(), attr_to_json(v));
    }

    geojson::Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: feature.id.clone().map(geojson::feature::Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

// ── Feature collections ──────────────────────────────────────────────────

/// Read a GeoJSON file into a feature collection.
///
/// GeoJSON does not carry a CRS, so the caller states which reference
/// system the coordinates are in.
pub fn read_features(path: impl AsRef<Path>, crs: CRS) -> Result<FeatureCollection> {
    let content = std::fs::read_to_string(path)?;
    let gj: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| Error::Serde(e.to_string()))?;

    let mut collection = FeatureCollection::with_crs(crs);
    match gj {
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                collection.push(feature_from_geojson(feature)?);
            }
        }
        GeoJson::Feature(feature) => collection.push(feature_from_geojson(feature)?),
        GeoJson::Geometry(g) => {
            let geometry = geo_types::Geometry::<f64>::try_from(g.value)
                .map_err(|e| Error::Serde(format!("unusable geometry: {e}")))?;
            collection.push(Feature::new(geometry));
        }
    }
    Ok(collection)
}

/// Write a feature collection as GeoJSON.
pub fn write_features(collection: &FeatureCollection, path: impl AsRef<Path>) -> Result<()> {
    let fc = geojson::FeatureCollection {
        bbox: None,
        features: collection.iter().map(feature_to_geojson).collect(),
        foreign_members: None,
    };
    std::fs::write(path, GeoJson::from(fc).to_string())?;
    Ok(())
}

// ── Grids ────────────────────────────────────────────────────────────────

/// Write a grid as GeoJSON with reload metadata.
pub fn write_grid(grid: &Grid, path: impl AsRef<Path>) -> Result<()> {
    let mut features = Vec::with_capacity(grid.len());
    for cell in grid.cells() {
        let mut properties = geojson::JsonObject::new();
        properties.insert("cell_id".to_string(), json!(cell.id()));
        for (k, v) in cell.attributes() {
            properties.insert(k.clone(), attr_to_json(v));
        }
        features.push(geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(cell.geometry()))),
            id: Some(geojson::feature::Id::Number(cell.id().into())),
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let extent = grid.extent();
    let mut foreign = geojson::JsonObject::new();
    foreign.insert("cell_size".to_string(), json!(grid.cell_size()));
    foreign.insert(
        "extent".to_string(),
        json!([extent.min_x(), extent.min_y(), extent.max_x(), extent.max_y()]),
    );
    foreign.insert("crs".to_string(), json!(grid.crs().identifier()));

    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    };
    std::fs::write(path, GeoJson::from(fc).to_string())?;
    Ok(())
}

/// Read a grid previously written by [`write_grid`].
pub fn read_grid(path: impl AsRef<Path>) -> Result<Grid> {
    let content = std::fs::read_to_string(path)?;
    let gj: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| Error::Serde(e.to_string()))?;

    let GeoJson::FeatureCollection(fc) = gj else {
        return Err(Error::Serde(
            "grid file must be a FeatureCollection".to_string(),
        ));
    };

    let foreign = fc
        .foreign_members
        .as_ref()
        .ok_or_else(|| Error::Serde("grid file missing grid metadata".to_string()))?;

    let cell_size = foreign
        .get("cell_size")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| Error::Serde("grid file missing cell_size".to_string()))?;
    let crs = foreign
        .get("crs")
        .and_then(|v| v.as_str())
        .and_then(CRS::parse)
        .ok_or_else(|| Error::Serde("grid file missing crs".to_string()))?;
    let corners = foreign
        .get("extent")
        .and_then(|v| v.as_array())
        .filter(|a| a.len() == 4)
        .ok_or_else(|| Error::Serde("grid file missing extent".to_string()))?;
    let mut e = [0.0f64; 4];
    for (i, v) in corners.iter().enumerate() {
        e[i] = v
            .as_f64()
            .ok_or_else(|| Error::Serde("grid extent must be numeric".to_string()))?;
    }
    let extent = Extent::new(e[0], e[1], e[2], e[3], crs.clone());

    let mut cells = Vec::with_capacity(fc.features.len());
    for (index, gj_feature) in fc.features.into_iter().enumerate() {
        let mut feature = feature_from_geojson(gj_feature)?;
        let Some(geo_types::Geometry::Polygon(polygon)) = feature.geometry.take() else {
            return Err(Error::Geometry {
                index,
                reason: "grid cell must be a polygon".to_string(),
            });
        };

        let id = feature
            .get_property("cell_id")
            .and_then(AttributeValue::as_f64)
            .ok_or_else(|| Error::MissingField {
                field: "cell_id".to_string(),
                cell_id: index as u64,
            })? as u64;

        let mut cell = Cell::new(id, polygon);
        for (k, v) in feature.properties {
            if k != "cell_id" {
                cell.set_attribute(k, v);
            }
        }
        cells.push(cell);
    }

    Grid::new(cells, crs, cell_size, extent)
}
