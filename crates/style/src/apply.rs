//! Stamp symbology onto grids and feature collections.
//!
//! Styling is written as `simplestyle` properties (`fill`, `fill-opacity`,
//! `stroke`, `stroke-width`) so exported GeoJSON renders with the intended
//! colors in common viewers. No drawing happens here.

use urbanmatrix_core::{AttributeValue, DensityClass, FeatureCollection, Grid, CLASS_FIELD};

use crate::scheme::{class_color, Outline, Rgba, FOOTPRINT_OUTLINE, GRID_OUTLINE};

fn fill_properties(color: Rgba) -> [(&'static str, AttributeValue); 2] {
    [
        ("fill", AttributeValue::String(color.hex())),
        ("fill-opacity", AttributeValue::Float(color.opacity())),
    ]
}

fn stroke_properties(outline: Outline) -> [(&'static str, AttributeValue); 2] {
    [
        ("stroke", AttributeValue::String(outline.color.hex())),
        ("stroke-width", AttributeValue::Float(outline.width)),
    ]
}

/// Color every cell by its `density_class` attribute.
///
/// Cells without a class label (or with an unknown one) render like
/// `NoData`: transparent fill under the regular grid outline.
pub fn apply_class_colors(grid: &mut Grid) {
    for cell in grid.cells_mut() {
        let class = cell
            .attribute(CLASS_FIELD)
            .and_then(|v| match v {
                AttributeValue::String(s) => DensityClass::from_label(s),
                _ => None,
            })
            .unwrap_or(DensityClass::NoData);

        for (key, value) in fill_properties(class_color(class)) {
            cell.set_attribute(key, value);
        }
        for (key, value) in stroke_properties(GRID_OUTLINE) {
            cell.set_attribute(key, value);
        }
    }
}

/// Style a bare (unclassified) grid: no fill, subtle gray borders.
pub fn apply_grid_outline(grid: &mut Grid) {
    for cell in grid.cells_mut() {
        for (key, value) in fill_properties(Rgba::TRANSPARENT) {
            cell.set_attribute(key, value);
        }
        for (key, value) in stroke_properties(GRID_OUTLINE) {
            cell.set_attribute(key, value);
        }
    }
}

/// Style building footprints: transparent fill, purple border.
pub fn apply_footprint_outline(features: &mut FeatureCollection) {
    for feature in features.features.iter_mut() {
        for (key, value) in fill_properties(Rgba::TRANSPARENT) {
            feature.set_property(key, value);
        }
        for (key, value) in stroke_properties(FOOTPRINT_OUTLINE) {
            feature.set_property(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, point, Rect};
    use urbanmatrix_core::{Cell, Extent, Feature, CRS};

    fn two_cell_grid() -> Grid {
        let cells = vec![
            Cell::new(
                0,
                Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }).to_polygon(),
            ),
            Cell::new(
                1,
                Rect::new(coord! { x: 10.0, y: 0.0 }, coord! { x: 20.0, y: 10.0 }).to_polygon(),
            ),
        ];
        let extent = Extent::new(0.0, 0.0, 20.0, 10.0, CRS::web_mercator());
        Grid::new(cells, CRS::web_mercator(), 10.0, extent).unwrap()
    }

    #[test]
    fn classified_cells_get_class_fill() {
        let mut grid = two_cell_grid();
        grid.cells_mut()[0].set_attribute(CLASS_FIELD, AttributeValue::String("High".into()));

        apply_class_colors(&mut grid);

        let styled = &grid.cells()[0];
        assert_eq!(
            styled.attribute("fill"),
            Some(&AttributeValue::String("#e41a1c".into()))
        );
        assert_eq!(
            styled.attribute("fill-opacity"),
            Some(&AttributeValue::Float(1.0))
        );
        assert_eq!(
            styled.attribute("stroke"),
            Some(&AttributeValue::String("#888888".into()))
        );
    }

    #[test]
    fn unclassified_cell_renders_transparent() {
        let mut grid = two_cell_grid();
        apply_class_colors(&mut grid);

        assert_eq!(
            grid.cells()[1].attribute("fill-opacity"),
            Some(&AttributeValue::Float(0.0))
        );
    }

    #[test]
    fn bare_grid_outline() {
        let mut grid = two_cell_grid();
        apply_grid_outline(&mut grid);

        let cell = &grid.cells()[0];
        assert_eq!(
            cell.attribute("fill-opacity"),
            Some(&AttributeValue::Float(0.0))
        );
        assert_eq!(
            cell.attribute("stroke-width"),
            Some(&AttributeValue::Float(0.3))
        );
    }

    #[test]
    fn footprints_get_purple_border() {
        let mut features = FeatureCollection::new();
        features.push(Feature::new(point! { x: 1.0, y: 2.0 }.into()));

        apply_footprint_outline(&mut features);

        let styled = &features.features[0];
        assert_eq!(
            styled.get_property("stroke"),
            Some(&AttributeValue::String("#3704ba".into()))
        );
        assert_eq!(
            styled.get_property("stroke-width"),
            Some(&AttributeValue::Float(0.8))
        );
    }
}
