//! # UrbanMatrix Style
//!
//! Density-class colors and layer symbology for UrbanMatrix.
//!
//! Provides the class → color table plus grid/footprint outline values, and
//! helpers that stamp them onto grids and feature collections as
//! `simplestyle` GeoJSON properties. Rendering itself is the viewer's job.

mod apply;
mod scheme;

pub use apply::{apply_class_colors, apply_footprint_outline, apply_grid_outline};
pub use scheme::{class_color, Outline, Rgba, FOOTPRINT_OUTLINE, GRID_OUTLINE};
