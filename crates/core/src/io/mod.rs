//! I/O operations for reading and writing geospatial data

mod geojson_io;

pub use geojson_io::{
    feature_from_geojson, feature_to_geojson, read_features, read_grid, write_features,
    write_grid,
};
