//! Write tables to [GeoJSON](https://geojson.org/).

pub use geometry::{GeometryEncoding, NativeType};
pub use writer::{table_to_geojson, table_to_geojson_with_options, write_geojson, GeoJsonOptions};

mod geometry;
mod properties;
mod writer;
