//! Reading GeoParquet and writing GeoJSON.

pub mod geojson;
pub mod parquet;
