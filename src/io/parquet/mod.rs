//! Read the [GeoParquet](https://github.com/opengeospatial/geoparquet) format.

mod metadata;
mod options;
mod reader;

pub use metadata::{
    GeoParquetColumnEncoding, GeoParquetColumnMetadata, GeoParquetGeometryType,
    GeoParquetMetadata, GEO_METADATA_KEY,
};
pub use options::GeoParquetReaderOptions;
pub use reader::read_geoparquet;
