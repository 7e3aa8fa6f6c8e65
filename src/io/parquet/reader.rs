use arrow_array::RecordBatch;
use arrow_schema::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use tracing::{debug, warn};

use crate::error::Result;
use crate::io::parquet::metadata::{GeoParquetMetadata, GEO_METADATA_KEY};
use crate::io::parquet::GeoParquetReaderOptions;
use crate::table::GeoTable;

/// Read a GeoParquet file to a [`GeoTable`].
///
/// Geometry columns are kept in their stored encoding and the `geo` metadata document travels
/// along in the schema metadata. The metadata is only validated when the table is used (for
/// example when converting to GeoJSON), so files with an unknown GeoParquet version can still be
/// read as plain Arrow data.
pub fn read_geoparquet<R: ChunkReader + 'static>(
    reader: R,
    options: GeoParquetReaderOptions,
) -> Result<GeoTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
    log_geo_metadata(&builder);

    let builder = options.apply_to_builder(builder);
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;

    let table = GeoTable::try_new(schema, batches)?;
    debug!(
        rows = table.len(),
        columns = table.num_columns(),
        "read GeoParquet table"
    );
    Ok(table)
}

fn log_geo_metadata<T: ChunkReader>(builder: &ParquetRecordBatchReaderBuilder<T>) {
    let file_metadata = builder.metadata().file_metadata();
    let has_geo_key = file_metadata
        .key_value_metadata()
        .map(|kv| kv.iter().any(|kv| kv.key == GEO_METADATA_KEY))
        .unwrap_or(false);
    if !has_geo_key {
        debug!("Parquet file has no GeoParquet metadata");
        return;
    }

    match GeoParquetMetadata::from_parquet_meta(file_metadata) {
        Ok(geo_meta) => debug!(
            version = %geo_meta.version,
            primary_column = %geo_meta.primary_column,
            "found GeoParquet metadata"
        ),
        Err(err) => warn!(%err, "GeoParquet metadata could not be validated"),
    }
}
