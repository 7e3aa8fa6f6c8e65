//! Encode attribute columns as GeoJSON feature properties.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_json::writer::{JsonArray, WriterBuilder};
use arrow_schema::{DataType, Field, Schema};
use geojson::JsonObject;

use crate::error::Result;

/// The properties object of every row in `batch`, leaving out the geometry column.
///
/// Values are encoded by `arrow_json`, so nested lists and structs become JSON arrays and
/// objects, non-finite floats become `null` and temporal values become strings. Binary columns
/// are written as lowercase hex.
pub(crate) fn encode_properties(
    batch: &RecordBatch,
    geometry_column_index: usize,
) -> Result<Vec<JsonObject>> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(schema.fields().len());
    for (column_idx, (field, array)) in schema.fields().iter().zip(batch.columns()).enumerate() {
        // Don't include geometry column in properties
        if column_idx == geometry_column_index {
            continue;
        }
        match binary_to_hex(array.as_ref()) {
            Some(hex) => {
                fields.push(Field::new(field.name(), DataType::Utf8, field.is_nullable()));
                columns.push(hex);
            }
            None => {
                fields.push(field.as_ref().clone());
                columns.push(array.clone());
            }
        }
    }

    if columns.is_empty() {
        return Ok(vec![JsonObject::new(); batch.num_rows()]);
    }

    let properties = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, JsonArray>(Vec::new());
    writer.write(&properties)?;
    writer.finish()?;
    Ok(serde_json::from_slice(&writer.into_inner())?)
}

fn binary_to_hex(array: &dyn Array) -> Option<ArrayRef> {
    let hex: StringArray = match array.data_type() {
        DataType::Binary => array
            .as_binary::<i32>()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        DataType::LargeBinary => array
            .as_binary::<i64>()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        DataType::FixedSizeBinary(_) => array
            .as_fixed_size_binary()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        _ => return None,
    };
    Some(Arc::new(hex))
}
