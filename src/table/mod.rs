//! Abstractions for Arrow tables holding geometries and attributes.

use std::sync::Arc;

use arrow::compute::filter_record_batch;
use arrow_array::{BooleanArray, RecordBatch};
use arrow_schema::{Field, SchemaRef};

use crate::error::{Result, SwemapsError};
use crate::io::parquet::GeoParquetMetadata;

/// Extension name keys on Arrow fields, as defined by the Arrow columnar format.
pub(crate) const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

/// An immutable set of record batches sharing one schema, with one geometry column.
///
/// The geometry column is not fixed at construction. It is resolved when needed from an explicit
/// name, the primary column of the GeoParquet metadata, or a field with a GeoArrow extension type.
#[derive(Debug, Clone)]
pub struct GeoTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl GeoTable {
    /// Create a table from a schema and batches. Every batch must have the same fields as the
    /// schema.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for batch in batches.iter() {
            if batch.schema().fields() != schema.fields() {
                return Err(SwemapsError::General(
                    "all record batches must have the same fields as the table schema"
                        .to_string(),
                ));
            }
        }
        Ok(Self { schema, batches })
    }

    /// The number of rows across all batches.
    pub fn len(&self) -> usize {
        self.batches.iter().fold(0, |sum, val| sum + val.num_rows())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// `(rows, columns)`, geometry column included.
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.num_columns())
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &Vec<RecordBatch> {
        &self.batches
    }

    /// The validated GeoParquet metadata attached to this table's schema, if any.
    pub fn geo_metadata(&self) -> Result<Option<GeoParquetMetadata>> {
        GeoParquetMetadata::from_schema(&self.schema)
    }

    /// Index of the column with the given name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .fields()
            .iter()
            .position(|field| field.name() == name)
            .ok_or_else(|| SwemapsError::General(format!("Column {name} not found in table")))
    }

    /// Resolve the geometry column.
    ///
    /// An explicit `name` wins. Otherwise the primary column from the GeoParquet metadata is
    /// used, and failing that the only field tagged with a `geoarrow.*` or `ogc.*` extension name.
    pub fn geometry_column_index(&self, name: Option<&str>) -> Result<usize> {
        if let Some(name) = name {
            return self.column_index(name);
        }

        if let Some(geo_meta) = self.geo_metadata()? {
            return self.column_index(&geo_meta.primary_column);
        }

        let mut candidates = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| has_geometry_extension(field));
        match (candidates.next(), candidates.next()) {
            (Some((idx, _)), None) => Ok(idx),
            (Some(_), Some(_)) => Err(SwemapsError::General(
                "Multiple geometry columns found; pass the geometry column name explicitly"
                    .to_string(),
            )),
            (None, _) => Err(SwemapsError::General(
                "No geometry column found in table".to_string(),
            )),
        }
    }

    /// Keep only the rows for which `predicate` returns `true`.
    ///
    /// The predicate is evaluated once per batch and must return a mask of the batch's length.
    /// Nulls in the mask drop the row.
    pub fn filter<F>(&self, mut predicate: F) -> Result<Self>
    where
        F: FnMut(&RecordBatch) -> Result<BooleanArray>,
    {
        let batches = self
            .batches
            .iter()
            .map(|batch| {
                let mask = predicate(batch)?;
                Ok(filter_record_batch(batch, &mask)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(Arc::clone(&self.schema), batches)
    }
}

pub(crate) fn extension_name(field: &Field) -> Option<&str> {
    field
        .metadata()
        .get(EXTENSION_NAME_KEY)
        .map(|name| name.as_str())
}

fn has_geometry_extension(field: &Field) -> bool {
    extension_name(field)
        .map(|name| name.starts_with("geoarrow.") || name.starts_with("ogc."))
        .unwrap_or(false)
}
