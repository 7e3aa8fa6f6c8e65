use parquet::arrow::arrow_reader::ArrowReaderBuilder;

/// Options for reading GeoParquet into a [`GeoTable`][crate::GeoTable]
#[derive(Clone, Debug, Default)]
pub struct GeoParquetReaderOptions {
    /// The number of rows in each batch. If not provided, the upstream [parquet] default is 1024.
    batch_size: Option<usize>,

    row_groups: Option<Vec<usize>>,

    /// See [parquet::arrow::arrow_reader::ArrowReaderBuilder::with_limit]
    limit: Option<usize>,

    /// See [parquet::arrow::arrow_reader::ArrowReaderBuilder::with_offset]
    offset: Option<usize>,
}

impl GeoParquetReaderOptions {
    /// Set the size of [RecordBatch][arrow_array::RecordBatch] to produce.
    ///
    /// Defaults to 1024. If the batch_size more than the file row count, use the file row count.
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self {
            batch_size: Some(batch_size),
            ..self
        }
    }

    /// Only read data from the provided row group indexes
    pub fn with_row_groups(self, row_groups: Vec<usize>) -> Self {
        Self {
            row_groups: Some(row_groups),
            ..self
        }
    }

    /// Provide a limit to the number of rows to be read
    pub fn with_limit(self, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    /// Provide an offset to skip over the given number of rows
    pub fn with_offset(self, offset: usize) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    /// Apply these settings to an [ArrowReaderBuilder]
    pub(crate) fn apply_to_builder<T>(
        self,
        mut builder: ArrowReaderBuilder<T>,
    ) -> ArrowReaderBuilder<T> {
        if let Some(batch_size) = self.batch_size {
            builder = builder.with_batch_size(batch_size);
        }

        if let Some(row_groups) = self.row_groups {
            builder = builder.with_row_groups(row_groups);
        }

        if let Some(limit) = self.limit {
            builder = builder.with_limit(limit);
        }

        if let Some(offset) = self.offset {
            builder = builder.with_offset(offset);
        }

        builder
    }
}
