//! Parquet dataset loader.
//!
//! Reads Parquet into Arrow record batches and reuses the shared conversion.

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::DatasetLoadError;
use crate::data::Table;

/// Load a Parquet file into a [`Table`].
pub fn load_parquet(path: impl AsRef<Path>) -> Result<Table, DatasetLoadError> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    super::record_batches::batches_to_table(&schema, &batches?)
}
