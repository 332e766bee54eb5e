//! Dataset loaders.
//!
//! Every loader reads Arrow record batches and converts them with the shared
//! logic in `record_batches`, so column semantics are the same regardless of
//! the file format:
//!
//! - `.csv` (header row, schema inferred from the first rows)
//! - `.arrow` / `.ipc` / `.feather` (Arrow IPC file)
//! - `.parquet` (feature `io-parquet`)
//!
//! [`DatasetLoader`] is the seam the service loads through; [`FileLoader`]
//! implements it for paths and any `Fn() -> Result<Table, _>` closure does too.

mod error;
mod record_batches;

#[cfg(feature = "io-parquet")]
pub mod parquet;

use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;

pub use error::DatasetLoadError;

use crate::data::Table;

/// Rows sampled for CSV schema inference.
const CSV_INFER_ROWS: usize = 1000;

// =============================================================================
// DatasetLoader
// =============================================================================

/// Source of the dataset table.
pub trait DatasetLoader: Send + Sync {
    fn load(&self) -> Result<Table, DatasetLoadError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "custom loader".to_string()
    }
}

impl<F> DatasetLoader for F
where
    F: Fn() -> Result<Table, DatasetLoadError> + Send + Sync,
{
    fn load(&self) -> Result<Table, DatasetLoadError> {
        self()
    }
}

/// Loads a table from a file, choosing the reader by extension.
#[derive(Debug, Clone)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetLoader for FileLoader {
    fn load(&self) -> Result<Table, DatasetLoadError> {
        load_table(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Loader used when no dataset is configured; always fails with
/// [`DatasetLoadError::NoSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDataset;

impl DatasetLoader for NoDataset {
    fn load(&self) -> Result<Table, DatasetLoadError> {
        Err(DatasetLoadError::NoSource)
    }

    fn describe(&self) -> String {
        "<none>".to_string()
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Load a table from `path`, dispatching on the file extension.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table, DatasetLoadError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("csv") => load_csv(path),
        Some("arrow" | "ipc" | "feather") => load_ipc(path),
        #[cfg(feature = "io-parquet")]
        Some("parquet") => parquet::load_parquet(path),
        _ => Err(DatasetLoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a CSV file with a header row.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table, DatasetLoadError> {
    let mut file = File::open(path.as_ref())?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(BufReader::new(&mut file), Some(CSV_INFER_ROWS))?;
    file.rewind()?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(BufReader::new(file))?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    record_batches::batches_to_table(&schema, &batches?)
}

/// Load an Arrow IPC file.
pub fn load_ipc(path: impl AsRef<Path>) -> Result<Table, DatasetLoadError> {
    let file = File::open(path.as_ref())?;
    let reader = FileReader::try_new(BufReader::new(file), None)?;
    let schema = reader.schema();
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    record_batches::batches_to_table(&schema, &batches?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn csv_infers_categorical_and_numeric_columns() {
        let file = write_csv(
            "State,Soil,Rainfall,Yield\n\
             Punjab,Loam,1200,3.1\n\
             Punjab,Loam,,2.9\n\
             Kerala,Clay,3000,2.2\n",
        );
        let table = load_table(file.path()).unwrap();

        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column_names(), vec!["State", "Soil", "Rainfall", "Yield"]);
        assert!(table.column("State").unwrap().data().is_categorical());
        let rainfall = table.column("Rainfall").unwrap().as_numeric().unwrap();
        assert_eq!(rainfall[0], 1200.0);
        assert!(rainfall[1].is_nan());
        assert_eq!(table.target().unwrap().as_numeric().unwrap(), &[3.1, 2.9, 2.2]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_table("crops.xlsx").unwrap_err();
        assert!(matches!(err, DatasetLoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_table("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DatasetLoadError::Io(_)));
    }

    #[test]
    fn closures_are_loaders() {
        let loader = || -> Result<Table, DatasetLoadError> {
            Ok(Table::builder().numeric("Yield", vec![1.0]).build()?)
        };
        assert_eq!(DatasetLoader::load(&loader).unwrap().n_rows(), 1);
        assert!(matches!(NoDataset.load(), Err(DatasetLoadError::NoSource)));
    }
}
