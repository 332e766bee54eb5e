//! Tabular data: the in-memory table, loaders, encoding and summaries.
//!
//! # Overview
//!
//! - [`Table`]: named columns of equal length, numeric (`f64`) or categorical
//!   (`Option<String>`). The last column is the target.
//! - [`io`]: CSV / Arrow IPC / Parquet loaders and the [`DatasetLoader`] seam.
//! - [`OneHotEncoder`]: categorical columns to indicator columns.
//! - [`TableSummary`]: record counts, distinct labels, missing values.
//!
//! # Missing Values
//!
//! Numeric missing values are `f64::NAN`; categorical ones are `None`.

mod encode;
pub mod io;
mod summary;
mod table;

pub use encode::{EncodeError, OneHotEncoder};
pub use io::{DatasetLoadError, DatasetLoader, FileLoader, NoDataset};
pub use summary::{MissingCount, TableSummary};
pub use table::{Column, ColumnData, Table, TableBuilder, TableError};
