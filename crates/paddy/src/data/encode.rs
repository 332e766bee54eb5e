//! One-hot feature encoding.
//!
//! [`OneHotEncoder`] turns the feature columns of a [`Table`] into a dense
//! sample-major matrix. The layout follows the familiar "dummies" convention:
//!
//! 1. numeric columns first, unchanged, in their original order;
//! 2. then, for each categorical column in order, one `0/1` indicator per
//!    distinct category observed at fit time, categories sorted
//!    lexicographically, named `{column}_{category}`.
//!
//! A missing category encodes as all zeros, as does a category that was not
//! seen at fit time. Numeric missing values stay `NaN`.

use std::collections::BTreeSet;

use ndarray::Array2;

use super::table::{Column, ColumnData, Table};

/// Errors raised when applying a fitted encoder to a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("input column `{0}` is missing")]
    MissingColumn(String),

    #[error("input column `{column}` was {expected} at fit time")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },
}

/// Where an encoded column takes its values from.
#[derive(Debug, Clone, PartialEq)]
enum Source {
    /// Numeric pass-through of the named input column.
    Numeric { column: String },
    /// Indicator of `column == category`.
    Indicator { column: String, category: String },
}

/// A fitted one-hot encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    names: Vec<String>,
    sources: Vec<Source>,
}

impl OneHotEncoder {
    /// Fit on the given feature columns.
    pub fn fit(columns: &[Column]) -> Self {
        let mut numeric = Vec::new();
        let mut indicators = Vec::new();

        for column in columns {
            match column.data() {
                ColumnData::Numeric(_) => numeric.push((
                    column.name().to_string(),
                    Source::Numeric {
                        column: column.name().to_string(),
                    },
                )),
                ColumnData::Categorical(values) => {
                    let categories: BTreeSet<&str> =
                        values.iter().flatten().map(String::as_str).collect();
                    for category in categories {
                        indicators.push((
                            format!("{}_{}", column.name(), category),
                            Source::Indicator {
                                column: column.name().to_string(),
                                category: category.to_string(),
                            },
                        ));
                    }
                }
            }
        }

        let (names, sources) = numeric.into_iter().chain(indicators).unzip();
        Self { names, sources }
    }

    /// Encoded column names, in matrix column order.
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Number of encoded columns.
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Encode `table` into a `[n_rows, n_features]` matrix.
    ///
    /// Input columns are looked up by name, so extra columns (such as the
    /// target) are ignored.
    ///
    /// # Errors
    ///
    /// [`EncodeError::MissingColumn`] if an input column is absent and
    /// [`EncodeError::TypeMismatch`] if its kind changed since fitting.
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>, EncodeError> {
        let n_rows = table.n_rows();
        let mut out = Array2::<f64>::zeros((n_rows, self.n_features()));

        for (j, source) in self.sources.iter().enumerate() {
            let mut col = out.column_mut(j);
            match source {
                Source::Numeric { column } => {
                    let values = lookup(table, column)?.as_numeric().ok_or_else(|| {
                        EncodeError::TypeMismatch {
                            column: column.clone(),
                            expected: "numeric",
                        }
                    })?;
                    for (dst, &v) in col.iter_mut().zip(values) {
                        *dst = v;
                    }
                }
                Source::Indicator { column, category } => {
                    let values = lookup(table, column)?.as_categorical().ok_or_else(|| {
                        EncodeError::TypeMismatch {
                            column: column.clone(),
                            expected: "categorical",
                        }
                    })?;
                    for (dst, v) in col.iter_mut().zip(values) {
                        if v.as_deref() == Some(category.as_str()) {
                            *dst = 1.0;
                        }
                    }
                }
            }
        }

        Ok(out)
    }

    /// Fit on the feature columns of `table` and encode it in one step.
    pub fn fit_transform(table: &Table) -> Result<(Self, Array2<f64>), EncodeError> {
        let encoder = Self::fit(table.feature_columns());
        let matrix = encoder.transform(table)?;
        Ok((encoder, matrix))
    }
}

fn lookup<'a>(table: &'a Table, name: &str) -> Result<&'a Column, EncodeError> {
    table
        .column(name)
        .ok_or_else(|| EncodeError::MissingColumn(name.to_string()))
}
