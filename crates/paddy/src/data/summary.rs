//! Dataset overview report.

use std::collections::BTreeSet;

use serde::Serialize;

use super::table::{ColumnData, Table};

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Shape, columns, distinct segment labels and missing values of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub total_records: usize,
    pub columns: Vec<String>,
    /// Sorted distinct regions; empty if the region column is absent or numeric.
    pub regions: Vec<String>,
    /// Sorted distinct soil types; empty if the soil column is absent or numeric.
    pub soil_types: Vec<String>,
    /// `(rows, columns)`.
    pub shape: (usize, usize),
    pub missing_values: Vec<MissingCount>,
}

impl Table {
    /// Summarise the table, reading segment labels from the given columns.
    pub fn summary(&self, region_column: &str, soil_column: &str) -> TableSummary {
        TableSummary {
            total_records: self.n_rows(),
            columns: self.column_names().into_iter().map(str::to_string).collect(),
            regions: self.distinct_labels(region_column),
            soil_types: self.distinct_labels(soil_column),
            shape: (self.n_rows(), self.n_columns()),
            missing_values: self
                .columns()
                .iter()
                .map(|c| MissingCount {
                    column: c.name().to_string(),
                    missing: c.data().n_missing(),
                })
                .collect(),
        }
    }

    fn distinct_labels(&self, column: &str) -> Vec<String> {
        match self.column(column).map(|c| c.data()) {
            Some(ColumnData::Categorical(values)) => values
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}
