//! Column-oriented table container and builder.
//!
//! A [`Table`] is the in-memory form of the agricultural dataset: a list of
//! named columns of equal length, each either numeric or categorical. By
//! convention the last column is the target.

use std::collections::HashSet;

/// Errors raised when constructing or slicing a [`Table`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("column `{name}` has {got} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),

    #[error("row index {index} out of bounds for a table with {n_rows} rows")]
    RowOutOfBounds { index: usize, n_rows: usize },
}

// =============================================================================
// Column
// =============================================================================

/// Values of a single column.
///
/// Missing numeric values are `f64::NAN`; missing categories are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if this is a categorical column.
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnData::Categorical(_))
    }

    /// Number of missing values.
    pub fn n_missing(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_nan()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Gather the given rows into a new column.
    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Create a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Create a categorical column from present values.
    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric values, or `None` for a categorical column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Category values, or `None` for a numeric column.
    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Categorical(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Immutable column table.
///
/// # Example
///
/// ```
/// use paddy::data::Table;
///
/// let table = Table::builder()
///     .categorical("State", vec!["Punjab", "Punjab"])
///     .numeric("Rainfall", vec![1200.0, 1100.0])
///     .numeric("Yield", vec![3.1, 2.9])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.n_rows(), 2);
/// assert_eq!(table.target().unwrap().name(), "Yield");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table from columns.
    ///
    /// # Errors
    ///
    /// [`TableError::LengthMismatch`] if the columns differ in length,
    /// [`TableError::DuplicateColumn`] if two columns share a name.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != n_rows {
                return Err(TableError::LengthMismatch {
                    name: column.name.clone(),
                    expected: n_rows,
                    got: column.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// An empty table (no columns, no rows).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The target column (last column), if any.
    pub fn target(&self) -> Option<&Column> {
        self.columns.last()
    }

    /// All columns except the target.
    pub fn feature_columns(&self) -> &[Column] {
        match self.columns.len() {
            0 => &[],
            n => &self.columns[..n - 1],
        }
    }

    // =========================================================================
    // Row selection
    // =========================================================================

    /// New table holding only `rows`, in the given order.
    ///
    /// # Errors
    ///
    /// [`TableError::RowOutOfBounds`] if any index is past the end.
    pub fn take_rows(&self, rows: &[usize]) -> Result<Table, TableError> {
        if let Some(&index) = rows.iter().find(|&&r| r >= self.n_rows) {
            return Err(TableError::RowOutOfBounds {
                index,
                n_rows: self.n_rows,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
            .collect();
        Ok(Table {
            columns,
            n_rows: rows.len(),
        })
    }
}

// =============================================================================
// TableBuilder
// =============================================================================

/// Incremental [`Table`] construction; validation happens in [`build`](Self::build).
#[derive(Debug, Default, Clone)]
pub struct TableBuilder {
    columns: Vec<Column>,
}

impl TableBuilder {
    pub fn numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push(Column::numeric(name, values));
        self
    }

    pub fn categorical<S: Into<String>>(mut self, name: impl Into<String>, values: Vec<S>) -> Self {
        self.columns.push(Column::categorical(name, values));
        self
    }

    /// Categorical column with explicit missing values.
    pub fn categorical_opt(mut self, name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        self.columns
            .push(Column::new(name, ColumnData::Categorical(values)));
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn build(self) -> Result<Table, TableError> {
        Table::new(self.columns)
    }
}
