//! Shared Arrow `RecordBatch` conversion logic.
//!
//! Used by the CSV, Arrow IPC and Parquet loaders. String-like columns become
//! categorical, numeric and boolean columns become `f64`; nulls become missing.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::error::DatasetLoadError;
use crate::data::{Column, ColumnData, Table};

/// How an Arrow field maps onto a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Categorical,
}

fn column_kind(field: &Field) -> ColumnKind {
    match field.data_type() {
        DataType::Boolean | DataType::Null => ColumnKind::Numeric,
        t if t.is_numeric() => ColumnKind::Numeric,
        // Strings, dictionaries, dates and anything else castable to text.
        _ => ColumnKind::Categorical,
    }
}

/// Convert record batches into a [`Table`], keeping schema column order.
pub(super) fn batches_to_table(
    schema: &Arc<Schema>,
    batches: &[RecordBatch],
) -> Result<Table, DatasetLoadError> {
    let n_rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    let mut columns = Vec::with_capacity(schema.fields().len());

    for (idx, field) in schema.fields().iter().enumerate() {
        let data = match column_kind(field) {
            ColumnKind::Numeric => {
                let mut values = Vec::with_capacity(n_rows);
                for batch in batches {
                    let arr = cast_column(batch.column(idx), field, &DataType::Float64)?;
                    let arr = downcast::<Float64Array>(&arr, field)?;
                    values.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
                }
                ColumnData::Numeric(values)
            }
            ColumnKind::Categorical => {
                let mut values = Vec::with_capacity(n_rows);
                for batch in batches {
                    let arr = cast_column(batch.column(idx), field, &DataType::Utf8)?;
                    let arr = downcast::<StringArray>(&arr, field)?;
                    values.extend(arr.iter().map(|v| v.map(str::to_string)));
                }
                ColumnData::Categorical(values)
            }
        };
        columns.push(Column::new(field.name().clone(), data));
    }

    Ok(Table::new(columns)?)
}

fn cast_column(
    array: &ArrayRef,
    field: &Field,
    to: &DataType,
) -> Result<ArrayRef, DatasetLoadError> {
    if array.data_type() == to {
        return Ok(Arc::clone(array));
    }
    cast(array.as_ref(), to).map_err(|_| DatasetLoadError::UnsupportedType {
        column: field.name().clone(),
        got: format!("{:?}", field.data_type()),
    })
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, field: &Field) -> Result<&'a T, DatasetLoadError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DatasetLoadError::UnsupportedType {
            column: field.name().clone(),
            got: format!("{:?}", array.data_type()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array};

    #[test]
    fn converts_mixed_batches() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, true),
            Field::new("Year", DataType::Int64, true),
            Field::new("Irrigated", DataType::Boolean, true),
            Field::new("Yield", DataType::Float64, true),
        ]));
        let batch = |states: Vec<Option<&str>>, years: Vec<Option<i64>>, irr: Vec<bool>, y: Vec<f64>| {
            RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(states)) as ArrayRef,
                    Arc::new(Int64Array::from(years)) as ArrayRef,
                    Arc::new(BooleanArray::from(irr)) as ArrayRef,
                    Arc::new(Float64Array::from(y)) as ArrayRef,
                ],
            )
            .unwrap()
        };
        let batches = vec![
            batch(vec![Some("Punjab")], vec![Some(2019)], vec![true], vec![3.1]),
            batch(vec![None], vec![None], vec![false], vec![2.5]),
        ];

        let table = batches_to_table(&schema, &batches).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_names(), vec!["State", "Year", "Irrigated", "Yield"]);
        assert_eq!(
            table.column("State").unwrap().as_categorical().unwrap(),
            &[Some("Punjab".to_string()), None]
        );
        let years = table.column("Year").unwrap().as_numeric().unwrap();
        assert_eq!(years[0], 2019.0);
        assert!(years[1].is_nan());
        assert_eq!(table.column("Irrigated").unwrap().as_numeric().unwrap(), &[1.0, 0.0]);
    }
}
