//!
//! Row sets returned by the driver, addressable by column name.
//!
use crate::errors::{Result, StoreError};
use crate::value::{FromValue, Value};

/// The result rows of one executed statement.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    columns: Vec<String>,
    records: Vec<Vec<Value>>,
}

impl Rows {
    pub fn new(columns: Vec<String>) -> Self {
        Rows {
            columns,
            records: vec![],
        }
    }

    pub fn push(&mut self, record: Vec<Value>) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// One row borrowed out of a [`Rows`] result set.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get_value(column)?)
    }

    pub fn get_value(&self, column: &str) -> Result<&'a Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| StoreError::DataError(format!("no such column `{}`", column)))?;
        self.values
            .get(idx)
            .ok_or_else(|| StoreError::DataError(format!("no value for column `{}`", column)))
    }

    /// First value of the row, for scalar projections.
    pub fn first<T: FromValue>(&self) -> Result<T> {
        let value = self
            .values
            .first()
            .ok_or_else(|| StoreError::DataError("empty row".to_string()))?;
        T::from_value(value)
    }
}
