//! Tabular export: named columns, one row per observation.
//!
//! The storage layer serializes [`Table`]s; nothing in this crate writes to
//! disk.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::CoreError;

/// A record type with a fixed column layout.
pub trait Tabular {
    fn columns() -> Vec<&'static str>;
    fn row(&self) -> Vec<Value>;
}

/// Column-named rows of JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl Table {
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            row_count: rows.len(),
            rows,
        }
    }

    pub fn from_records<'a, T, I>(records: I) -> Self
    where
        T: Tabular + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let rows = records.into_iter().map(Tabular::row).collect();
        Self::new(T::columns(), rows)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// One JSON object per line, keyed by column name.
    pub fn to_ndjson(&self) -> Result<String, CoreError> {
        let mut output = String::new();
        for row in &self.rows {
            let object: Map<String, Value> = self
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            output.push_str(&serde_json::to_string(&object)?);
            output.push('\n');
        }
        Ok(output)
    }
}

/// JSON number cell; non-finite values become `null`.
pub fn number_cell(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
