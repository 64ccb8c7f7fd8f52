use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One data row as exposed to callers: column name -> string value.
///
/// A row materialized from a table always carries exactly the header's column
/// set; cells the grid left blank (or short rows) normalize to `""`, never to
/// an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row by zipping header columns against one grid row, padding
    /// missing trailing cells with empty strings.
    pub fn from_header(header: &[String], cells: &[String]) -> Self {
        let mut fields = HashMap::with_capacity(header.len());
        for (i, column) in header.iter().enumerate() {
            let value = cells.get(i).cloned().unwrap_or_default();
            fields.insert(column.clone(), value);
        }
        Self { fields }
    }

    /// Value for `column`, or `""` when the row has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values in the order of the supplied header, for writing back to the grid.
    pub fn to_ordered_values(&self, header: &[String]) -> Vec<String> {
        header.iter().map(|c| self.get(c).to_string()).collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl From<Row> for HashMap<String, String> {
    fn from(row: Row) -> Self {
        row.fields
    }
}

impl From<HashMap<String, String>> for Row {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row({} columns)", self.fields.len())
    }
}
