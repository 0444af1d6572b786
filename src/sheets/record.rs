// src/sheets/record.rs
//! Record mapper: header-relative rows <-> named fields.
//!
//! A header row names the columns of a tab. A [`Record`] pairs each header name
//! with the cell in the same position and remembers which physical row it was
//! read from, so the row can later be rewritten in place.

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{SheetError, SheetResult};

/// Key under which the physical row number is exposed when a record is serialized.
pub const ROW_INDEX_KEY: &str = "_rowIndex";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
    row_index: Option<usize>,
}

/// Outcome of a lookup that completed without a transport or auth failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Record),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<Record> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::NotFound => None,
        }
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `row` through `header`. Cells missing from a short row become the
    /// empty string; cells beyond the header are ignored. A repeated header name
    /// keeps the value of its last occurrence.
    pub fn from_row(header: &[String], row: &[String], row_index: Option<usize>) -> Self {
        let mut record = Self { fields: Vec::with_capacity(header.len()), row_index };
        for (i, name) in header.iter().enumerate() {
            let cell = row.get(i).cloned().unwrap_or_default();
            record.set(name, cell);
        }
        record
    }

    /// Builds a record from any struct that serializes to a flat JSON object.
    /// Nulls become empty strings, other scalars their JSON text.
    pub fn from_serialize<T: Serialize>(value: &T) -> SheetResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => {
                let mut record = Self::new();
                for (key, v) in map {
                    record.set(&key, cell_text(&v));
                }
                Ok(record)
            }
            other => Err(SheetError::Config(format!(
                "record source must serialize to an object, got {}",
                other
            ))),
        }
    }

    /// Deserializes the named fields into `T`. The row index is not part of the input.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SheetResult<T> {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, or the empty string when absent.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn row_index(&self) -> Option<usize> {
        self.row_index
    }

    pub fn with_row_index(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Projects the record onto `header`: one cell per header column, empty for
    /// fields the record lacks. Fields without a header column are dropped.
    pub fn to_row(&self, header: &[String]) -> Vec<String> {
        header.iter().map(|name| self.value(name).to_string()).collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.row_index.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        if let Some(row) = self.row_index {
            map.serialize_entry(ROW_INDEX_KEY, &row)?;
        }
        map.end()
    }
}

/// Position of `column` in the header row, first match wins.
pub fn header_position(header: &[String], column: &str) -> Option<usize> {
    header.iter().position(|h| h == column)
}

/// Linear scan of a fetched tab (header row first) for the first data row whose
/// `column` cell equals `value` exactly.
pub fn find_first(grid: &[Vec<String>], column: &str, value: &str) -> Lookup {
    let Some((header, rows)) = grid.split_first() else {
        return Lookup::NotFound;
    };
    let Some(col) = header_position(header, column) else {
        return Lookup::NotFound;
    };
    rows.iter()
        .enumerate()
        .find(|(_, row)| row.get(col).map(String::as_str).unwrap_or("") == value)
        .map(|(i, row)| Lookup::Found(Record::from_row(header, row, Some(i + 2))))
        .unwrap_or(Lookup::NotFound)
}

/// Maps every data row of a fetched tab. Row indices start at 2.
pub fn map_rows(grid: &[Vec<String>]) -> Vec<Record> {
    let Some((header, rows)) = grid.split_first() else {
        return Vec::new();
    };
    rows.iter()
        .enumerate()
        .map(|(i, row)| Record::from_row(header, row, Some(i + 2)))
        .collect()
}

pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
