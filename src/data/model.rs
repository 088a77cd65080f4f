use std::fmt;

use super::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell, as seen by filters and group keys
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Group keys live in `BTreeMap`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

// -- Manual Eq/Ord so we can use CellValue as a BTreeMap key --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Missing, Missing) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(f) => f.to_bits().hash(state),
            CellValue::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl CellValue {
    /// The value as a string, or `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Column – a named, typed sequence of values
// ---------------------------------------------------------------------------

/// Storage for one column. Missing entries are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn cell(&self, row: usize) -> CellValue {
        match &self.data {
            ColumnData::Text(v) => match v.get(row) {
                Some(Some(s)) => CellValue::Text(s.clone()),
                _ => CellValue::Missing,
            },
            ColumnData::Numeric(v) => match v.get(row) {
                Some(Some(x)) => CellValue::Number(*x),
                _ => CellValue::Missing,
            },
        }
    }

    /// Numeric value at `row`; `None` for text columns and missing cells.
    pub fn number(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v.get(row).copied().flatten(),
            ColumnData::Text(_) => None,
        }
    }

    /// String-cast value at `row`; `None` when missing.
    pub fn text_at(&self, row: usize) -> Option<String> {
        self.cell(row).as_text()
    }

    /// Non-missing numeric values, in row order.
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        let values: &[Option<f64>] = match &self.data {
            ColumnData::Numeric(v) => v,
            ColumnData::Text(_) => &[],
        };
        values.iter().filter_map(|v| *v)
    }

    /// A new column holding only the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
        };
        Column {
            name: self.name.clone(),
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – ordered named columns sharing one row count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Assemble a table, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(LoadError::ShapeMismatch {
                column: bad.name.clone(),
                expected: rows,
                found: bad.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// In-crate access; callers must keep every column at `row_count` entries.
    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Swap in new storage for a column. `Ok(false)` when there is no such
    /// column; `ShapeMismatch` when the length differs from the row count.
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> Result<bool> {
        let rows = self.rows;
        let Some(col) = self.columns.iter_mut().find(|c| c.name == name) else {
            return Ok(false);
        };
        if data.len() != rows {
            return Err(LoadError::ShapeMismatch {
                column: name.to_string(),
                expected: rows,
                found: data.len(),
            });
        }
        col.data = data;
        Ok(true)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// A new table holding only the given rows; every column is kept.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }
}
