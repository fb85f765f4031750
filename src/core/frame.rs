//! Column-oriented result tables
//!
//! Every tabular command converts its API payload into a [`DataFrame`] and
//! then projects, filters and sorts it before rendering. Cells are typed per
//! column and may be null.

use crate::error::ValidationError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Placeholder printed for null cells
pub const NULL_CELL: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Str(Vec<Option<String>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Str(cells) => cells.len(),
            Column::Int(cells) => cells.len(),
            Column::Float(cells) => cells.len(),
            Column::Bool(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Column::Str(cells) => cells[row].is_none(),
            Column::Int(cells) => cells[row].is_none(),
            Column::Float(cells) => cells[row].is_none(),
            Column::Bool(cells) => cells[row].is_none(),
        }
    }

    /// Printed representation of a cell; `None` for null.
    pub fn cell_string(&self, row: usize) -> Option<String> {
        match self {
            Column::Str(cells) => cells[row].clone(),
            Column::Int(cells) => cells[row].map(|v| v.to_string()),
            Column::Float(cells) => cells[row].map(|v| v.to_string()),
            Column::Bool(cells) => cells[row].map(|v| v.to_string()),
        }
    }

    fn cell_json(&self, row: usize) -> Value {
        match self {
            Column::Str(cells) => cells[row].clone().map_or(Value::Null, Value::String),
            Column::Int(cells) => cells[row].map_or(Value::Null, Value::from),
            Column::Float(cells) => cells[row].map_or(Value::Null, Value::from),
            Column::Bool(cells) => cells[row].map_or(Value::Null, Value::Bool),
        }
    }

    /// Compares two non-null cells of this column.
    fn compare(&self, a: usize, b: usize) -> Ordering {
        match self {
            Column::Str(cells) => cells[a].cmp(&cells[b]),
            Column::Int(cells) => cells[a].cmp(&cells[b]),
            Column::Float(cells) => cells[a]
                .partial_cmp(&cells[b])
                .unwrap_or(Ordering::Equal),
            Column::Bool(cells) => cells[a].cmp(&cells[b]),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Str(cells) => Column::Str(rows.iter().map(|&i| cells[i].clone()).collect()),
            Column::Int(cells) => Column::Int(rows.iter().map(|&i| cells[i]).collect()),
            Column::Float(cells) => Column::Float(rows.iter().map(|&i| cells[i]).collect()),
            Column::Bool(cells) => Column::Bool(rows.iter().map(|&i| cells[i]).collect()),
        }
    }
}

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: HashMap<String, Column>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, ValidationError> {
        self.add_column(name, column)?;
        Ok(self)
    }

    pub fn add_column(&mut self, name: &str, column: Column) -> Result<(), ValidationError> {
        if self.columns.contains_key(name) {
            return Err(ValidationError::Other(format!(
                "column '{}' is defined more than once",
                name
            )));
        }
        if !self.names.is_empty() && column.len() != self.nrows() {
            return Err(ValidationError::Other(format!(
                "column '{}' has {} rows, expected {}",
                name,
                column.len(),
                self.nrows()
            )));
        }
        self.names.push(name.to_string());
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    /// Swap the cells of an existing column, keeping its position.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<(), ValidationError> {
        if !self.columns.contains_key(name) {
            return Err(self.unknown_column("column", name));
        }
        if column.len() != self.nrows() {
            return Err(ValidationError::Other(format!(
                "column '{}' has {} rows, expected {}",
                name,
                column.len(),
                self.nrows()
            )));
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn nrows(&self) -> usize {
        self.names
            .first()
            .and_then(|name| self.columns.get(name))
            .map_or(0, Column::len)
    }

    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    /// Keep exactly `names`, in that order.
    pub fn select(&self, names: &[&str]) -> Result<DataFrame, ValidationError> {
        let mut projected = DataFrame::new();
        for name in names {
            let column = self.columns.get(*name).ok_or_else(|| self.unknown_column("format", name))?;
            projected.add_column(name, column.clone())?;
        }
        Ok(projected)
    }

    /// Keep the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> DataFrame
    where
        F: FnMut(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.nrows()).filter(|&row| keep(row)).collect();
        self.take_rows(&rows)
    }

    /// Stable sort on `column` (case-folded). Nulls go last when ascending and
    /// first when `reverse` is set.
    pub fn sort(&self, column: &str, reverse: bool) -> Result<DataFrame, ValidationError> {
        let key = column.to_lowercase();
        let sort_column = self
            .columns
            .get(&key)
            .ok_or_else(|| self.unknown_column("sort", &key))?;

        let mut rows: Vec<usize> = (0..self.nrows()).collect();
        rows.sort_by(|&a, &b| {
            let ascending = match (sort_column.is_null(a), sort_column.is_null(b)) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => sort_column.compare(a, b),
            };
            if reverse {
                ascending.reverse()
            } else {
                ascending
            }
        });
        Ok(self.take_rows(&rows))
    }

    /// Rows of printed cells, nulls as `-`; headers are not included.
    pub fn stringify(&self) -> Vec<Vec<String>> {
        (0..self.nrows())
            .map(|row| {
                self.names
                    .iter()
                    .map(|name| {
                        self.columns[name]
                            .cell_string(row)
                            .unwrap_or_else(|| NULL_CELL.to_string())
                    })
                    .collect()
            })
            .collect()
    }

    /// Upper-cased column names for table headers.
    pub fn header(&self) -> Vec<String> {
        self.names.iter().map(|name| name.to_uppercase()).collect()
    }

    /// One JSON object per row, nulls preserved.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.nrows())
            .map(|row| {
                let mut record = Map::new();
                for name in &self.names {
                    record.insert(name.clone(), self.columns[name].cell_json(row));
                }
                Value::Object(record)
            })
            .collect()
    }

    fn take_rows(&self, rows: &[usize]) -> DataFrame {
        DataFrame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take(rows)))
                .collect(),
        }
    }

    fn unknown_column(&self, option: &str, column: &str) -> ValidationError {
        ValidationError::UnknownColumn {
            option: option.to_string(),
            column: column.to_string(),
            available: self.names.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataFrame {
        DataFrame::new()
            .with_column(
                "name",
                Column::Str(vec![
                    Some("b".to_string()),
                    Some("a".to_string()),
                    None,
                    Some("c".to_string()),
                ]),
            )
            .and_then(|df| df.with_column("size", Column::Int(vec![Some(20), None, Some(5), Some(20)])))
            .and_then(|df| {
                df.with_column(
                    "ratio",
                    Column::Float(vec![Some(0.5), Some(1.25), None, Some(2.0)]),
                )
            })
            .and_then(|df| {
                df.with_column("ok", Column::Bool(vec![Some(true), Some(false), None, None]))
            })
            .expect("sample frame")
    }

    #[test]
    fn test_invariants() {
        let df = sample();
        assert_eq!(df.nrows(), 4);
        assert_eq!(df.ncols(), 4);

        let short = df.clone().with_column("extra", Column::Int(vec![Some(1)]));
        assert!(short.is_err());

        let duplicate = df.with_column("name", Column::Int(vec![None; 4]));
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_stringify_replaces_nulls() {
        let rows = sample().stringify();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.len() == 4));
        assert_eq!(rows[0], vec!["b", "20", "0.5", "true"]);
        assert_eq!(rows[1], vec!["a", "-", "1.25", "false"]);
        assert_eq!(rows[2], vec!["-", "5", "-", "-"]);
        assert_eq!(rows[3], vec!["c", "20", "2", "-"]);
    }

    #[test]
    fn test_sort_ascending_nulls_last() {
        let sorted = sample().sort("NAME", false).unwrap();
        let names: Vec<String> = sorted.stringify().into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(names, vec!["a", "b", "c", "-"]);
    }

    #[test]
    fn test_sort_descending_nulls_first() {
        let sorted = sample().sort("size", true).unwrap();
        let sizes: Vec<String> = sorted.stringify().into_iter().map(|r| r[1].clone()).collect();
        assert_eq!(sizes, vec!["-", "20", "20", "5"]);
    }

    #[test]
    fn test_sort_is_stable_and_ordered() {
        let sorted = sample().sort("size", false).unwrap();
        let rows = sorted.stringify();
        // the two rows with size 20 keep their original relative order
        assert_eq!(rows[1][0], "b");
        assert_eq!(rows[2][0], "c");

        if let Some(Column::Int(cells)) = sorted.column("size") {
            let values: Vec<i64> = cells.iter().flatten().copied().collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
        } else {
            panic!("size column missing");
        }
    }

    #[test]
    fn test_sort_unknown_column() {
        let err = sample().sort("created", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'sort column': 'created' is not part of 'name, size, ratio, ok'"
        );
    }

    #[test]
    fn test_select_and_filter() {
        let df = sample().select(&["size", "name"]).unwrap();
        assert_eq!(df.names(), &["size".to_string(), "name".to_string()]);
        assert_eq!(df.header(), vec!["SIZE", "NAME"]);

        let size = df.column("size").cloned().unwrap();
        let filtered = df.filter_rows(|row| size.cell_string(row).as_deref() == Some("20"));
        assert_eq!(filtered.nrows(), 2);

        assert!(sample().select(&["missing"]).is_err());
    }

    #[test]
    fn test_replace_column() {
        let mut df = sample();
        df.replace_column("size", Column::Str(vec![None; 4])).unwrap();
        assert_eq!(df.names()[1], "size");
        assert_eq!(df.stringify()[0], vec!["b", "-", "0.5", "true"]);

        assert!(df.replace_column("size", Column::Int(vec![Some(1)])).is_err());
        assert!(df.replace_column("missing", Column::Int(vec![None; 4])).is_err());
    }

    #[test]
    fn test_to_records() {
        let records = sample().select(&["name", "size"]).unwrap().to_records();
        assert_eq!(records[0], json!({"name": "b", "size": 20}));
        assert_eq!(records[1], json!({"name": "a", "size": null}));
    }

    #[test]
    fn test_to_records_keep_column_order() {
        let records = sample().select(&["size", "ratio", "name"]).unwrap().to_records();
        assert_eq!(
            serde_json::to_string(&records[0]).unwrap(),
            r#"{"size":20,"ratio":0.5,"name":"b"}"#
        );
    }

    #[test]
    fn test_empty_frame() {
        let df = DataFrame::new();
        assert_eq!(df.nrows(), 0);
        assert!(df.stringify().is_empty());
        assert!(df.to_records().is_empty());
    }
}
