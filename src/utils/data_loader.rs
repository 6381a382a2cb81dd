//! Message corpus loading from SQLite
//!
//! The whole table is read into a polars [`DataFrame`] and then split into
//! the message text, the label matrix and the category names.

use crate::error::{Result, TriageError};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Columns before this position are message metadata (id, message, original, genre).
pub const LABEL_OFFSET: usize = 4;

/// Where messages live and which columns hold the labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Table holding the labeled messages
    pub table: String,
    /// Column with the message text
    pub text_column: String,
    /// First label column (None = column at [`LABEL_OFFSET`])
    pub first_label: Option<String>,
    /// Last label column, inclusive (None = last column of the table)
    pub last_label: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            table: "message_table".to_string(),
            text_column: "message".to_string(),
            first_label: Some("related".to_string()),
            last_label: Some("direct_report".to_string()),
        }
    }
}

impl LoaderConfig {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_text_column(mut self, column: impl Into<String>) -> Self {
        self.text_column = column.into();
        self
    }

    /// Select label columns by name, inclusive on both ends
    pub fn with_label_range(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_label = Some(first.into());
        self.last_label = Some(last.into());
        self
    }

    /// Treat every column from [`LABEL_OFFSET`] onward as a label
    pub fn with_positional_labels(mut self) -> Self {
        self.first_label = None;
        self.last_label = None;
        self
    }

    /// True while the label range is still `related`..`direct_report`
    pub fn uses_default_label_range(&self) -> bool {
        let default = Self::default();
        self.first_label == default.first_label && self.last_label == default.last_label
    }
}

/// Labeled messages in table order
#[derive(Debug, Clone)]
pub struct MessageCorpus {
    /// Message text, one entry per row
    pub messages: Vec<String>,
    /// Binary (or small-integer) labels, rows × categories
    pub labels: Array2<f64>,
    /// Label column names, same order as the label matrix columns
    pub category_names: Vec<String>,
}

impl MessageCorpus {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn n_categories(&self) -> usize {
        self.category_names.len()
    }

    /// Copy out the given rows, in the given order
    pub fn select(&self, indices: &[usize]) -> MessageCorpus {
        MessageCorpus {
            messages: indices.iter().map(|&i| self.messages[i].clone()).collect(),
            labels: self.labels.select(Axis(0), indices),
            category_names: self.category_names.clone(),
        }
    }
}

/// Reads the labeled message table
#[derive(Debug, Clone, Default)]
pub struct MessageLoader {
    config: LoaderConfig,
}

impl MessageLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load the corpus from a database file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<MessageCorpus> {
        let df = self.load_frame(path)?;
        self.corpus_from_frame(&df)
    }

    /// Read the configured table in full. The database is opened read-only,
    /// so a missing file is an error rather than a fresh empty database.
    pub fn load_frame(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let sql = format!("SELECT * FROM {}", quote_identifier(&self.config.table));
        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let n_cols = column_names.len();

        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); n_cols];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (col_idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get::<_, Value>(col_idx)?);
            }
        }

        let columns: Vec<Column> = column_names
            .iter()
            .zip(cells)
            .map(|(name, values)| values_to_series(name, values).into())
            .collect();

        let df = DataFrame::new(columns)?;

        info!(
            table = %self.config.table,
            rows = df.height(),
            columns = df.width(),
            elapsed = ?start.elapsed(),
            "Loaded message table"
        );

        Ok(df)
    }

    /// Split a loaded table into messages, labels and category names
    pub fn corpus_from_frame(&self, df: &DataFrame) -> Result<MessageCorpus> {
        let column_names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let (start, end) = self.label_bounds(&column_names)?;
        let category_names: Vec<String> = column_names[start..=end].to_vec();

        if self.label_layout_mismatch(&column_names, &category_names) {
            warn!(
                selected = category_names.len(),
                positional = column_names.len().saturating_sub(LABEL_OFFSET),
                "Label columns differ from the columns after the metadata block"
            );
        }

        let text = df
            .column(&self.config.text_column)
            .map_err(|_| TriageError::FeatureNotFound(self.config.text_column.clone()))?
            .cast(&DataType::String)?;
        let messages: Vec<String> = text
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or("").to_string())
            .collect();

        let labels = columns_to_array2(df, &category_names)?;

        debug!(shape = ?labels.dim(), "Label matrix");

        Ok(MessageCorpus {
            messages,
            labels,
            category_names,
        })
    }

    /// Default name range selected something other than the positional
    /// columns. Custom ranges are intentional and never flagged.
    fn label_layout_mismatch(&self, column_names: &[String], category_names: &[String]) -> bool {
        if !self.config.uses_default_label_range() {
            return false;
        }
        let positional = column_names.get(LABEL_OFFSET..).unwrap_or(&[]);
        positional != category_names
    }

    fn label_bounds(&self, column_names: &[String]) -> Result<(usize, usize)> {
        let position = |name: &String| {
            column_names
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| TriageError::FeatureNotFound(name.clone()))
        };

        let start = match &self.config.first_label {
            Some(name) => position(name)?,
            None => LABEL_OFFSET,
        };
        let end = match &self.config.last_label {
            Some(name) => position(name)?,
            None => column_names.len().saturating_sub(1),
        };

        if start >= column_names.len() || start > end {
            return Err(TriageError::ValidationError(format!(
                "No label columns between positions {} and {} of {} columns",
                start,
                end,
                column_names.len()
            )));
        }

        Ok((start, end))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Numeric SQLite columns become Float64, everything else String.
fn values_to_series(name: &str, values: Vec<Value>) -> Series {
    let numeric = values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Integer(_) | Value::Real(_)));

    if numeric {
        let data: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Some(i as f64),
                Value::Real(f) => Some(f),
                _ => None,
            })
            .collect();
        Series::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                Value::Null => None,
                Value::Integer(i) => Some(i.to_string()),
                Value::Real(f) => Some(f.to_string()),
                Value::Text(s) => Some(s),
                Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            })
            .collect();
        Series::new(name.into(), data)
    }
}

/// Extract named columns into a row-major matrix; nulls become 0.0
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| TriageError::FeatureNotFound(col_name.clone()))?;
            let column_f64 = column.cast(&DataType::Float64).map_err(|e| {
                TriageError::DataError(format!("label column {}: {}", col_name, e))
            })?;
            let values: Vec<f64> = column_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}
