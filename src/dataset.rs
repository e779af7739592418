//! Loader for delimited enrollment datasets.
//!
//! Expects a header row with every schema column plus a `target` column whose
//! values are the three outcome class names. Any malformed row aborts the load
//! so a training run never starts from partial data.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::schema::{self, FEATURE_COUNT, SchemaError};

/// Name of the label column in training files.
pub const TARGET_COLUMN: &str = "target";

/// Enrollment outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Student left before completing the course.
    Dropout,
    /// Student is still enrolled.
    Enrolled,
    /// Student graduated.
    Graduate,
}

impl Outcome {
    /// Class names in their persisted encoding order (sorted lexically).
    pub const CLASSES: [&'static str; 3] = ["Dropout", "Enrolled", "Graduate"];

    /// Parse a target cell.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Dropout" => Some(Self::Dropout),
            "Enrolled" => Some(Self::Enrolled),
            "Graduate" => Some(Self::Graduate),
            _ => None,
        }
    }

    /// Integer code under the lexical encoding.
    pub fn class_index(self) -> usize {
        match self {
            Self::Dropout => 0,
            Self::Enrolled => 1,
            Self::Graduate => 2,
        }
    }

    /// Class name.
    pub fn as_str(self) -> &'static str {
        Self::CLASSES[self.class_index()]
    }
}

/// Failures while reading or validating a training file.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// File had no header or no data rows.
    #[error("Dataset is empty")]
    Empty,
    /// Header lacks the label column.
    #[error("Dataset is missing the '{TARGET_COLUMN}' column")]
    MissingTarget,
    /// Header lacks a schema column.
    #[error("Dataset is missing schema column '{0}'")]
    MissingColumn(String),
    /// Row is shorter or longer than the header.
    #[error("Row {row}: expected {expected} columns, got {actual}")]
    RowWidth {
        /// 1-based data row number.
        row: usize,
        /// Header column count.
        expected: usize,
        /// Observed column count.
        actual: usize,
    },
    /// Cell could not be parsed as a number.
    #[error("Row {row}: column '{column}' is not numeric: '{value}'")]
    NotNumeric {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: String,
        /// Offending cell content.
        value: String,
    },
    /// Row failed schema domain validation.
    #[error("Row {row}: {source}")]
    InvalidRow {
        /// 1-based data row number.
        row: usize,
        /// Underlying schema rejection.
        source: SchemaError,
    },
    /// Target cell is not one of the three class names.
    #[error("Row {row}: unknown target '{value}'")]
    UnknownTarget {
        /// 1-based data row number.
        row: usize,
        /// Offending cell content.
        value: String,
    },
}

/// Labeled feature matrix in schema column order.
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix, one row per student, columns in schema order.
    pub x: Vec<Vec<f64>>,
    /// Encoded labels aligned with `x`.
    pub y: Vec<usize>,
    /// Label-code mapping: index in this list is the encoded value.
    pub classes: Vec<String>,
}

impl TrainingDataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the dataset holds no rows.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Per-class row counts, indexed by encoded label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &label in &self.y {
            if label < counts.len() {
                counts[label] += 1;
            }
        }
        counts
    }
}

/// Load a delimited training file.
///
/// The delimiter is taken from the header: `;` when present, `,` otherwise.
pub fn load(path: &Path) -> Result<TrainingDataset, DatasetError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(DatasetError::Empty),
        }
    };

    let delimiter = if header.contains(';') { ';' } else { ',' };
    let columns: Vec<String> = header
        .split(delimiter)
        .map(|cell| cell.trim().to_string())
        .collect();

    let target_idx = columns
        .iter()
        .position(|name| name == TARGET_COLUMN)
        .ok_or(DatasetError::MissingTarget)?;
    let mut column_index: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, name) in columns.iter().enumerate() {
        column_index.insert(name.as_str(), idx);
    }
    for name in schema::order() {
        if !column_index.contains_key(name.as_str()) {
            return Err(DatasetError::MissingColumn(name));
        }
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut row_no = 0usize;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        row_no += 1;
        let cells: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        if cells.len() != columns.len() {
            return Err(DatasetError::RowWidth {
                row: row_no,
                expected: columns.len(),
                actual: cells.len(),
            });
        }

        let mut payload = BTreeMap::new();
        for spec in schema::FEATURES.iter() {
            let idx = column_index[spec.name];
            let cell = cells[idx];
            let value: f64 = cell.parse().map_err(|_| DatasetError::NotNumeric {
                row: row_no,
                column: spec.name.to_string(),
                value: cell.to_string(),
            })?;
            payload.insert(spec.name.to_string(), value);
        }
        let vector = schema::validate(&payload)
            .map_err(|source| DatasetError::InvalidRow { row: row_no, source })?;

        let target_cell = cells[target_idx];
        let outcome = Outcome::parse(target_cell).ok_or_else(|| DatasetError::UnknownTarget {
            row: row_no,
            value: target_cell.to_string(),
        })?;

        debug_assert_eq!(vector.values().len(), FEATURE_COUNT);
        x.push(vector.values().to_vec());
        y.push(outcome.class_index());
    }

    if x.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(TrainingDataset {
        x,
        y,
        classes: Outcome::CLASSES.iter().map(|name| name.to_string()).collect(),
    })
}
