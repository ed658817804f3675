//! In-memory tabular dataset
//!
//! A [`Dataset`] is a set of equally long named columns. Each column records
//! the storage type the loader inferred for it ([`ColumnType`]) and holds
//! optional cells; `None` is a missing value.
//!
//! The storage type matters downstream: only `Float` columns are treated as
//! numeric features, integer and text columns are categorical.
//!
//! # Examples
//!
//! ```
//! use loanscope_analysis::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::new(vec![
//!     Column::float("income", vec![Some(42_000.0), None, Some(18_500.0)]),
//!     Column::int("TARGET", vec![Some(0), Some(1), Some(0)]),
//! ])
//! .unwrap();
//!
//! assert_eq!(dataset.num_rows(), 3);
//! assert_eq!(dataset.sorted_column_names(), vec!["TARGET", "income"]);
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A single non-missing cell value.
///
/// Integer and float values compare numerically with each other, so a
/// category list written as `[1, 2]` matches a float column holding `1.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the value, `None` for text.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::Text(_))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Text(_), _) | (_, Scalar::Text(_)) => false,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => fmt::Display::fmt(v, f),
            Scalar::Float(v) => fmt::Display::fmt(v, f),
            Scalar::Text(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl FromStr for Scalar {
    type Err = Infallible;

    /// Parses an integer, then a float, and falls back to text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(Scalar::Int(v));
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return Ok(Scalar::Float(v));
        }
        Ok(Scalar::Text(s.to_owned()))
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_owned())
    }
}

/// Storage type of a column, as inferred by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Float,
    Int,
    Text,
}

/// A named column of optional cells.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    ty: ColumnType,
    cells: Vec<Option<Scalar>>,
}

impl Column {
    /// Float column; `NaN` cells are stored as missing.
    #[must_use]
    pub fn float(name: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        let cells = cells
            .into_iter()
            .map(|cell| cell.filter(|v| !v.is_nan()).map(Scalar::Float))
            .collect();
        Self {
            name: name.into(),
            ty: ColumnType::Float,
            cells,
        }
    }

    #[must_use]
    pub fn int(name: impl Into<String>, cells: Vec<Option<i64>>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Int,
            cells: cells.into_iter().map(|cell| cell.map(Scalar::Int)).collect(),
        }
    }

    #[must_use]
    pub fn text<S>(name: impl Into<String>, cells: Vec<Option<S>>) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ty: ColumnType::Text,
            cells: cells
                .into_iter()
                .map(|cell| cell.map(|v| Scalar::Text(v.into())))
                .collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.ty
    }

    #[must_use]
    pub fn cells(&self) -> &[Option<Scalar>] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A read-only table of equally long columns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Builds a dataset, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self, AnalysisError> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(column) = columns.iter().find(|c| c.len() != expected) {
                return Err(AnalysisError::ColumnLength {
                    column: column.name.clone(),
                    expected,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, AnalysisError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                column: name.to_owned(),
            })
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Column names in lexical order.
    #[must_use]
    pub fn sorted_column_names(&self) -> Vec<&str> {
        let mut names = self.columns.iter().map(Column::name).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}
