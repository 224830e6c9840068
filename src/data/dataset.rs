//! Column-oriented dataset

use std::collections::HashSet;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TuneError};

/// Values of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnData {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "values")]
    pub data: ColumnData,
}

impl Column {
    /// Create a numeric column
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), data: ColumnData::Numeric(values) }
    }

    /// Create a categorical column
    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<Column>,
}

/// Immutable table of equally long named columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
    #[serde(skip)]
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that columns are non-empty, uniquely named and
    /// equally long.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let Some(first) = columns.first() else {
            return Err(TuneError::Data("dataset has no columns".into()));
        };
        let n_rows = first.data.len();

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TuneError::Data(format!("duplicate column '{}'", column.name)));
            }
            if column.data.len() != n_rows {
                return Err(TuneError::Data(format!(
                    "column '{}' has {} rows, expected {n_rows}",
                    column.name,
                    column.data.len()
                )));
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Parse a dataset from its JSON representation
    /// (`{"columns": [{"name": .., "values": [..]}, ..]}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawDataset = serde_json::from_str(json)
            .map_err(|e| TuneError::Data(format!("invalid dataset JSON: {e}")))?;
        Self::new(raw.columns)
    }

    /// Load a JSON dataset from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TuneError::io(format!("reading dataset {}", path.display()), e))?;
        let raw: RawDataset = serde_json::from_str(&contents)
            .map_err(|e| TuneError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        Self::new(raw.columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a numeric column's values
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(v)) => Ok(v),
            Some(ColumnData::Categorical(_)) => {
                Err(TuneError::Data(format!("column '{name}' is not numeric")))
            }
            None => Err(TuneError::UnknownColumn(name.to_string())),
        }
    }

    /// Get a categorical column's values
    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Categorical(v)) => Ok(v),
            Some(ColumnData::Numeric(_)) => {
                Err(TuneError::Data(format!("column '{name}' is not categorical")))
            }
            None => Err(TuneError::UnknownColumn(name.to_string())),
        }
    }

    /// Row-major matrix of the named numeric columns.
    pub fn numeric_matrix(&self, names: &[String]) -> Result<Array2<f64>> {
        let cols = names.iter().map(|n| self.numeric(n)).collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.n_rows, cols.len()), |(i, j)| cols[j][i]))
    }

    /// New dataset holding only the given rows, in the given order.
    pub fn subset(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column { name: c.name.clone(), data: c.data.take(rows) })
                .collect(),
            n_rows: rows.len(),
        }
    }
}
