//! In-memory columnar frame.
//!
//! Numeric columns store `f64` with `NaN` as the missing marker. Categorical
//! columns store level codes (also `f64`, `NaN` = missing) that index into an
//! ordered label domain, so a row is always a plain `Vec<f64>`.

use std::collections::HashSet;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical { codes: Vec<f64>, domain: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Build a categorical column from level codes and an explicit domain.
    pub fn categorical(name: impl Into<String>, codes: Vec<f64>, domain: Vec<String>) -> Result<Self, AppError> {
        let name = name.into();
        for &c in &codes {
            if c.is_nan() {
                continue;
            }
            if c < 0.0 || c.fract() != 0.0 || c as usize >= domain.len() {
                return Err(AppError::invalid(format!(
                    "Column '{name}': level code {c} is outside domain of size {}.",
                    domain.len()
                )));
            }
        }
        Ok(Self {
            name,
            data: ColumnData::Categorical { codes, domain },
        })
    }

    /// Build a categorical column from raw labels. The domain is the sorted set
    /// of distinct labels; `None` cells become missing.
    pub fn from_labels(name: impl Into<String>, labels: &[Option<&str>]) -> Self {
        let mut domain: Vec<String> = labels
            .iter()
            .flatten()
            .map(|s| s.to_string())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        domain.sort();
        let codes = labels
            .iter()
            .map(|l| match l {
                Some(s) => domain.binary_search_by(|d| d.as_str().cmp(*s)).map(|i| i as f64).unwrap_or(f64::NAN),
                None => f64::NAN,
            })
            .collect();
        Self {
            name: name.into(),
            data: ColumnData::Categorical { codes, domain },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical { .. })
    }

    pub fn domain(&self) -> Option<&[String]> {
        match &self.data {
            ColumnData::Categorical { domain, .. } => Some(domain),
            ColumnData::Numeric(_) => None,
        }
    }

    pub fn cardinality(&self) -> Option<usize> {
        self.domain().map(|d| d.len())
    }

    pub fn value(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v.get(row).copied(),
            ColumnData::Categorical { codes, .. } => codes.get(row).copied(),
        }
    }

    /// Smallest non-missing value. Categorical columns span `0..cardinality`.
    pub fn min(&self) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().copied().filter(|x| x.is_finite()).reduce(f64::min),
            ColumnData::Categorical { domain, .. } => (!domain.is_empty()).then_some(0.0),
        }
    }

    /// Largest non-missing value. Categorical columns span `0..cardinality`.
    pub fn max(&self) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().copied().filter(|x| x.is_finite()).reduce(f64::max),
            ColumnData::Categorical { domain, .. } => domain.len().checked_sub(1).map(|m| m as f64),
        }
    }

    /// True when every non-missing value is a whole number.
    pub fn is_int(&self) -> bool {
        match &self.data {
            ColumnData::Numeric(v) => {
                let mut any = false;
                for x in v.iter().filter(|x| x.is_finite()) {
                    if x.fract() != 0.0 {
                        return false;
                    }
                    any = true;
                }
                any
            }
            ColumnData::Categorical { .. } => true,
        }
    }

    fn set(&mut self, row: usize, value: f64) -> Result<(), AppError> {
        let name = self.name.clone();
        let slot = match &mut self.data {
            ColumnData::Numeric(v) => v.get_mut(row),
            ColumnData::Categorical { codes, domain } => {
                if !value.is_nan() && (value < 0.0 || value.fract() != 0.0 || value as usize >= domain.len()) {
                    return Err(AppError::invalid(format!(
                        "Column '{name}': level code {value} is outside its domain."
                    )));
                }
                codes.get_mut(row)
            }
        };
        let slot = slot.ok_or_else(|| AppError::invalid(format!("Row {row} is out of range for column '{name}'.")))?;
        *slot = value;
        Ok(())
    }
}

/// A set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.name()) {
                return Err(AppError::invalid(format!("Duplicate column name '{}'.", c.name())));
            }
        }
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(AppError::invalid(format!(
                    "Column '{}' has {} rows, expected {}.",
                    bad.name(),
                    bad.len(),
                    first.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Materialize one row as a vector aligned with `columns()`.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.nrows() {
            return None;
        }
        self.columns.iter().map(|c| c.value(index)).collect()
    }

    pub fn set(&mut self, column: &str, row: usize, value: f64) -> Result<(), AppError> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name() == column)
            .ok_or_else(|| AppError::invalid(format!("Column '{column}' not found.")))?;
        col.set(row, value)
    }
}
