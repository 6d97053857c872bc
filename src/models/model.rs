//! The model-facing seam of the engine.
//!
//! The engine never looks inside a model. It needs three things:
//! - `score`: turn a small table of feature rows into predictions
//! - `category`: whether the output is a regression value or class probabilities
//! - optionally, a ranked list of the model's most important features
//!
//! Prediction layout follows the usual convention: regression models emit a
//! single `predict` column; classifiers emit `predict` followed by one
//! probability column per class.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::data::Frame;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCategory {
    Regression,
    Binomial,
    Multinomial(usize),
    Clustering,
}

impl ModelCategory {
    pub fn is_supervised(self) -> bool {
        !matches!(self, ModelCategory::Clustering)
    }

    /// Number of response classes (`1` for regression, `0` when unsupervised).
    pub fn nclasses(self) -> usize {
        match self {
            ModelCategory::Regression => 1,
            ModelCategory::Binomial => 2,
            ModelCategory::Multinomial(n) => n,
            ModelCategory::Clustering => 0,
        }
    }
}

/// Capability: the model can rank its own input features.
pub trait FeatureImportance {
    /// Up to `n` feature names, most important first.
    fn most_important_features(&self, n: usize) -> Vec<String>;
}

pub trait Model: Send + Sync {
    fn key(&self) -> &str;

    fn category(&self) -> ModelCategory;

    fn score(&self, input: &ScoringInput) -> Result<Predictions, AppError>;

    /// `Some` when the model supports feature-importance introspection.
    fn feature_importance(&self) -> Option<&dyn FeatureImportance> {
        None
    }

    /// Metrics recorded on this live model instance while scoring.
    fn metrics(&self) -> &MetricsSession;
}

/// Column metadata of a scoring input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputColumn {
    pub name: String,
    /// Label domain for categorical columns; values are indices into it.
    pub domain: Option<Vec<String>>,
}

/// A small row-major table handed to `Model::score`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringInput {
    pub columns: Vec<InputColumn>,
    pub rows: Vec<Vec<f64>>,
}

impl ScoringInput {
    /// Copy one row of `frame` into a single-row input.
    pub fn from_frame_row(frame: &Frame, row: usize) -> Option<Self> {
        let values = frame.row(row)?;
        let columns = frame
            .columns()
            .iter()
            .map(|c| InputColumn {
                name: c.name().to_string(),
                domain: c.domain().map(<[String]>::to_vec),
            })
            .collect();
        Some(Self {
            columns,
            rows: vec![values],
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx).copied()
    }

    /// Category label of a categorical cell, `None` when missing or unknown.
    pub fn label(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        let domain = self.columns[idx].domain.as_ref()?;
        let code = *self.rows.get(row)?.get(idx)?;
        if code.is_nan() || code < 0.0 {
            return None;
        }
        domain.get(code as usize).map(String::as_str)
    }
}

/// Column-major prediction output.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl Predictions {
    pub fn regression(values: Vec<f64>) -> Self {
        Self {
            names: vec!["predict".to_string()],
            columns: vec![values],
        }
    }

    /// `predict, p0, p1` from second-class probabilities.
    pub fn binomial(p1: Vec<f64>, threshold: f64) -> Self {
        let predict = p1.iter().map(|&p| if p >= threshold { 1.0 } else { 0.0 }).collect();
        let p0 = p1.iter().map(|&p| 1.0 - p).collect();
        Self {
            names: vec!["predict".to_string(), "p0".to_string(), "p1".to_string()],
            columns: vec![predict, p0, p1],
        }
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn at(&self, column: usize, row: usize) -> Option<f64> {
        self.columns.get(column)?.get(row).copied()
    }
}

/// One scoring call recorded against a live model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringMetric {
    pub job: String,
    pub column: String,
    pub grid_index: usize,
    pub nrows: usize,
    pub at: DateTime<Utc>,
}

/// Scoring-session metrics attached to a live model instance.
///
/// Whoever triggers scoring must call [`MetricsSession::discard`] for its own
/// job key once finished, on the same instance it scored with.
#[derive(Debug, Default)]
pub struct MetricsSession {
    entries: Mutex<Vec<ScoringMetric>>,
}

impl MetricsSession {
    pub fn record(&self, metric: ScoringMetric) {
        self.entries.lock().push(metric);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_for(&self, job: &str) -> usize {
        self.entries.lock().iter().filter(|m| m.job == job).count()
    }

    /// Drop every metric recorded by `job`; returns how many were removed.
    pub fn discard(&self, job: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|m| m.job != job);
        before - entries.len()
    }
}
