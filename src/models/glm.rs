//! Generalized linear model (Gaussian identity / binomial logit).
//!
//! The JSON form is:
//!
//! ```json
//! {
//!   "key": "glm_credit",
//!   "family": "binomial",
//!   "intercept": -2.0,
//!   "coefficients": { "age": 0.05 },
//!   "categorical": { "region": { "north": 0.3, "south": -0.1 } }
//! }
//! ```
//!
//! Missing numeric cells and unknown categorical levels contribute nothing to
//! the linear predictor.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::model::{FeatureImportance, MetricsSession, Model, ModelCategory, Predictions, ScoringInput};

const BINOMIAL_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlmFamily {
    Gaussian,
    Binomial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlmSpec {
    pub key: String,
    pub family: GlmFamily,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug)]
pub struct GlmModel {
    spec: GlmSpec,
    metrics: MetricsSession,
}

impl GlmModel {
    pub fn new(spec: GlmSpec) -> Self {
        Self {
            spec,
            metrics: MetricsSession::default(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
        let spec: GlmSpec =
            serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid model JSON: {e}")))?;
        Ok(Self::new(spec))
    }

    pub fn spec(&self) -> &GlmSpec {
        &self.spec
    }

    fn linear_predictor(&self, input: &ScoringInput, row: usize) -> Result<f64, AppError> {
        let n_terms = self.spec.coefficients.len() + self.spec.categorical.len();
        let mut betas = Vec::with_capacity(n_terms);
        let mut xs = Vec::with_capacity(n_terms);

        for (name, &beta) in &self.spec.coefficients {
            let x = input
                .value(row, name)
                .ok_or_else(|| AppError::scoring(format!("Model {} needs column '{name}'.", self.spec.key)))?;
            betas.push(beta);
            xs.push(if x.is_nan() { 0.0 } else { x });
        }
        for (name, levels) in &self.spec.categorical {
            if input.column_index(name).is_none() {
                return Err(AppError::scoring(format!("Model {} needs column '{name}'.", self.spec.key)));
            }
            let beta = input
                .label(row, name)
                .and_then(|label| levels.get(label))
                .copied()
                .unwrap_or(0.0);
            betas.push(beta);
            xs.push(1.0);
        }

        let eta = self.spec.intercept + DVector::from_vec(betas).dot(&DVector::from_vec(xs));
        if !eta.is_finite() {
            return Err(AppError::scoring(format!(
                "Model {} produced a non-finite linear predictor.",
                self.spec.key
            )));
        }
        Ok(eta)
    }
}

impl Model for GlmModel {
    fn key(&self) -> &str {
        &self.spec.key
    }

    fn category(&self) -> ModelCategory {
        match self.spec.family {
            GlmFamily::Gaussian => ModelCategory::Regression,
            GlmFamily::Binomial => ModelCategory::Binomial,
        }
    }

    fn score(&self, input: &ScoringInput) -> Result<Predictions, AppError> {
        let etas = (0..input.nrows())
            .map(|row| self.linear_predictor(input, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match self.spec.family {
            GlmFamily::Gaussian => Predictions::regression(etas),
            GlmFamily::Binomial => {
                let p1 = etas.into_iter().map(|eta| 1.0 / (1.0 + (-eta).exp())).collect();
                Predictions::binomial(p1, BINOMIAL_THRESHOLD)
            }
        })
    }

    fn feature_importance(&self) -> Option<&dyn FeatureImportance> {
        Some(self)
    }

    fn metrics(&self) -> &MetricsSession {
        &self.metrics
    }
}

impl FeatureImportance for GlmModel {
    /// Ranks by absolute coefficient; categorical features use their largest
    /// absolute level coefficient. Ties break by name.
    fn most_important_features(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(String, f64)> = self
            .spec
            .coefficients
            .iter()
            .map(|(name, b)| (name.clone(), b.abs()))
            .chain(self.spec.categorical.iter().map(|(name, levels)| {
                let mag = levels.values().map(|b| b.abs()).fold(0.0, f64::max);
                (name.clone(), mag)
            }))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.into_iter().take(n).map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::model::InputColumn;

    fn spec(family: GlmFamily) -> GlmSpec {
        GlmSpec {
            key: "glm_test".to_string(),
            family,
            intercept: 1.0,
            coefficients: BTreeMap::from([("age".to_string(), 0.5), ("income".to_string(), -2.0)]),
            categorical: BTreeMap::from([(
                "color".to_string(),
                BTreeMap::from([("red".to_string(), 3.0), ("blue".to_string(), -1.0)]),
            )]),
        }
    }

    fn input(age: f64, income: f64, color: f64) -> ScoringInput {
        ScoringInput {
            columns: vec![
                InputColumn { name: "age".into(), domain: None },
                InputColumn { name: "income".into(), domain: None },
                InputColumn {
                    name: "color".into(),
                    domain: Some(vec!["blue".into(), "green".into(), "red".into()]),
                },
            ],
            rows: vec![vec![age, income, color]],
        }
    }

    #[test]
    fn gaussian_scores_linear_predictor() {
        let m = GlmModel::new(spec(GlmFamily::Gaussian));
        let p = m.score(&input(2.0, 0.5, 2.0)).unwrap();
        // 1 + 0.5*2 - 2*0.5 + 3 (red)
        assert_eq!(p.ncols(), 1);
        assert!((p.at(0, 0).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_level_and_missing_value_contribute_nothing() {
        let m = GlmModel::new(spec(GlmFamily::Gaussian));
        let p = m.score(&input(f64::NAN, 0.0, 1.0)).unwrap();
        assert!((p.at(0, 0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn binomial_emits_class_probabilities() {
        let m = GlmModel::new(GlmSpec {
            intercept: 0.0,
            coefficients: BTreeMap::new(),
            categorical: BTreeMap::new(),
            ..spec(GlmFamily::Binomial)
        });
        let p = m.score(&input(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(p.ncols(), 3);
        assert!((p.at(2, 0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_a_scoring_failure() {
        let m = GlmModel::new(spec(GlmFamily::Gaussian));
        let mut i = input(1.0, 1.0, 0.0);
        i.columns.remove(1);
        i.rows[0].remove(1);
        let err = m.score(&i).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ScoringFailure);
    }

    #[test]
    fn importance_ranks_by_magnitude() {
        let m = GlmModel::new(spec(GlmFamily::Gaussian));
        assert_eq!(m.most_important_features(10), vec!["color", "income", "age"]);
        assert_eq!(m.most_important_features(1), vec!["color"]);
    }
}
