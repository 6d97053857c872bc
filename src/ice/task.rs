//! One scoring task: the target row with one column pinned to one grid value.

use chrono::Utc;

use crate::error::{AppError, ErrorKind};
use crate::models::{Model, ModelCategory, Predictions, ScoringInput, ScoringMetric};

/// Everything the tasks of one column share.
pub struct TaskContext<'a> {
    pub job_key: &'a str,
    pub model: &'a dyn Model,
    /// The target row, copied once from the dataset.
    pub template: &'a ScoringInput,
    pub column: &'a str,
    /// Label domain to tag the overridden column with (categorical only).
    pub domain: Option<&'a [String]>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringTask {
    /// Slot in the column's response vector.
    pub index: usize,
    pub value: f64,
}

impl ScoringTask {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }

    /// The target row with `ctx.column` replaced by this task's value.
    pub fn build_input(&self, ctx: &TaskContext<'_>) -> Result<ScoringInput, AppError> {
        let mut input = ctx.template.clone();
        let idx = input
            .column_index(ctx.column)
            .ok_or_else(|| AppError::scoring(format!("Column '{}' missing from scoring row.", ctx.column)))?;
        for row in &mut input.rows {
            row[idx] = self.value;
        }
        if let Some(domain) = ctx.domain {
            input.columns[idx].domain = Some(domain.to_vec());
        }
        Ok(input)
    }

    pub fn run(&self, ctx: &TaskContext<'_>) -> Result<f64, AppError> {
        let input = self.build_input(ctx)?;
        let preds = ctx.model.score(&input).map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::UnsupportedModelShape => ErrorKind::UnsupportedModelShape,
                _ => ErrorKind::ScoringFailure,
            };
            AppError::new(
                kind,
                format!(
                    "Scoring model {} failed on column '{}' at value {}: {}",
                    ctx.model.key(),
                    ctx.column,
                    self.value,
                    e.message()
                ),
            )
        })?;
        ctx.model.metrics().record(ScoringMetric {
            job: ctx.job_key.to_string(),
            column: ctx.column.to_string(),
            grid_index: self.index,
            nrows: input.nrows(),
            at: Utc::now(),
        });
        extract_response(ctx.model.category(), &preds)
    }
}

/// Pull the scalar response out of single-row predictions.
///
/// Binomial models yield the second-class probability (column 2 after
/// `predict, p0`); regression models yield the sole prediction. Anything else
/// is `UnsupportedModelShape`.
pub fn extract_response(category: ModelCategory, preds: &Predictions) -> Result<f64, AppError> {
    let (column, expected_cols) = match category.nclasses() {
        2 => (2, 3),
        1 => (0, 1),
        n => {
            return Err(AppError::new(
                ErrorKind::UnsupportedModelShape,
                format!("Cannot extract a response from a model with {n} classes."),
            ));
        }
    };
    if preds.ncols() != expected_cols {
        return Err(AppError::new(
            ErrorKind::UnsupportedModelShape,
            format!(
                "Expected {expected_cols} prediction column(s) for {category:?}, got {}.",
                preds.ncols()
            ),
        ));
    }
    preds.at(column, 0).ok_or_else(|| {
        AppError::new(ErrorKind::UnsupportedModelShape, "Model returned no prediction rows.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputColumn, MetricsSession};

    struct EchoModel {
        category: ModelCategory,
        metrics: MetricsSession,
    }

    impl Model for EchoModel {
        fn key(&self) -> &str {
            "echo"
        }

        fn category(&self) -> ModelCategory {
            self.category
        }

        fn score(&self, input: &ScoringInput) -> Result<Predictions, AppError> {
            let x = input.value(0, "x").unwrap_or(f64::NAN);
            let bonus = if input.label(0, "color") == Some("red") { 100.0 } else { 0.0 };
            match self.category {
                ModelCategory::Binomial => Ok(Predictions::binomial(vec![x / 10.0], 0.5)),
                ModelCategory::Multinomial(_) => Ok(Predictions {
                    names: vec!["predict".into(), "p0".into(), "p1".into(), "p2".into()],
                    columns: vec![vec![0.0]; 4],
                }),
                _ => Ok(Predictions::regression(vec![x + bonus])),
            }
        }

        fn metrics(&self) -> &MetricsSession {
            &self.metrics
        }
    }

    fn template() -> ScoringInput {
        ScoringInput {
            columns: vec![
                InputColumn { name: "x".into(), domain: None },
                InputColumn { name: "color".into(), domain: None },
            ],
            rows: vec![vec![1.0, 0.0]],
        }
    }

    fn model(category: ModelCategory) -> EchoModel {
        EchoModel {
            category,
            metrics: MetricsSession::default(),
        }
    }

    #[test]
    fn overrides_only_the_target_column() {
        let m = model(ModelCategory::Regression);
        let t = template();
        let ctx = TaskContext { job_key: "job", model: &m, template: &t, column: "x", domain: None };
        let input = ScoringTask::new(0, 7.0).build_input(&ctx).unwrap();
        assert_eq!(input.rows[0], vec![7.0, 0.0]);
        assert_eq!(t.rows[0], vec![1.0, 0.0]);
    }

    #[test]
    fn regression_uses_sole_prediction_and_records_metric() {
        let m = model(ModelCategory::Regression);
        let t = template();
        let ctx = TaskContext { job_key: "job_9", model: &m, template: &t, column: "x", domain: None };
        assert_eq!(ScoringTask::new(3, 7.0).run(&ctx).unwrap(), 7.0);
        assert_eq!(m.metrics().count_for("job_9"), 1);
    }

    #[test]
    fn binomial_uses_second_class_probability() {
        let m = model(ModelCategory::Binomial);
        let t = template();
        let ctx = TaskContext { job_key: "job", model: &m, template: &t, column: "x", domain: None };
        assert!((ScoringTask::new(0, 8.0).run(&ctx).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn categorical_value_is_tagged_with_domain() {
        let m = model(ModelCategory::Regression);
        let t = template();
        let domain = vec!["blue".to_string(), "red".to_string()];
        let ctx = TaskContext { job_key: "job", model: &m, template: &t, column: "color", domain: Some(&domain) };
        assert_eq!(ScoringTask::new(1, 1.0).run(&ctx).unwrap(), 101.0);
    }

    #[test]
    fn multinomial_output_fails_fast() {
        let m = model(ModelCategory::Multinomial(3));
        let t = template();
        let ctx = TaskContext { job_key: "job", model: &m, template: &t, column: "x", domain: None };
        let err = ScoringTask::new(0, 1.0).run(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedModelShape);
    }

    #[test]
    fn mismatched_column_count_is_unsupported_shape() {
        let err = extract_response(ModelCategory::Binomial, &Predictions::regression(vec![0.3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedModelShape);
    }
}
