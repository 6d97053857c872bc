//! Synthetic credit-style dataset and a matching binomial GLM for demos.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::data::frame::{Column, Frame};
use crate::error::AppError;
use crate::models::{GlmFamily, GlmModel, GlmSpec};

pub const REGIONS: [&str; 4] = ["east", "north", "south", "west"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { rows: 200, seed: 42 }
    }
}

#[derive(Debug)]
pub struct SampleData {
    pub frame: Frame,
    pub model: GlmModel,
}

/// Generate `config.rows` applicants with columns `age` (integer, 20..=60),
/// `income` (log-normal, thousands), `debt_ratio` (0..1), and `region`.
pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.rows == 0 {
        return Err(AppError::invalid("Sample row count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let income_dist = LogNormal::new(3.9, 0.35)
        .map_err(|e| AppError::invalid(format!("Income distribution error: {e}")))?;
    let debt_noise = Normal::new(0.0, 0.08)
        .map_err(|e| AppError::invalid(format!("Debt noise distribution error: {e}")))?;

    let mut age = Vec::with_capacity(config.rows);
    let mut income = Vec::with_capacity(config.rows);
    let mut debt_ratio = Vec::with_capacity(config.rows);
    let mut region = Vec::with_capacity(config.rows);

    for _ in 0..config.rows {
        let a = rng.gen_range(20..=60) as f64;
        let inc: f64 = income_dist.sample(&mut rng);
        // Younger, lower-income applicants carry more debt on average.
        let base_debt = 0.55 - 0.004 * (a - 20.0) - 0.002 * (inc - 50.0);
        let d = (base_debt + debt_noise.sample(&mut rng)).clamp(0.0, 1.0);

        age.push(a);
        income.push((inc * 100.0).round() / 100.0);
        debt_ratio.push((d * 1000.0).round() / 1000.0);
        region.push(REGIONS[rng.gen_range(0..REGIONS.len())]);
    }

    let region_labels: Vec<Option<&str>> = region.iter().map(|r| Some(*r)).collect();
    let frame = Frame::new(vec![
        Column::numeric("age", age),
        Column::numeric("income", income),
        Column::numeric("debt_ratio", debt_ratio),
        Column::from_labels("region", &region_labels),
    ])?;

    Ok(SampleData {
        frame,
        model: GlmModel::new(default_model_spec()),
    })
}

/// Default-probability model over the sample's columns.
pub fn default_model_spec() -> GlmSpec {
    GlmSpec {
        key: "glm_default_risk".to_string(),
        family: GlmFamily::Binomial,
        intercept: -1.2,
        coefficients: BTreeMap::from([
            ("age".to_string(), -0.03),
            ("income".to_string(), -0.015),
            ("debt_ratio".to_string(), 3.5),
        ]),
        categorical: BTreeMap::from([(
            "region".to_string(),
            BTreeMap::from([
                ("east".to_string(), 0.0),
                ("north".to_string(), -0.25),
                ("south".to_string(), 0.4),
                ("west".to_string(), 0.1),
            ]),
        )]),
    }
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.rows.hash(&mut hasher);
    config.seed.hash(&mut hasher);
    hasher.finish()
}
