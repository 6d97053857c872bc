//! Value grid generation.
//!
//! Numeric columns get `nbins` evenly spaced points between the column's min
//! and max. Integer columns whose range is narrower than `nbins` get one
//! point per integer instead, so no grid point is evaluated twice.
//! Categorical columns enumerate every level code `0..cardinality`.

use crate::data::Column;
use crate::domain::{GridValue, ValueType};
use crate::error::AppError;

/// The column statistics a grid depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub is_int: bool,
    /// Label domain for categorical columns.
    pub domain: Option<Vec<String>>,
}

impl ColumnSummary {
    pub fn from_column(column: &Column) -> Result<Self, AppError> {
        if let Some(domain) = column.domain() {
            if domain.is_empty() {
                return Err(AppError::invalid(format!(
                    "Column '{}' is categorical with an empty domain.",
                    column.name()
                )));
            }
        }
        let (Some(min), Some(max)) = (column.min(), column.max()) else {
            return Err(AppError::invalid(format!(
                "Column '{}' has no non-missing values.",
                column.name()
            )));
        };
        Ok(Self {
            name: column.name().to_string(),
            min,
            max,
            is_int: column.is_int(),
            domain: column.domain().map(<[String]>::to_vec),
        })
    }

    pub fn is_categorical(&self) -> bool {
        self.domain.is_some()
    }

    pub fn cardinality(&self) -> Option<usize> {
        self.domain.as_ref().map(Vec::len)
    }
}

/// Ordered grid points for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub column: String,
    pub values: Vec<f64>,
    pub domain: Option<Vec<String>>,
}

impl Grid {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_categorical(&self) -> bool {
        self.domain.is_some()
    }

    pub fn value_type(&self) -> ValueType {
        if self.is_categorical() {
            ValueType::String
        } else {
            ValueType::Double
        }
    }

    /// Grid point `i` as it appears in a result table.
    pub fn render(&self, i: usize) -> Option<GridValue> {
        let v = *self.values.get(i)?;
        match &self.domain {
            Some(domain) => domain.get(v as usize).cloned().map(GridValue::Label),
            None => Some(GridValue::Number(v)),
        }
    }
}

/// Build the grid for `summary` using at most `nbins` points.
pub fn build_grid(summary: &ColumnSummary, nbins: usize) -> Result<Grid, AppError> {
    if nbins == 0 {
        return Err(AppError::invalid("nbins must be >= 1."));
    }

    if let Some(domain) = &summary.domain {
        let cardinality = domain.len();
        if cardinality > nbins {
            return Err(AppError::invalid(format!(
                "Column {}'s cardinality of {cardinality} > nbins of {nbins}",
                summary.name
            )));
        }
        return Ok(Grid {
            column: summary.name.clone(),
            values: (0..cardinality).map(|i| i as f64).collect(),
            domain: Some(domain.clone()),
        });
    }

    let (min, max) = (summary.min, summary.max);
    if !(min.is_finite() && max.is_finite() && max >= min) {
        return Err(AppError::invalid(format!(
            "Column '{}' has an invalid range [{min}, {max}].",
            summary.name
        )));
    }

    let bins = effective_bins(summary, nbins);
    let step = if bins == 1 { 0.0 } else { (max - min) / (bins - 1) as f64 };
    let values = (0..bins).map(|j| min + j as f64 * step).collect();

    Ok(Grid {
        column: summary.name.clone(),
        values,
        domain: None,
    })
}

fn effective_bins(summary: &ColumnSummary, nbins: usize) -> usize {
    if summary.max == summary.min {
        return 1;
    }
    let int_range = summary.max - summary.min + 1.0;
    if summary.is_int && int_range < nbins as f64 {
        int_range as usize
    } else {
        nbins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(min: f64, max: f64, is_int: bool) -> ColumnSummary {
        ColumnSummary {
            name: "x".to_string(),
            min,
            max,
            is_int,
            domain: None,
        }
    }

    fn categorical(labels: &[&str]) -> ColumnSummary {
        ColumnSummary {
            name: "color".to_string(),
            min: 0.0,
            max: labels.len() as f64 - 1.0,
            is_int: true,
            domain: Some(labels.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn numeric_grid_is_linearly_spaced() {
        let g = build_grid(&numeric(20.0, 60.0, true), 5).unwrap();
        assert_eq!(g.values, vec![20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(g.value_type(), ValueType::Double);
    }

    #[test]
    fn grid_is_deterministic() {
        let s = numeric(-1.5, 7.25, false);
        assert_eq!(build_grid(&s, 13).unwrap(), build_grid(&s, 13).unwrap());
    }

    #[test]
    fn narrow_integer_range_gets_one_point_per_integer() {
        let g = build_grid(&numeric(3.0, 7.0, true), 20).unwrap();
        assert_eq!(g.values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn wide_integer_range_uses_nbins() {
        let g = build_grid(&numeric(0.0, 100.0, true), 20).unwrap();
        assert_eq!(g.len(), 20);
        assert_eq!(g.values[0], 0.0);
        assert!((g.values[19] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn real_valued_narrow_range_is_not_compressed() {
        let g = build_grid(&numeric(0.0, 1.0, false), 20).unwrap();
        assert_eq!(g.len(), 20);
    }

    #[test]
    fn constant_column_is_a_single_point() {
        for is_int in [true, false] {
            let g = build_grid(&numeric(4.5, 4.5, is_int), 20).unwrap();
            assert_eq!(g.values, vec![4.5]);
        }
        let g = build_grid(&numeric(9.0, 9.0, true), 1).unwrap();
        assert_eq!(g.values, vec![9.0]);
    }

    #[test]
    fn categorical_grid_enumerates_levels() {
        let g = build_grid(&categorical(&["red", "green", "blue"]), 5).unwrap();
        assert_eq!(g.values, vec![0.0, 1.0, 2.0]);
        assert_eq!(g.render(1), Some(GridValue::Label("green".to_string())));
        assert_eq!(g.value_type(), ValueType::String);
    }

    #[test]
    fn categorical_cardinality_above_nbins_is_rejected() {
        let err = build_grid(&categorical(&["a", "b", "c"]), 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameter);
    }

    #[test]
    fn summary_requires_values() {
        let col = Column::numeric("empty", vec![f64::NAN, f64::NAN]);
        assert!(ColumnSummary::from_column(&col).is_err());
        let col = Column::numeric("age", vec![20.0, f64::NAN, 60.0]);
        let s = ColumnSummary::from_column(&col).unwrap();
        assert_eq!((s.min, s.max, s.is_int), (20.0, 60.0, true));
    }
}
