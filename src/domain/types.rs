//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - assembled in-memory by the ICE driver
//! - exported to JSON/CSV
//! - reloaded later for plotting
//! - rendered by the report and plot modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of grid points per numeric column.
pub const DEFAULT_NBINS: usize = 20;

/// Upper bound on grid points per column.
pub const MAX_NBINS: usize = 100_000;

/// How many features to take from a model's importance ranking when the
/// caller does not name any columns.
pub const DEFAULT_MAX_FEATURES: usize = 10;

pub const ICE_TABLE_TITLE: &str = "IndividualConditionalExpectation";

/// A grid value as it appears in a result table.
///
/// Categorical columns render the category label, numeric columns the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridValue {
    Label(String),
    Number(f64),
}

impl GridValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GridValue::Number(v) => Some(*v),
            GridValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            GridValue::Label(s) => Some(s),
            GridValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for GridValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridValue::Label(s) => write!(f, "{s}"),
            GridValue::Number(v) => write!(f, "{v:.5}"),
        }
    }
}

/// Declared type of the grid-value field of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Double,
}

/// One `(grid value, response)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceRow {
    pub value: GridValue,
    pub response: f64,
}

/// Identifies a table: which model, which column, which data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub model: String,
    pub column: String,
    pub row: usize,
}

/// The ICE curve of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceTable {
    pub key: TableKey,
    pub title: String,
    pub description: String,
    /// `[<column name>, "response"]`.
    pub headers: Vec<String>,
    pub value_type: ValueType,
    pub rows: Vec<IceRow>,
}

impl IceTable {
    pub fn new(model: &str, column: &str, row: usize, value_type: ValueType, rows: Vec<IceRow>) -> Self {
        Self {
            key: TableKey {
                model: model.to_string(),
                column: column.to_string(),
                row,
            },
            title: ICE_TABLE_TITLE.to_string(),
            description: format!(
                "Individual Conditional Expectation Plot of model {model} on column '{column}' on row {row}"
            ),
            headers: vec![column.to_string(), "response".to_string()],
            value_type,
            rows,
        }
    }

    pub fn column(&self) -> &str {
        &self.key.column
    }

    pub fn is_categorical(&self) -> bool {
        self.value_type == ValueType::String
    }

    pub fn responses(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.response).collect()
    }
}

/// A saved run (JSON): parameters plus every table the run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub dataset: String,
    pub row: usize,
    pub nbins: usize,
    pub status: JobStatus,
    pub tables: Vec<IceTable>,
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Running,
    Done,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Cancelled | JobStatus::Failed)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_metadata_names_model_column_and_row() {
        let t = IceTable::new("glm_1", "age", 7, ValueType::Double, Vec::new());
        assert_eq!(t.headers, vec!["age".to_string(), "response".to_string()]);
        assert!(t.description.contains("glm_1"));
        assert!(t.description.contains("'age'"));
        assert!(t.description.ends_with("row 7"));
        assert!(!t.is_categorical());
    }

    #[test]
    fn grid_values_serialize_untagged() {
        let rows = vec![
            IceRow { value: GridValue::Label("red".into()), response: 0.5 },
            IceRow { value: GridValue::Number(2.0), response: 0.25 },
        ];
        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(json, r#"[{"value":"red","response":0.5},{"value":2.0,"response":0.25}]"#);
    }
}
