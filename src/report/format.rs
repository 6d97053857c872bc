//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{IceTable, JobStatus};
use crate::runtime::Job;

/// What the run summary header needs to know.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub job: &'a Job,
    pub model: &'a str,
    pub dataset: &'a str,
    pub dataset_rows: usize,
    pub row: usize,
    pub nbins: usize,
    pub columns: &'a [String],
}

pub fn format_run_summary(summary: &RunSummary<'_>, tables: &[IceTable]) -> String {
    let mut out = String::new();
    let job = summary.job;

    out.push_str("=== ice - Individual Conditional Expectation ===\n");
    out.push_str(&format!("Job: {} ({})\n", job.key(), job.status().display_name()));
    out.push_str(&format!("Model: {}\n", summary.model));
    out.push_str(&format!(
        "Dataset: {} | rows={} | target row={}\n",
        summary.dataset, summary.dataset_rows, summary.row
    ));
    out.push_str(&format!(
        "Columns: {} | nbins={}\n",
        summary.columns.join(", "),
        summary.nbins
    ));
    out.push_str(&format!(
        "Progress: {}/{} columns ({:.0}%)",
        job.worked(),
        job.work(),
        job.progress() * 100.0
    ));
    if let Some(elapsed) = job.elapsed() {
        out.push_str(&format!(" | elapsed={}ms", elapsed.num_milliseconds()));
    }
    out.push('\n');

    match job.status() {
        JobStatus::Cancelled => out.push_str(&format!(
            "Cancelled: kept {} of {} column(s).\n",
            tables.len(),
            summary.columns.len()
        )),
        JobStatus::Failed => {
            if let Some(err) = job.error() {
                out.push_str(&format!("Failed: {err}\n"));
            }
        }
        _ => {}
    }

    out
}

/// Format one result table.
pub fn format_table(table: &IceTable) -> String {
    let mut out = String::new();
    out.push_str(&table.description);
    out.push('\n');

    let name = truncate(table.column(), 24);
    let w = name.chars().count().max(12);
    out.push_str(&format!("{name:<w$} {:>12}\n", "response"));
    out.push_str(&format!("{:-<w$} {:-<12}\n", "", ""));

    for r in &table.rows {
        let value = truncate(&r.value.to_string(), w);
        out.push_str(&format!("{value:<w$} {:>12.5}\n", r.response));
    }

    out
}

pub fn format_tables(tables: &[IceTable]) -> String {
    tables.iter().map(format_table).collect::<Vec<_>>().join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}
