//! Export result tables to CSV, one file per table.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::domain::IceTable;
use crate::error::AppError;

/// Write every table into `dir`; returns the created paths in table order.
pub fn write_tables_csv(dir: &Path, tables: &[IceTable]) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut paths = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(table_file_name(table));
        write_table_csv(&path, table)?;
        paths.push(path);
    }
    Ok(paths)
}

pub fn write_table_csv(path: &Path, table: &IceTable) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record([table.column(), "response"])
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for r in &table.rows {
        let value = match r.value.as_label() {
            Some(label) => label.to_string(),
            None => format!("{:.10}", r.value.as_number().unwrap_or(f64::NAN)),
        };
        let response = format!("{:.10}", r.response);
        writer
            .write_record([value.as_str(), response.as_str()])
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    Ok(())
}

fn table_file_name(table: &IceTable) -> String {
    let safe: String = table
        .column()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("ice_{}_{safe}_row{}.csv", table.key.model, table.key.row)
}
