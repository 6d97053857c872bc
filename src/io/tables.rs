//! Read/write run report JSON files.
//!
//! The report is the "portable" representation of a run:
//! - which model, dataset, and row were explained
//! - final job status
//! - every assembled table, in column order
//!
//! The schema is defined by `domain::IceReportFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::IceReportFile;
use crate::error::AppError;

pub fn write_report_json(path: &Path, report: &IceReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::io(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

pub fn read_report_json(path: &Path) -> Result<IceReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: IceReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{GridValue, IceRow, IceTable, JobStatus, ValueType};

    #[test]
    fn report_survives_a_disk_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let report = IceReportFile {
            tool: "ice".to_string(),
            generated_at: Utc::now(),
            model: "glm".to_string(),
            dataset: "frame".to_string(),
            row: 2,
            nbins: 5,
            status: JobStatus::Cancelled,
            tables: vec![IceTable::new(
                "glm",
                "color",
                2,
                ValueType::String,
                vec![IceRow { value: GridValue::Label("red".into()), response: 0.1 }],
            )],
        };
        write_report_json(&path, &report).unwrap();
        assert_eq!(read_report_json(&path).unwrap(), report);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_report_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
