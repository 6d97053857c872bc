//! CSV ingest into a typed `Frame`.
//!
//! Column types are inferred:
//! - a column whose non-missing cells all parse as `f64` is numeric
//! - anything else is categorical, with a sorted level domain
//!
//! Missing cells (`""`, `NA`, `NaN`) become NaN in numeric columns and a
//! missing code in categorical ones.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::data::{Column, Frame};
use crate::error::AppError;

/// Load a CSV file from disk.
pub fn load_frame_csv(path: &Path) -> Result<Frame, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_frame_csv(file)
}

/// Parse CSV from any reader. The first record is the header.
pub fn read_frame_csv<R: Read>(input: R) -> Result<Frame, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    if headers.is_empty() {
        return Err(AppError::io("CSV has no header row"));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and lines are 1-based
        let line = idx + 2;
        let record = result.map_err(|e| AppError::io(format!("CSV parse error on line {line}: {e}")))?;
        if record.len() > headers.len() {
            return Err(AppError::io(format!(
                "Line {line} has {} fields but the header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (col, slot) in cells.iter_mut().enumerate() {
            let cell = record.get(col).filter(|s| !is_missing(s)).map(str::to_string);
            slot.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, &values))
        .collect();

    Frame::new(columns)
}

fn infer_column(name: String, values: &[Option<String>]) -> Column {
    let parsed: Option<Vec<f64>> = values
        .iter()
        .map(|v| match v {
            None => Some(f64::NAN),
            Some(s) => s.parse::<f64>().ok(),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => {
            let labels: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
            Column::from_labels(name, &labels)
        }
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan")
}

fn normalize_header_name(name: &str) -> String {
    // Excel sometimes writes a BOM ahead of the first header.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_numeric_and_categorical_columns() {
        let csv = "\u{feff}age,color,score\n30,red,1.5\n40,blue,NA\n50,red,\n";
        let frame = read_frame_csv(csv.as_bytes()).unwrap();

        assert_eq!(frame.nrows(), 3);
        assert_eq!(frame.names(), vec!["age", "color", "score"]);

        let age = frame.column("age").unwrap();
        assert!(!age.is_categorical());
        assert!(age.is_int());
        assert_eq!(age.min(), Some(30.0));

        let color = frame.column("color").unwrap();
        assert_eq!(color.domain().unwrap(), ["blue".to_string(), "red".to_string()]);
        assert_eq!(color.value(0), Some(1.0));

        let score = frame.column("score").unwrap();
        assert!(!score.is_categorical());
        assert!(score.value(1).unwrap().is_nan());
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let frame = read_frame_csv("a,b\n1,x\n2\n".as_bytes()).unwrap();
        assert_eq!(frame.nrows(), 2);
        assert!(frame.column("b").unwrap().value(1).unwrap().is_nan());
    }

    #[test]
    fn long_rows_are_rejected_with_line_number() {
        let err = read_frame_csv("a\n1\n2,3\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert!(err.message().contains("Line 3"));
    }
}
