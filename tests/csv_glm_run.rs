//! CSV dataset + GLM model file through a full run and back out to disk.

use std::sync::Arc;

use ice_curves::data::Dataset;
use ice_curves::domain::{IceReportFile, JobStatus};
use ice_curves::ice::{IceJob, IceParams};
use ice_curves::io::{load_frame_csv, read_report_json, write_report_json, write_tables_csv};
use ice_curves::models::GlmModel;

const DATA: &str = "age,region,income\n25,north,40\n40,south,55.5\n55,north,NA\n";

const MODEL: &str = r#"{
  "key": "glm_income",
  "family": "gaussian",
  "intercept": 10.0,
  "coefficients": { "age": 0.5 },
  "categorical": { "region": { "south": 3.0 } }
}"#;

#[test]
fn csv_and_glm_files_produce_exportable_tables() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("people.csv");
    let model_path = dir.path().join("model.json");
    std::fs::write(&data_path, DATA).unwrap();
    std::fs::write(&model_path, MODEL).unwrap();

    let frame = load_frame_csv(&data_path).unwrap();
    let model = Arc::new(GlmModel::from_json_file(&model_path).unwrap());
    let dataset = Dataset::new("people", frame);

    let params = IceParams::new(model, dataset, 0)
        .with_columns(["age", "region"])
        .with_nbins(4)
        .with_threads(Some(2));
    let result = IceJob::new(params).unwrap().run().unwrap();
    assert_eq!(result.status, JobStatus::Done);

    let age = &result.tables[0];
    let ages: Vec<f64> = age.rows.iter().filter_map(|r| r.value.as_number()).collect();
    assert_eq!(ages, vec![25.0, 35.0, 45.0, 55.0]);
    assert_eq!(age.responses(), vec![22.5, 27.5, 32.5, 37.5]);

    let region = &result.tables[1];
    let labels: Vec<&str> = region.rows.iter().filter_map(|r| r.value.as_label()).collect();
    assert_eq!(labels, vec!["north", "south"]);
    assert_eq!(region.responses(), vec![22.5, 25.5]);

    let report = IceReportFile {
        tool: "ice".to_string(),
        generated_at: chrono::Utc::now(),
        model: "glm_income".to_string(),
        dataset: "people".to_string(),
        row: 0,
        nbins: 4,
        status: result.status,
        tables: result.tables.clone(),
    };
    let json_path = dir.path().join("run.json");
    write_report_json(&json_path, &report).unwrap();
    assert_eq!(read_report_json(&json_path).unwrap().tables, result.tables);

    let csvs = write_tables_csv(&dir.path().join("tables"), &result.tables).unwrap();
    assert_eq!(csvs.len(), 2);
    let region_csv = std::fs::read_to_string(&csvs[1]).unwrap();
    assert!(region_csv.starts_with("region,response\nnorth,22.5"));
}
