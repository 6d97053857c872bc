//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads (or generates) the dataset and model
//! - runs the ICE job and waits for it
//! - prints reports/plots and writes optional exports

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, DemoArgs, EngineArgs, OutputArgs, PlotArgs, RunArgs};
use crate::data::{Dataset, SampleConfig, generate_sample};
use crate::domain::{IceReportFile, IceTable, JobStatus};
use crate::error::AppError;
use crate::ice::{IceJob, IceParams};
use crate::models::{GlmModel, Model};
use crate::report::RunSummary;

/// Entry point for the `ice` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Demo(args) => handle_demo(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_logging() {
    // Logs go to stderr so table output on stdout stays clean for piping.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ice_curves=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let frame = crate::io::load_frame_csv(&args.data)?;
    let model = GlmModel::from_json_file(&args.model)?;
    let dataset_key = args
        .data
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());

    info!(dataset = %dataset_key, rows = frame.nrows(), cols = frame.ncols(), "Loaded dataset");
    let dataset = Dataset::new(dataset_key, frame);
    execute(Arc::new(model), dataset, args.row, &args.engine, &args.output)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let sample = generate_sample(&SampleConfig {
        rows: args.rows,
        seed: args.seed,
    })?;
    info!(rows = args.rows, seed = args.seed, "Generated sample dataset");
    let dataset = Dataset::new("sample", sample.frame);
    execute(Arc::new(sample.model), dataset, args.row, &args.engine, &args.output)
}

fn execute(
    model: Arc<dyn Model>,
    dataset: Arc<Dataset>,
    row: usize,
    engine: &EngineArgs,
    output: &OutputArgs,
) -> Result<(), AppError> {
    let mut params = IceParams::new(model.clone(), dataset.clone(), row)
        .with_nbins(engine.nbins)
        .with_max_features(engine.max_features)
        .with_threads(engine.threads);
    if let Some(columns) = engine.columns() {
        params = params.with_columns(columns);
    }

    let job = IceJob::new(params)?;
    let columns = job.columns().to_vec();
    let nbins = job.nbins();

    let mut handle = job.start()?;
    let outcome = handle.wait();
    let tables = match &outcome {
        Ok(result) => result.tables.clone(),
        Err(_) => handle.tables(),
    };

    let summary = RunSummary {
        job: handle.job(),
        model: model.key(),
        dataset: dataset.key(),
        dataset_rows: dataset.read().nrows(),
        row,
        nbins,
        columns: &columns,
    };
    println!("{}", crate::report::format_run_summary(&summary, &tables));
    println!("{}", crate::report::format_tables(&tables));

    if output.plot_enabled() {
        for table in &tables {
            println!("{}", crate::plot::render_ice_plot(table, output.width, output.height));
        }
    }

    write_exports(output, &summary, handle.status(), &tables)?;

    match outcome {
        Ok(result) => {
            if result.status == JobStatus::Cancelled {
                warn!(completed = tables.len(), "Run was cancelled before all columns finished");
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn write_exports(
    output: &OutputArgs,
    summary: &RunSummary<'_>,
    status: JobStatus,
    tables: &[IceTable],
) -> Result<(), AppError> {
    if let Some(path) = &output.export {
        let report = IceReportFile {
            tool: "ice".to_string(),
            generated_at: Utc::now(),
            model: summary.model.to_string(),
            dataset: summary.dataset.to_string(),
            row: summary.row,
            nbins: summary.nbins,
            status,
            tables: tables.to_vec(),
        };
        crate::io::write_report_json(path, &report)?;
        info!(path = %path.display(), "Wrote report JSON");
    }
    if let Some(dir) = &output.export_csv {
        let paths = crate::io::write_tables_csv(dir, tables)?;
        info!(dir = %dir.display(), files = paths.len(), "Wrote table CSVs");
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.tables)?;

    let selected: Vec<&IceTable> = report
        .tables
        .iter()
        .filter(|t| args.column.as_deref().is_none_or(|c| t.column() == c))
        .collect();
    if selected.is_empty() {
        return Err(AppError::invalid(match &args.column {
            Some(c) => format!("Report has no table for column '{c}'."),
            None => "Report contains no tables.".to_string(),
        }));
    }

    println!(
        "Report: model={} dataset={} row={} status={}",
        report.model,
        report.dataset,
        report.row,
        report.status.display_name()
    );
    for table in selected {
        println!("{}", crate::plot::render_ice_plot(table, args.width, args.height));
    }
    Ok(())
}
