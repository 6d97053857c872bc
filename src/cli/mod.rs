//! Command-line parsing for the ICE engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the engine code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_MAX_FEATURES, DEFAULT_NBINS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ice", version, about = "Individual Conditional Expectation curves for one row of data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute ICE tables for a CSV dataset and a GLM model file.
    Run(RunArgs),
    /// Compute ICE tables on a generated sample dataset with a built-in model.
    Demo(DemoArgs),
    /// Plot tables from a previously exported report JSON.
    Plot(PlotArgs),
}

/// Engine knobs shared by `run` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Columns to sweep (comma separated). Defaults to the model's most important features.
    #[arg(long, value_delimiter = ',')]
    pub cols: Vec<String>,

    /// Grid points per numeric column.
    #[arg(long, env = "ICE_NBINS", default_value_t = DEFAULT_NBINS)]
    pub nbins: usize,

    /// Worker threads for scoring (defaults to the number of CPUs).
    #[arg(long, env = "ICE_THREADS")]
    pub threads: Option<usize>,

    /// How many important features to sweep when `--cols` is omitted.
    #[arg(long, env = "ICE_TOP_FEATURES", default_value_t = DEFAULT_MAX_FEATURES)]
    pub max_features: usize,
}

impl EngineArgs {
    /// `None` when no columns were named on the command line.
    pub fn columns(&self) -> Option<Vec<String>> {
        let cols: Vec<String> = self
            .cols
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        (!cols.is_empty()).then_some(cols)
    }
}

/// Terminal and file output options.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Render ASCII plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,

    /// Export the run (parameters + tables) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export one CSV per table into this directory.
    #[arg(long = "export-csv", value_name = "DIR")]
    pub export_csv: Option<PathBuf>,
}

impl OutputArgs {
    pub fn plot_enabled(&self) -> bool {
        self.plot && !self.no_plot
    }
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Input CSV with a header row.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// GLM model JSON file.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Zero-based row of the dataset to explain.
    #[arg(long)]
    pub row: usize,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of synthetic rows to generate.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub rows: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Zero-based row of the sample to explain.
    #[arg(long, default_value_t = 0)]
    pub row: usize,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for plotting a saved report.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Report JSON produced by `ice run --export`.
    #[arg(long, value_name = "JSON")]
    pub tables: PathBuf,

    /// Only plot this column.
    #[arg(long)]
    pub column: Option<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,
}
