//! ICE job lifecycle.
//!
//! `IceJob::new` validates parameters and resolves the column list; nothing is
//! locked or dispatched until `start`. `start` takes the run-level lock on the
//! output and the write lock on the dataset, then runs the driver on its own
//! thread. Teardown always releases the dataset lock, then the run-level lock,
//! then discards the scoring metrics this job attached to the model.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::data::{Dataset, LockGuard};
use crate::domain::{DEFAULT_MAX_FEATURES, DEFAULT_NBINS, IceTable, JobStatus, MAX_NBINS};
use crate::error::AppError;
use crate::ice::driver::{DriverOutcome, IceDriver};
use crate::ice::grid::ColumnSummary;
use crate::ice::output::IceOutput;
use crate::ice::pool::TaskPool;
use crate::models::Model;
use crate::runtime::Job;

/// Caller-supplied run parameters.
#[derive(Clone)]
pub struct IceParams {
    pub model: Arc<dyn Model>,
    pub dataset: Arc<Dataset>,
    pub row: usize,
    /// Columns to sweep; `None` asks the model for its most important features.
    pub columns: Option<Vec<String>>,
    pub nbins: usize,
    pub max_features: usize,
    /// Worker ceiling; `None` uses every available core.
    pub threads: Option<usize>,
}

impl IceParams {
    pub fn new(model: Arc<dyn Model>, dataset: Arc<Dataset>, row: usize) -> Self {
        Self {
            model,
            dataset,
            row,
            columns: None,
            nbins: DEFAULT_NBINS,
            max_features: DEFAULT_MAX_FEATURES,
            threads: None,
        }
    }

    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_nbins(mut self, nbins: usize) -> Self {
        self.nbins = nbins;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
}

/// A validated, not yet started ICE run.
pub struct IceJob {
    model: Arc<dyn Model>,
    dataset: Arc<Dataset>,
    row: usize,
    columns: Vec<String>,
    nbins: usize,
    threads: Option<usize>,
    job: Arc<Job>,
}

impl IceJob {
    pub fn new(params: IceParams) -> Result<Self, AppError> {
        let IceParams {
            model,
            dataset,
            row,
            columns,
            nbins,
            max_features,
            threads,
        } = params;

        let category = model.category();
        if !category.is_supervised() || category.nclasses() > 2 {
            return Err(AppError::invalid(
                "Individual Conditional Expectation plots are only implemented for regression and binomial classification models",
            ));
        }

        let columns = match columns {
            Some(cols) => cols,
            None => {
                let fi = model.feature_importance().ok_or_else(|| {
                    AppError::invalid(format!(
                        "No columns given and model {} cannot rank its features.",
                        model.key()
                    ))
                })?;
                let cols = fi.most_important_features(max_features);
                info!("Selecting the top {} features from the model's variable importances", cols.len());
                cols
            }
        };
        if columns.is_empty() {
            return Err(AppError::invalid("No columns to compute ICE curves for."));
        }
        if !(2..=MAX_NBINS).contains(&nbins) {
            return Err(AppError::invalid(format!("nbins must be between 2 and {MAX_NBINS}, got {nbins}.")));
        }
        if threads == Some(0) {
            return Err(AppError::invalid("Worker count must be >= 1."));
        }

        {
            let frame = dataset.read();
            if row >= frame.nrows() {
                return Err(AppError::invalid(format!(
                    "Row {row} is out of range for dataset {} with {} rows.",
                    dataset.key(),
                    frame.nrows()
                )));
            }
            for name in &columns {
                let column = frame.column(name).ok_or_else(|| {
                    AppError::invalid(format!("Column '{name}' not found in dataset {}.", dataset.key()))
                })?;
                let summary = ColumnSummary::from_column(column)?;
                if let Some(cardinality) = summary.cardinality() {
                    if cardinality > nbins {
                        return Err(AppError::invalid(format!(
                            "Column {name}'s cardinality of {cardinality} > nbins of {nbins}"
                        )));
                    }
                }
            }
        }

        let job = Job::new(format!("IndividualConditionalExpectation of model {}", model.key()));
        Ok(Self {
            model,
            dataset,
            row,
            columns,
            nbins,
            threads,
            job,
        })
    }

    pub fn key(&self) -> &str {
        self.job.key()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Take the locks and run the driver in the background.
    pub fn start(self) -> Result<IceHandle, AppError> {
        let output = IceOutput::new(format!("ice_{}", self.job.key()));
        let output_lock = LockGuard::acquire(Arc::clone(&output), self.job.key())?;
        let dataset_lock = self.dataset.write_lock(self.job.key())?;
        let pool = TaskPool::new(self.threads)?;

        let teardown = Teardown {
            dataset_lock: Some(dataset_lock),
            output_lock: Some(output_lock),
            model: Arc::clone(&self.model),
            job_key: self.job.key().to_string(),
        };

        self.job.start(self.columns.len() as u64);
        info!(
            job = self.job.key(),
            model = self.model.key(),
            row = self.row,
            columns = self.columns.len(),
            nbins = self.nbins,
            workers = pool.workers(),
            "ICE job started"
        );

        let job = Arc::clone(&self.job);
        let thread_output = Arc::clone(&output);
        let thread = match std::thread::Builder::new()
            .name(format!("ice-{}", self.job.key()))
            .spawn(move || run_job(self, pool, thread_output, teardown))
        {
            Ok(thread) => thread,
            Err(e) => return Err(start_failed(&job, e)),
        };

        Ok(IceHandle {
            job,
            output,
            thread: Some(thread),
            result: None,
        })
    }

    /// Start and block until the run reaches a terminal state.
    pub fn run(self) -> Result<IceResult, AppError> {
        self.start()?.wait()
    }
}

/// Releases everything a running job holds, in order, exactly once.
struct Teardown {
    dataset_lock: Option<LockGuard<Dataset>>,
    output_lock: Option<LockGuard<IceOutput>>,
    model: Arc<dyn Model>,
    job_key: String,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if let Some(lock) = self.dataset_lock.take() {
            lock.release();
        }
        if let Some(lock) = self.output_lock.take() {
            lock.release();
        }
        let discarded = self.model.metrics().discard(&self.job_key);
        tracing::debug!(job = %self.job_key, discarded, "released ICE locks and scoring metrics");
    }
}

/// The driver never ran; the teardown went down with the unspawned closure.
fn start_failed(job: &Job, e: std::io::Error) -> AppError {
    let err = AppError::io(format!("Failed to spawn ICE driver thread: {e}"));
    job.finish(JobStatus::Failed, Some(err.clone()));
    warn!(job = job.key(), error = %err, "ICE job failed to start");
    err
}

fn run_job(ice: IceJob, pool: TaskPool, output: Arc<IceOutput>, teardown: Teardown) -> Result<DriverOutcome, AppError> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut driver = IceDriver::new(
            &ice.job,
            ice.model.as_ref(),
            &ice.dataset,
            ice.row,
            &ice.columns,
            ice.nbins,
            &pool,
            &output,
        );
        driver.run()
    }))
    .unwrap_or_else(|_| Err(AppError::scoring("ICE driver panicked.")));

    drop(teardown);

    match &result {
        Ok(DriverOutcome::Done) => {
            ice.job.finish(JobStatus::Done, None);
            info!(job = ice.job.key(), tables = output.len(), "ICE job finished");
        }
        Ok(DriverOutcome::Cancelled { completed }) => {
            ice.job.finish(JobStatus::Cancelled, None);
            warn!(job = ice.job.key(), completed, "ICE job cancelled");
        }
        Err(e) => {
            ice.job.finish(JobStatus::Failed, Some(e.clone()));
            warn!(job = ice.job.key(), error = %e, "ICE job failed");
        }
    }
    result
}

/// Terminal result of a finished run.
#[derive(Debug, Clone)]
pub struct IceResult {
    pub status: JobStatus,
    pub tables: Vec<IceTable>,
}

/// Caller's view of a started job.
pub struct IceHandle {
    job: Arc<Job>,
    output: Arc<IceOutput>,
    thread: Option<JoinHandle<Result<DriverOutcome, AppError>>>,
    result: Option<Result<IceResult, AppError>>,
}

impl IceHandle {
    pub fn key(&self) -> &str {
        self.job.key()
    }

    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    pub fn output(&self) -> &Arc<IceOutput> {
        &self.output
    }

    /// Fraction of columns completed.
    pub fn progress(&self) -> f64 {
        self.job.progress()
    }

    pub fn status(&self) -> JobStatus {
        self.job.status()
    }

    /// Ask the driver to stop after the column in flight.
    pub fn cancel(&self) {
        self.job.request_stop();
    }

    /// Tables assembled so far (complete or not).
    pub fn tables(&self) -> Vec<IceTable> {
        self.output.snapshot()
    }

    /// Block until the job is terminal. Failed runs return the originating error;
    /// tables finished before the failure stay available through `tables()`.
    pub fn wait(&mut self) -> Result<IceResult, AppError> {
        if let Some(thread) = self.thread.take() {
            let outcome = thread
                .join()
                .unwrap_or_else(|_| Err(AppError::scoring("ICE driver thread panicked.")));
            self.result = Some(outcome.map(|o| IceResult {
                status: match o {
                    DriverOutcome::Done => JobStatus::Done,
                    DriverOutcome::Cancelled { .. } => JobStatus::Cancelled,
                },
                tables: self.output.snapshot(),
            }));
        }
        self.result
            .clone()
            .unwrap_or_else(|| Err(AppError::scoring("ICE job never ran.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn spawn_failure_leaves_the_job_failed() {
        let job = Job::new("ICE test");
        job.start(3);
        assert_eq!(job.status(), JobStatus::Running);

        let err = start_failed(&job, std::io::Error::other("no threads left"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().map(|e| e.kind()), Some(ErrorKind::Io));
    }
}
