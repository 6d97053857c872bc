//! Minimal job runtime: identity, progress counters, cooperative stop flag,
//! and terminal status bookkeeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::JobStatus;
use crate::error::AppError;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct Job {
    key: String,
    description: String,
    work: AtomicU64,
    worked: AtomicU64,
    stop_requested: AtomicBool,
    state: Mutex<JobState>,
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
    error: Option<AppError>,
}

impl Job {
    pub fn new(description: impl Into<String>) -> Arc<Self> {
        let id = NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed);
        Arc::new(Self {
            key: format!("job_{id}"),
            description: description.into(),
            work: AtomicU64::new(0),
            worked: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(JobState {
                status: JobStatus::Created,
                started: None,
                finished: None,
                error: None,
            }),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Mark the job running with `work` total units.
    pub fn start(&self, work: u64) {
        self.work.store(work, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.status = JobStatus::Running;
        state.started = Some(Utc::now());
    }

    pub fn update(&self, units: u64) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }

    pub fn worked(&self) -> u64 {
        self.worked.load(Ordering::SeqCst)
    }

    pub fn work(&self) -> u64 {
        self.work.load(Ordering::SeqCst)
    }

    /// Completed fraction in `[0, 1]`; a job with no work is complete once terminal.
    pub fn progress(&self) -> f64 {
        let work = self.work();
        if work == 0 {
            return if self.status().is_terminal() { 1.0 } else { 0.0 };
        }
        (self.worked() as f64 / work as f64).min(1.0)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn finish(&self, status: JobStatus, error: Option<AppError>) {
        let mut state = self.state.lock();
        state.status = status;
        state.finished = Some(Utc::now());
        state.error = error;
    }

    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    pub fn error(&self) -> Option<AppError> {
        self.state.lock().error.clone()
    }

    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.state.lock().started
    }

    /// Run time so far, or total run time once finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let state = self.state.lock();
        let started = state.started?;
        Some(state.finished.unwrap_or_else(Utc::now) - started)
    }
}
