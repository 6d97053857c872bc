//! Column loop of an ICE run.
//!
//! Columns are processed one at a time, in input order:
//! grid -> dispatch -> join -> assemble -> progress -> cancellation check.
//! Only one column's tasks are ever in flight. Cancellation is honored between
//! columns; tables already assembled stay in the output.

use tracing::{debug, trace};

use crate::data::Dataset;
use crate::domain::{IceRow, IceTable};
use crate::error::AppError;
use crate::ice::grid::{ColumnSummary, build_grid};
use crate::ice::output::IceOutput;
use crate::ice::pool::TaskPool;
use crate::ice::task::{ScoringTask, TaskContext};
use crate::models::{Model, ScoringInput};
use crate::runtime::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    ColumnLoop { column: usize },
    Grid,
    Dispatch,
    Join,
    Assemble,
    Done,
    Cancelled,
    Failed,
}

/// How a driver run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    Done,
    /// Stopped at a column boundary after `completed` columns.
    Cancelled { completed: usize },
}

pub struct IceDriver<'a> {
    job: &'a Job,
    model: &'a dyn Model,
    dataset: &'a Dataset,
    row: usize,
    columns: &'a [String],
    nbins: usize,
    pool: &'a TaskPool,
    output: &'a IceOutput,
    state: DriverState,
}

impl<'a> IceDriver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job: &'a Job,
        model: &'a dyn Model,
        dataset: &'a Dataset,
        row: usize,
        columns: &'a [String],
        nbins: usize,
        pool: &'a TaskPool,
        output: &'a IceOutput,
    ) -> Self {
        Self {
            job,
            model,
            dataset,
            row,
            columns,
            nbins,
            pool,
            output,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn run(&mut self) -> Result<DriverOutcome, AppError> {
        let result = self.run_columns();
        self.transition(match &result {
            Ok(DriverOutcome::Done) => DriverState::Done,
            Ok(DriverOutcome::Cancelled { .. }) => DriverState::Cancelled,
            Err(_) => DriverState::Failed,
        });
        result
    }

    fn transition(&mut self, next: DriverState) {
        trace!(job = self.job.key(), from = ?self.state, to = ?next, "driver transition");
        self.state = next;
    }

    fn run_columns(&mut self) -> Result<DriverOutcome, AppError> {
        let (job, model, dataset, pool, output) = (self.job, self.model, self.dataset, self.pool, self.output);
        let columns = self.columns;

        let template = {
            let frame = dataset.read();
            ScoringInput::from_frame_row(&frame, self.row)
                .ok_or_else(|| AppError::invalid(format!("Row {} is out of range.", self.row)))?
        };

        for (i, name) in columns.iter().enumerate() {
            self.transition(DriverState::ColumnLoop { column: i });
            debug!("Computing individual conditional expectation of model on '{name}'.");

            self.transition(DriverState::Grid);
            let summary = {
                let frame = dataset.read();
                let column = frame
                    .column(name)
                    .ok_or_else(|| AppError::invalid(format!("Column '{name}' not found in dataset.")))?;
                ColumnSummary::from_column(column)?
            };
            let grid = build_grid(&summary, self.nbins)?;
            debug!("ICE grid for column {name}: {:?}", grid.values);

            self.transition(DriverState::Dispatch);
            let tasks: Vec<ScoringTask> = grid
                .values
                .iter()
                .enumerate()
                .map(|(k, &v)| ScoringTask::new(k, v))
                .collect();
            let ctx = TaskContext {
                job_key: job.key(),
                model,
                template: &template,
                column: name,
                domain: grid.domain.as_deref(),
            };

            self.transition(DriverState::Join);
            let responses = pool.run_all(&tasks, |task| task.run(&ctx)).into_result()?;

            self.transition(DriverState::Assemble);
            let rows = responses
                .iter()
                .enumerate()
                .map(|(k, &response)| {
                    let value = grid
                        .render(k)
                        .ok_or_else(|| AppError::scoring(format!("Grid point {k} of '{name}' cannot be rendered.")))?;
                    Ok(IceRow { value, response })
                })
                .collect::<Result<Vec<_>, AppError>>()?;
            output.push(IceTable::new(
                model.key(),
                name,
                self.row,
                grid.value_type(),
                rows,
            ));

            job.update(1);
            if job.stop_requested() {
                return Ok(DriverOutcome::Cancelled { completed: i + 1 });
            }
        }

        Ok(DriverOutcome::Done)
    }
}
