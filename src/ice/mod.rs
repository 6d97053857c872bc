//! Individual Conditional Expectation engine.
//!
//! Responsibilities:
//!
//! - derive a value grid per column (`grid`)
//! - re-score the model with one column overridden per grid point (`task`)
//! - fan scoring tasks out over a bounded worker pool and join them (`pool`)
//! - walk the selected columns, assemble tables, report progress (`driver`)
//! - validate parameters, hold locks for the run, expose the job (`job`)

pub mod driver;
pub mod grid;
pub mod job;
pub mod output;
pub mod pool;
pub mod task;

pub use driver::*;
pub use grid::*;
pub use job::*;
pub use output::*;
pub use pool::*;
pub use task::*;
