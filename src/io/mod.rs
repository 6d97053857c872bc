//! Input/output helpers.
//!
//! - CSV ingest into a `Frame` (`ingest`)
//! - per-table CSV exports (`export`)
//! - run report JSON read/write (`tables`)

pub mod export;
pub mod ingest;
pub mod tables;

pub use export::*;
pub use ingest::*;
pub use tables::*;
