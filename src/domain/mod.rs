//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - result tables (`IceTable`, `IceRow`, `GridValue`)
//! - job lifecycle status (`JobStatus`)
//! - shared defaults

pub mod types;

pub use types::*;
