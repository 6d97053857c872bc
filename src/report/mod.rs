//! Reporting utilities: formatted terminal output for ICE runs.

pub mod format;

pub use format::*;
