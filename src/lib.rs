//! `ice-curves` library crate.
//!
//! Computes Individual Conditional Expectation tables: for one row of a
//! dataset, sweep each chosen column over a grid of values and record how the
//! model's prediction responds.
//!
//! The binary (`ice`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the engine can be embedded behind other front ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod ice;
pub mod io;
pub mod models;
pub mod plot;
pub mod report;
pub mod runtime;
