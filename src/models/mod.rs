//! Model capabilities consumed by the ICE engine.
//!
//! - `model`: the `Model` trait, scoring input/output shapes, the optional
//!   feature-importance capability, and per-model scoring metrics
//! - `glm`: a concrete Gaussian/binomial GLM loadable from JSON

pub mod glm;
pub mod model;

pub use glm::*;
pub use model::*;
