//! Dataset side of the engine: frames, the keyed lockable dataset, and demo data.

pub mod dataset;
pub mod frame;
pub mod lock;
pub mod sample;

pub use dataset::*;
pub use frame::*;
pub use lock::*;
pub use sample::{SampleConfig, SampleData, generate_sample};
