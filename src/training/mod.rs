//! Model training
//!
//! Feature building, forest fitting and the run summary.

pub mod metrics;
pub mod trainer;

pub use metrics::TrainingSummary;
pub use trainer::Trainer;
