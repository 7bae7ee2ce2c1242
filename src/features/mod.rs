//! Feature extraction
//!
//! Converts Pokémon pairs into model-ready difference vectors.

pub mod stat_diff;

pub use stat_diff::{build_training_set, stat_diff, MissingCombatant, TrainingSet};
