//! Prediction and inference
//!
//! Load trained models and predict battles or score single Pokémon.

pub mod artifact;
pub mod inference;

pub use artifact::{ModelArtifact, FORMAT_VERSION};
pub use inference::{worth_it_score, BattlePrediction, Predictor, Scorer};
