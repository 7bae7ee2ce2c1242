//! Classifier
//!
//! Decision trees and the random forest built from them.

pub mod forest;
pub mod tree;

pub use forest::{FitReport, ForestParams, RandomForest};
pub use tree::{DecisionTree, TreeParams};
