//! Exploratory analysis of the Pokémon table
//!
//! Independent of the model: stat histograms and a correlation heatmap.

pub mod charts;
pub mod stats;

pub use charts::write_figures;
pub use stats::{correlation_matrix, format_correlation_table, pearson, Histogram};
