//! Training summary

use std::fmt;

/// What a training run produced
#[derive(Debug, Clone, Default)]
pub struct TrainingSummary {
    pub combats: usize,
    pub samples: usize,
    pub skipped: usize,
    pub unlisted_winners: usize,
    /// Share of samples won by the first Pokémon
    pub first_win_rate: f64,
    pub n_trees: usize,
    pub mean_depth: f64,
    /// Accuracy on the training samples themselves
    pub train_accuracy: f64,
    pub oob_accuracy: Option<f64>,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Combats:        {}", self.combats)?;
        writeln!(f, "  Samples:        {}", self.samples)?;
        if self.skipped > 0 {
            writeln!(f, "  Skipped:        {}", self.skipped)?;
        }
        if self.unlisted_winners > 0 {
            writeln!(f, "  Odd winners:    {}", self.unlisted_winners)?;
        }
        writeln!(f, "  First wins:     {:.1}%", self.first_win_rate * 100.0)?;
        writeln!(f, "  Trees:          {}", self.n_trees)?;
        writeln!(f, "  Mean depth:     {:.1}", self.mean_depth)?;
        writeln!(f, "  Train accuracy: {:.1}%", self.train_accuracy * 100.0)?;
        match self.oob_accuracy {
            Some(acc) => write!(f, "  OOB accuracy:   {:.1}%", acc * 100.0),
            None => write!(f, "  OOB accuracy:   n/a"),
        }
    }
}
