//! Battle prediction and worth-it scoring

use crate::data::{NameLookup, Pokedex};
use crate::features::stat_diff;
use crate::predict::ModelArtifact;
use crate::{Pokemon, PokemonId, Result, Stat};

/// Outcome of a predicted battle
#[derive(Debug, Clone, PartialEq)]
pub struct BattlePrediction {
    pub first: PokemonId,
    pub second: PokemonId,
    pub winner: PokemonId,
    pub winner_name: String,
    /// Forest probability that the first Pokémon wins
    pub first_win_prob: f64,
}

impl BattlePrediction {
    /// Probability assigned to the predicted winner
    pub fn confidence(&self) -> f64 {
        if self.winner == self.first {
            self.first_win_prob
        } else {
            1.0 - self.first_win_prob
        }
    }
}

/// Worth-it score: mean of the six base stats
pub fn worth_it_score(pokemon: &Pokemon) -> f64 {
    pokemon.stats.mean()
}

/// Resolves user input against the Pokémon table and scores it
pub struct Scorer<'a> {
    pokedex: &'a Pokedex,
    lookup: &'a NameLookup,
}

impl<'a> Scorer<'a> {
    pub fn new(pokedex: &'a Pokedex, lookup: &'a NameLookup) -> Self {
        Scorer { pokedex, lookup }
    }

    pub fn score(&self, token: &str) -> Result<f64> {
        let id = self.lookup.resolve(token, self.pokedex)?;
        Ok(worth_it_score(self.pokedex.require(id)?))
    }
}

/// Predictor for battle outcomes
pub struct Predictor {
    artifact: ModelArtifact,
    order: Vec<Stat>,
    pokedex: Pokedex,
    lookup: NameLookup,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact, pokedex: Pokedex) -> Result<Self> {
        let order = artifact.feature_order()?;
        let lookup = NameLookup::build(&pokedex);
        log::debug!(
            "Predictor ready: {} trees, features {:?}, {} names indexed",
            artifact.forest.n_trees(),
            artifact.features,
            lookup.len()
        );
        Ok(Predictor {
            artifact,
            order,
            pokedex,
            lookup,
        })
    }

    /// Predict a battle between two names or Pokédex numbers
    pub fn predict(&self, first: &str, second: &str) -> Result<BattlePrediction> {
        let first = self.resolve(first)?;
        let second = self.resolve(second)?;
        self.predict_ids(first, second)
    }

    pub fn predict_ids(&self, first: PokemonId, second: PokemonId) -> Result<BattlePrediction> {
        let a = self.pokedex.require(first)?;
        let b = self.pokedex.require(second)?;

        let diff = stat_diff(a, b, &self.order);
        let first_win_prob = self.artifact.forest.predict_proba(&diff)?;
        let winner = if first_win_prob > 0.5 { a } else { b };

        Ok(BattlePrediction {
            first,
            second,
            winner: winner.id,
            winner_name: winner.name.clone(),
            first_win_prob,
        })
    }

    /// Worth-it score for a name or Pokédex number
    pub fn score(&self, token: &str) -> Result<f64> {
        Scorer::new(&self.pokedex, &self.lookup).score(token)
    }

    pub fn resolve(&self, token: &str) -> Result<PokemonId> {
        self.lookup.resolve(token, &self.pokedex)
    }
}

/// The line printed for a prediction
pub fn format_prediction(first: &str, second: &str, prediction: &BattlePrediction) -> String {
    format!(
        "{} vs {} -> Predicted winner: {}",
        first, second, prediction.winner_name
    )
}

/// The line printed for a score
pub fn format_score(token: &str, score: f64) -> String {
    format!("Worth-it score for {}: {:.2}", token, score)
}
