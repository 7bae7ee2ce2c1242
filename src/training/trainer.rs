//! Forest training pipeline
//!
//! combats -> stat-difference samples -> random forest -> model artifact.

use crate::data::{load_combats, Pokedex};
use crate::features::{build_training_set, MissingCombatant};
use crate::model::{ForestParams, RandomForest};
use crate::predict::ModelArtifact;
use crate::training::metrics::TrainingSummary;
use crate::{BattleError, Combat, Config, Result, Stat};

pub struct Trainer {
    params: ForestParams,
    on_missing: MissingCombatant,
}

impl Trainer {
    pub fn new(params: ForestParams, on_missing: MissingCombatant) -> Self {
        Trainer { params, on_missing }
    }

    pub fn from_config(config: &Config) -> Self {
        let on_missing = if config.training.strict_combats {
            MissingCombatant::Fail
        } else {
            MissingCombatant::Skip
        };
        Self::new(ForestParams::from(&config.forest), on_missing)
    }

    /// Fit a forest on the given tables
    pub fn train(
        &self,
        pokedex: &Pokedex,
        combats: &[Combat],
    ) -> Result<(ModelArtifact, TrainingSummary)> {
        let set = build_training_set(pokedex, combats, self.on_missing)?;
        if set.is_empty() {
            return Err(BattleError::NoTrainingData {
                combats: combats.len(),
            });
        }

        let (forest, report) = RandomForest::fit(&set.features, &set.labels, self.params)?;
        let train_accuracy = forest.accuracy(&set.features, &set.labels)?;
        match report.oob_accuracy {
            Some(acc) => log::info!(
                "Training accuracy {:.1}%, out-of-bag accuracy {:.1}%",
                train_accuracy * 100.0,
                acc * 100.0
            ),
            None => log::info!("Training accuracy {:.1}%", train_accuracy * 100.0),
        }

        let summary = TrainingSummary {
            combats: combats.len(),
            samples: set.len(),
            skipped: set.skipped,
            unlisted_winners: set.unlisted_winners,
            first_win_rate: set.first_win_rate(),
            n_trees: forest.n_trees(),
            mean_depth: report.mean_depth,
            train_accuracy,
            oob_accuracy: report.oob_accuracy,
        };
        let artifact =
            ModelArtifact::new(&Stat::ALL, forest, set.len(), set.skipped, report.oob_accuracy);

        Ok((artifact, summary))
    }

    /// Load the configured tables, train and write the model file
    pub fn run(&self, config: &Config) -> Result<TrainingSummary> {
        let pokedex = Pokedex::load(&config.data.pokemon_path)?;
        let combats = load_combats(&config.data.combats_path)?;
        let (artifact, summary) = self.train(&pokedex, &combats)?;
        artifact.save(&config.data.model_path)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BaseStats, Pokemon, PokemonId};

    fn pokemon(id: u32, value: u16) -> Pokemon {
        Pokemon {
            id: PokemonId(id),
            name: format!("P{}", id),
            primary_type: "Normal".to_string(),
            secondary_type: None,
            stats: BaseStats::uniform(value),
            generation: 1,
            legendary: false,
        }
    }

    fn combat(first: u32, second: u32, winner: u32) -> Combat {
        Combat {
            first: PokemonId(first),
            second: PokemonId(second),
            winner: PokemonId(winner),
        }
    }

    fn small_trainer() -> Trainer {
        Trainer::new(
            ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
            MissingCombatant::Skip,
        )
    }

    #[test]
    fn test_no_valid_pairs_fails() {
        let dex = Pokedex::from_pokemon(vec![pokemon(1, 50), pokemon(2, 80)]).unwrap();
        let combats = vec![combat(10, 11, 10), combat(12, 1, 1)];
        let err = small_trainer().train(&dex, &combats).unwrap_err();
        assert!(matches!(err, BattleError::NoTrainingData { combats: 2 }));
    }

    #[test]
    fn test_stronger_side_learned() {
        let dex = Pokedex::from_pokemon((1..=10).map(|i| pokemon(i, i as u16 * 10)).collect())
            .unwrap();
        let mut combats = Vec::new();
        for a in 1..=10u32 {
            for b in 1..=10u32 {
                if a != b {
                    combats.push(combat(a, b, a.max(b)));
                }
            }
        }
        combats.push(combat(1, 404, 1));

        let (artifact, summary) = small_trainer().train(&dex, &combats).unwrap();
        assert_eq!(summary.samples, 90);
        assert_eq!(summary.skipped, 1);
        assert!((summary.first_win_rate - 0.5).abs() < 1e-12);
        assert!(summary.train_accuracy > 0.95);
        assert_eq!(artifact.training_samples, 90);
        assert_eq!(artifact.skipped_combats, 1);
        assert_eq!(artifact.forest.n_trees(), 10);
        assert_eq!(artifact.features, crate::STAT_NAMES);
    }

    #[test]
    fn test_strict_config_fails_on_unknown() {
        let mut config = Config::default();
        config.training.strict_combats = true;
        config.forest.n_trees = 3;
        let dex = Pokedex::from_pokemon(vec![pokemon(1, 50), pokemon(2, 80)]).unwrap();
        let err = Trainer::from_config(&config)
            .train(&dex, &[combat(1, 2, 2), combat(1, 9, 9)])
            .unwrap_err();
        assert!(matches!(err, BattleError::MissingCombatant { row: 1, .. }));
    }

    #[test]
    fn test_run_writes_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let pokemon_path = dir.path().join("pokemon.csv");
        let combats_path = dir.path().join("combats.csv");
        std::fs::write(
            &pokemon_path,
            "#,Name,Type 1,Type 2,HP,Attack,Defense,Sp. Atk,Sp. Def,Speed,Generation,Legendary\n\
             1,Alpha,Normal,,50,50,50,50,50,50,1,False\n\
             2,Beta,Normal,,80,80,80,80,80,80,1,False\n",
        )
        .unwrap();
        std::fs::write(&combats_path, "First_pokemon,Second_pokemon,Winner\n1,2,2\n").unwrap();

        let mut config = Config::default();
        config.data.pokemon_path = pokemon_path.display().to_string();
        config.data.combats_path = combats_path.display().to_string();
        config.data.model_path = dir.path().join("model.json").display().to_string();
        config.forest.n_trees = 5;

        let summary = Trainer::from_config(&config).run(&config).unwrap();
        assert_eq!(summary.samples, 1);

        let artifact = ModelArtifact::load(&config.data.model_path).unwrap();
        assert_eq!(artifact.forest.n_trees(), 5);
    }
}
