//! Pokémon battle prediction
//!
//! A random forest over base-stat differences for predicting which of two
//! Pokémon wins a battle.

pub mod analysis;
pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pokédex number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PokemonId(pub u32);

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The six base stats, in feature order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    SpAtk,
    SpDef,
    Speed,
}

/// Feature names shared by the trainer and the predictor
pub const STAT_NAMES: [&str; 6] = ["hp", "attack", "defense", "sp_atk", "sp_def", "speed"];

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Attack,
        Stat::Defense,
        Stat::SpAtk,
        Stat::SpDef,
        Stat::Speed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Hp => "hp",
            Stat::Attack => "attack",
            Stat::Defense => "defense",
            Stat::SpAtk => "sp_atk",
            Stat::SpDef => "sp_def",
            Stat::Speed => "speed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Stat::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Base stats of a single Pokémon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_atk: u16,
    pub sp_def: u16,
    pub speed: u16,
}

impl BaseStats {
    /// All six stats set to the same value
    pub fn uniform(value: u16) -> Self {
        BaseStats {
            hp: value,
            attack: value,
            defense: value,
            sp_atk: value,
            sp_def: value,
            speed: value,
        }
    }

    pub fn get(&self, stat: Stat) -> u16 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::SpAtk => self.sp_atk,
            Stat::SpDef => self.sp_def,
            Stat::Speed => self.speed,
        }
    }

    pub fn total(&self) -> u32 {
        Stat::ALL.iter().map(|&s| self.get(s) as u32).sum()
    }

    /// Arithmetic mean of the six stats (the "worth-it" score)
    pub fn mean(&self) -> f64 {
        self.total() as f64 / Stat::ALL.len() as f64
    }
}

/// A Pokémon from the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: PokemonId,
    pub name: String,
    pub primary_type: String,
    pub secondary_type: Option<String>,
    pub stats: BaseStats,
    pub generation: u8,
    pub legendary: bool,
}

/// One historical battle result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub first: PokemonId,
    pub second: PokemonId,
    pub winner: PokemonId,
}

impl Combat {
    /// True if the first participant won
    pub fn first_won(&self) -> bool {
        self.winner == self.first
    }

    /// Returns the losing participant, or None if the winner took no part
    pub fn loser(&self) -> Option<PokemonId> {
        if self.winner == self.first {
            Some(self.second)
        } else if self.winner == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unknown Pokémon: {0}")]
    UnknownPokemon(String),

    #[error("Pokédex number {0} does not exist in the dataset")]
    PokemonNotFound(PokemonId),

    #[error("Duplicate Pokédex number {0} in the Pokémon table")]
    DuplicatePokemon(PokemonId),

    #[error("Model file not found at {path} - run `pokebattle train` first")]
    NoModel { path: String },

    #[error("Unsupported model format version {found} (expected {expected}) - retrain the model")]
    ArtifactVersion { found: u32, expected: u32 },

    #[error("Model was trained on unknown feature '{0}' - retrain the model")]
    UnknownFeature(String),

    #[error("Model file is malformed: {0} - retrain the model")]
    MalformedModel(String),

    #[error("No valid combats to train on: none of the {combats} combat rows reference known Pokémon")]
    NoTrainingData { combats: usize },

    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    #[error("Model expects {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Combat row {row} references unknown Pokémon {id}")]
    MissingCombatant { row: usize, id: PokemonId },

    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BattleError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub pokemon_path: String,
    pub combats_path: String,
    pub model_path: String,
    pub figures_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub min_samples_split: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fail instead of skipping combats that reference unknown Pokémon
    #[serde(default)]
    pub strict_combats: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            pokemon_path: "pokemon.csv".to_string(),
            combats_path: "combats.csv".to_string(),
            model_path: "pokemon_winner_model.json".to_string(),
            figures_dir: "figures".to_string(),
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 200,
            seed: 42,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BattleError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| BattleError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BattleError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.forest.n_trees == 0 {
            return Err(BattleError::Config("forest.n_trees must be at least 1".to_string()));
        }
        if self.forest.min_samples_split < 2 {
            return Err(BattleError::Config(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.forest.max_depth == Some(0) {
            return Err(BattleError::Config("forest.max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_names_match_order() {
        let names: Vec<&str> = Stat::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, STAT_NAMES);
        assert_eq!(Stat::from_name("sp_def"), Some(Stat::SpDef));
        assert_eq!(Stat::from_name("Sp. Def"), None);
    }

    #[test]
    fn test_base_stats_mean() {
        let stats = BaseStats {
            hp: 45,
            attack: 49,
            defense: 49,
            sp_atk: 65,
            sp_def: 65,
            speed: 45,
        };
        assert_eq!(stats.total(), 318);
        assert_eq!(stats.mean(), 53.0);
        assert_eq!(BaseStats::uniform(50).mean(), 50.0);
    }

    #[test]
    fn test_combat_loser() {
        let combat = Combat {
            first: PokemonId(1),
            second: PokemonId(2),
            winner: PokemonId(2),
        };
        assert!(!combat.first_won());
        assert_eq!(combat.loser(), Some(PokemonId(1)));

        let odd = Combat {
            winner: PokemonId(3),
            ..combat
        };
        assert_eq!(odd.loser(), None);
    }

    #[test]
    fn test_config_defaults_and_partial_toml() {
        let config = Config::parse("[forest]\nn_trees = 10\nseed = 7\nmin_samples_split = 2\n").unwrap();
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.max_depth, None);
        assert_eq!(config.data.model_path, "pokemon_winner_model.json");
        assert!(!config.training.strict_combats);
    }

    #[test]
    fn test_config_rejects_zero_trees() {
        let err = Config::parse("[forest]\nn_trees = 0\nseed = 7\nmin_samples_split = 2\n");
        assert!(matches!(err, Err(BattleError::Config(_))));
    }

    #[test]
    fn test_config_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.forest.n_trees, 200);
        assert_eq!(parsed.forest.seed, 42);
    }
}
