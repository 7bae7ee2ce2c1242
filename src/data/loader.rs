//! CSV loading for the Pokémon and combats tables
//!
//! Upstream column names are mapped onto typed records here; nothing else in
//! the crate sees the raw headers.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::{BaseStats, BattleError, Combat, Pokemon, PokemonId, Result};

/// Raw row of `pokemon.csv`
#[derive(Debug, Deserialize)]
struct PokemonRow {
    #[serde(rename = "#")]
    id: u32,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Type 1")]
    type1: String,
    #[serde(rename = "Type 2", default)]
    type2: Option<String>,
    #[serde(rename = "HP")]
    hp: u16,
    #[serde(rename = "Attack")]
    attack: u16,
    #[serde(rename = "Defense")]
    defense: u16,
    #[serde(rename = "Sp. Atk")]
    sp_atk: u16,
    #[serde(rename = "Sp. Def")]
    sp_def: u16,
    #[serde(rename = "Speed")]
    speed: u16,
    #[serde(rename = "Generation")]
    generation: u8,
    #[serde(rename = "Legendary", deserialize_with = "deserialize_flag")]
    legendary: bool,
}

impl From<PokemonRow> for Pokemon {
    fn from(row: PokemonRow) -> Self {
        Pokemon {
            id: PokemonId(row.id),
            name: row.name.unwrap_or_default(),
            primary_type: row.type1,
            secondary_type: row.type2.filter(|t| !t.trim().is_empty()),
            stats: BaseStats {
                hp: row.hp,
                attack: row.attack,
                defense: row.defense,
                sp_atk: row.sp_atk,
                sp_def: row.sp_def,
                speed: row.speed,
            },
            generation: row.generation,
            legendary: row.legendary,
        }
    }
}

/// Raw row of `combats.csv`
#[derive(Debug, Deserialize)]
struct CombatRow {
    #[serde(rename = "First_pokemon")]
    first: u32,
    #[serde(rename = "Second_pokemon")]
    second: u32,
    #[serde(rename = "Winner")]
    winner: u32,
}

/// Accepts `True`/`False` in any case, plus `1`/`0`
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid Legendary value: {}",
            other
        ))),
    }
}

/// The Pokémon table, indexed by Pokédex number
#[derive(Debug, Clone, Default)]
pub struct Pokedex {
    entries: Vec<Pokemon>,
    index: HashMap<PokemonId, usize>,
}

impl Pokedex {
    /// Build from records, rejecting repeated ids
    pub fn from_pokemon(entries: Vec<Pokemon>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, p) in entries.iter().enumerate() {
            if index.insert(p.id, i).is_some() {
                return Err(BattleError::DuplicatePokemon(p.id));
            }
        }
        Ok(Pokedex { entries, index })
    }

    /// Load `pokemon.csv`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            BattleError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        let pokedex = Self::from_reader(file)?;
        log::info!("Loaded {} Pokémon from {}", pokedex.len(), path.display());
        Ok(pokedex)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
        let entries = rdr
            .deserialize::<PokemonRow>()
            .map(|row| row.map(Pokemon::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_pokemon(entries)
    }

    pub fn get(&self, id: PokemonId) -> Option<&Pokemon> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    /// Like `get`, but a missing id is an error
    pub fn require(&self, id: PokemonId) -> Result<&Pokemon> {
        self.get(id).ok_or(BattleError::PokemonNotFound(id))
    }

    pub fn contains(&self, id: PokemonId) -> bool {
        self.index.contains_key(&id)
    }

    /// Entries in file order
    pub fn iter(&self) -> impl Iterator<Item = &Pokemon> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load `combats.csv`
pub fn load_combats<P: AsRef<Path>>(path: P) -> Result<Vec<Combat>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        BattleError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let combats = combats_from_reader(file)?;
    log::info!("Loaded {} combats from {}", combats.len(), path.display());
    Ok(combats)
}

pub fn combats_from_reader<R: Read>(reader: R) -> Result<Vec<Combat>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut combats = Vec::new();
    for row in rdr.deserialize::<CombatRow>() {
        let row = row?;
        combats.push(Combat {
            first: PokemonId(row.first),
            second: PokemonId(row.second),
            winner: PokemonId(row.winner),
        });
    }
    Ok(combats)
}
