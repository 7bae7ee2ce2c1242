//! Name lookup and identifier resolution
//!
//! User input is either a Pokédex number or a name. Names are matched after
//! trimming and lowercasing; a name shared by several rows (Mega evolutions
//! in some exports) resolves to the first row that carries it.

use std::collections::HashMap;

use crate::data::Pokedex;
use crate::{BattleError, PokemonId, Result};

/// Normalized name -> first-seen Pokédex number
#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    names: HashMap<String, PokemonId>,
}

impl NameLookup {
    pub fn build(pokedex: &Pokedex) -> Self {
        let mut names = HashMap::with_capacity(pokedex.len());
        for p in pokedex.iter() {
            let key = normalize_name(&p.name);
            if key.is_empty() {
                continue;
            }
            names.entry(key).or_insert(p.id);
        }
        NameLookup { names }
    }

    pub fn get(&self, name: &str) -> Option<PokemonId> {
        self.names.get(&normalize_name(name)).copied()
    }

    /// Resolve a name or Pokédex number to an id present in `pokedex`
    pub fn resolve(&self, token: &str, pokedex: &Pokedex) -> Result<PokemonId> {
        let id = if is_numeric(token) {
            token
                .parse::<u32>()
                .map(PokemonId)
                .map_err(|_| BattleError::UnknownPokemon(token.to_string()))?
        } else {
            self.get(token)
                .ok_or_else(|| BattleError::UnknownPokemon(token.to_string()))?
        };

        if !pokedex.contains(id) {
            return Err(BattleError::PokemonNotFound(id));
        }
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Digits only, no surrounding whitespace
fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
