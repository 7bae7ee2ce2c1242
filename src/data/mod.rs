//! Data ingestion
//!
//! CSV loading for the Pokémon and combats tables, and name resolution.

pub mod loader;
pub mod lookup;

pub use loader::{load_combats, Pokedex};
pub use lookup::NameLookup;
