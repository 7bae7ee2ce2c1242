//! Stat-difference features
//!
//! A battle is described by the first Pokémon's base stats minus the
//! second's, in a fixed stat order. The label is 1 when the first Pokémon won.

use crate::data::Pokedex;
use crate::{BattleError, Combat, Pokemon, Result, Stat};

/// Difference vector `first - second` over `order`
pub fn stat_diff(first: &Pokemon, second: &Pokemon, order: &[Stat]) -> Vec<f64> {
    order
        .iter()
        .map(|&s| first.stats.get(s) as f64 - second.stats.get(s) as f64)
        .collect()
}

/// What to do with a combat that references a Pokémon missing from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingCombatant {
    /// Drop the row and report the count
    #[default]
    Skip,
    /// Abort feature building
    Fail,
}

/// Feature matrix and labels built from historical combats
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
    /// Rows dropped because a participant was unknown
    pub skipped: usize,
    /// Rows whose winner was neither participant
    pub unlisted_winners: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fraction of samples where the first Pokémon won
    pub fn first_win_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().map(|&l| l as f64).sum::<f64>() / self.labels.len() as f64
    }
}

/// Build the training set in `Stat::ALL` order
pub fn build_training_set(
    pokedex: &Pokedex,
    combats: &[Combat],
    on_missing: MissingCombatant,
) -> Result<TrainingSet> {
    let order = Stat::ALL;
    let mut set = TrainingSet {
        features: Vec::with_capacity(combats.len()),
        labels: Vec::with_capacity(combats.len()),
        ..TrainingSet::default()
    };

    for (row, combat) in combats.iter().enumerate() {
        let (first, second) = match (pokedex.get(combat.first), pokedex.get(combat.second)) {
            (Some(a), Some(b)) => (a, b),
            (a, _) => {
                let id = if a.is_none() { combat.first } else { combat.second };
                if on_missing == MissingCombatant::Fail {
                    return Err(BattleError::MissingCombatant { row, id });
                }
                log::debug!("Skipping combat row {}: unknown Pokémon {}", row, id);
                set.skipped += 1;
                continue;
            }
        };

        if combat.loser().is_none() {
            set.unlisted_winners += 1;
        }

        set.features.push(stat_diff(first, second, &order));
        set.labels.push(u8::from(combat.first_won()));
    }

    if set.skipped > 0 {
        log::warn!(
            "Skipped {} of {} combats referencing unknown Pokémon",
            set.skipped,
            combats.len()
        );
    }
    if set.unlisted_winners > 0 {
        log::warn!(
            "{} combats record a winner that did not take part; labelled as second-player wins",
            set.unlisted_winners
        );
    }
    log::info!(
        "Built {} training samples (first player won {:.1}%)",
        set.len(),
        set.first_win_rate() * 100.0
    );

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BaseStats, PokemonId};

    fn pokemon(id: u32, stats: BaseStats) -> Pokemon {
        Pokemon {
            id: PokemonId(id),
            name: format!("P{}", id),
            primary_type: "Normal".to_string(),
            secondary_type: None,
            stats,
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

    fn dex() -> Pokedex {
        Pokedex::from_pokemon(vec![
            pokemon(
                1,
                BaseStats {
                    hp: 45,
                    attack: 49,
                    defense: 49,
                    sp_atk: 65,
                    sp_def: 65,
                    speed: 45,
                },
            ),
            pokemon(
                4,
                BaseStats {
                    hp: 39,
                    attack: 52,
                    defense: 43,
                    sp_atk: 60,
                    sp_def: 50,
                    speed: 65,
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_diff_follows_stat_order() {
        let dex = dex();
        let a = dex.get(PokemonId(1)).unwrap();
        let b = dex.get(PokemonId(4)).unwrap();
        assert_eq!(
            stat_diff(a, b, &Stat::ALL),
            vec![6.0, -3.0, 6.0, 5.0, 15.0, -20.0]
        );
        assert_eq!(stat_diff(a, b, &[Stat::Speed, Stat::Hp]), vec![-20.0, 6.0]);
    }

    #[test]
    fn test_diff_is_antisymmetric() {
        let dex = dex();
        let a = dex.get(PokemonId(1)).unwrap();
        let b = dex.get(PokemonId(4)).unwrap();
        let ab = stat_diff(a, b, &Stat::ALL);
        let ba = stat_diff(b, a, &Stat::ALL);
        for (x, y) in ab.iter().zip(&ba) {
            assert_eq!(*x, -*y);
        }
        assert!(stat_diff(a, a, &Stat::ALL).iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_labels() {
        let set = build_training_set(
            &dex(),
            &[combat(1, 4, 1), combat(1, 4, 4), combat(4, 1, 4)],
            MissingCombatant::Skip,
        )
        .unwrap();
        assert_eq!(set.labels, vec![1, 0, 1]);
        assert_eq!(set.features.len(), 3);
        assert_eq!(set.skipped, 0);
    }

    #[test]
    fn test_unknown_participants_are_skipped() {
        let set = build_training_set(
            &dex(),
            &[combat(1, 99, 1), combat(98, 4, 4), combat(1, 4, 1)],
            MissingCombatant::Skip,
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped, 2);
    }

    #[test]
    fn test_unknown_participants_fail_when_strict() {
        let err = build_training_set(
            &dex(),
            &[combat(1, 4, 1), combat(4, 77, 4)],
            MissingCombatant::Fail,
        )
        .unwrap_err();
        match err {
            BattleError::MissingCombatant { row, id } => {
                assert_eq!(row, 1);
                assert_eq!(id, PokemonId(77));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unlisted_winner_counts_as_second() {
        let set =
            build_training_set(&dex(), &[combat(1, 4, 3)], MissingCombatant::Skip).unwrap();
        assert_eq!(set.labels, vec![0]);
        assert_eq!(set.unlisted_winners, 1);
    }

    #[test]
    fn test_no_matching_rows_gives_empty_set() {
        let set =
            build_training_set(&dex(), &[combat(10, 11, 10)], MissingCombatant::Skip).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.first_win_rate(), 0.0);
    }
}
