//! Reduction of raw stat rows into per-type totals.
//!
//! Totals are plain sums plus a set of distinct games, so the result does not
//! depend on the order rows are fed in and re-running over the same rows always
//! yields the same numbers.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::dao::models::{GameStatEntity, StatType};

/// Minimal view of a stat row needed for aggregation.
pub trait StatSample {
    fn stat_type(&self) -> &StatType;
    fn value(&self) -> i64;
    fn game_id(&self) -> Uuid;
}

impl StatSample for GameStatEntity {
    fn stat_type(&self) -> &StatType {
        &self.stat_type
    }

    fn value(&self) -> i64 {
        i64::from(self.value)
    }

    fn game_id(&self) -> Uuid {
        self.game_id
    }
}

/// Aggregate of one stat type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatTotal {
    /// Sum of row values. Plus/minus rows are already signed, so this is their net.
    pub value: i64,
    /// Number of distinct games that contributed at least one row.
    pub games_played: u32,
}

#[derive(Default)]
struct Accumulator {
    value: i64,
    games: HashSet<Uuid>,
}

impl Accumulator {
    fn push<S: StatSample + ?Sized>(&mut self, row: &S) {
        self.value += row.value();
        self.games.insert(row.game_id());
    }

    fn finish(self) -> StatTotal {
        StatTotal {
            value: self.value,
            games_played: u32::try_from(self.games.len()).unwrap_or(u32::MAX),
        }
    }
}

/// Reduce rows into one total per stat type.
pub fn aggregate<'a, S, I>(rows: I) -> BTreeMap<StatType, StatTotal>
where
    S: StatSample + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut accumulators: BTreeMap<StatType, Accumulator> = BTreeMap::new();
    for row in rows {
        accumulators
            .entry(row.stat_type().clone())
            .or_default()
            .push(row);
    }

    accumulators
        .into_iter()
        .map(|(stat_type, accumulator)| (stat_type, accumulator.finish()))
        .collect()
}

/// Total of a single stat type, without building the full mapping.
///
/// Agrees with `aggregate(rows)[stat_type]`, returning a zero total when no row matches.
pub fn aggregate_value<'a, S, I>(rows: I, stat_type: &StatType) -> StatTotal
where
    S: StatSample + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut accumulator = Accumulator::default();
    rows.into_iter()
        .filter(|row| row.stat_type() == stat_type)
        .for_each(|row| accumulator.push(row));
    accumulator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    struct Row {
        stat_type: StatType,
        value: i64,
        game_id: Uuid,
    }

    impl StatSample for Row {
        fn stat_type(&self) -> &StatType {
            &self.stat_type
        }

        fn value(&self) -> i64 {
            self.value
        }

        fn game_id(&self) -> Uuid {
            self.game_id
        }
    }

    fn row(stat_type: StatType, value: i64, game_id: Uuid) -> Row {
        Row {
            stat_type,
            value,
            game_id,
        }
    }

    fn sample_rows() -> Vec<Row> {
        let games = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        vec![
            row(StatType::Goals, 1, games[0]),
            row(StatType::Goals, 1, games[1]),
            row(StatType::Assists, 1, games[1]),
            row(StatType::Penalties, 2, games[0]),
            row(StatType::Penalties, 5, games[2]),
            row(StatType::PlusMinus, 1, games[0]),
            row(StatType::PlusMinus, -1, games[0]),
            row(StatType::PlusMinus, -1, games[2]),
            row(StatType::Hits, 1, games[2]),
            row(StatType::Other("blocks".into()), 3, games[1]),
        ]
    }

    #[test]
    fn same_game_is_counted_once() {
        let game = Uuid::new_v4();
        let rows = vec![row(StatType::Shots, 1, game), row(StatType::Shots, 1, game)];

        let totals = aggregate(&rows);
        assert_eq!(
            totals[&StatType::Shots],
            StatTotal {
                value: 2,
                games_played: 1
            }
        );
    }

    #[test]
    fn shuffled_input_yields_identical_totals() {
        let mut rows = sample_rows();
        let expected = aggregate(&rows);

        let mut rng = rand::rng();
        for _ in 0..20 {
            rows.shuffle(&mut rng);
            assert_eq!(aggregate(&rows), expected);
        }
    }

    #[test]
    fn counts_sum_values_and_distinct_games() {
        let rows = sample_rows();
        let totals = aggregate(&rows);

        assert_eq!(
            totals[&StatType::Penalties],
            StatTotal {
                value: 7,
                games_played: 2
            }
        );
        assert_eq!(
            totals[&StatType::Goals],
            StatTotal {
                value: 2,
                games_played: 2
            }
        );
        assert_eq!(totals[&StatType::Other("blocks".into())].value, 3);
        assert!(!totals.contains_key(&StatType::Shots));
    }

    #[test]
    fn plus_minus_is_a_signed_sum() {
        let rows = sample_rows();
        let totals = aggregate(&rows);

        assert_eq!(
            totals[&StatType::PlusMinus],
            StatTotal {
                value: -1,
                games_played: 2
            }
        );
    }

    #[test]
    fn single_type_total_agrees_with_mapping() {
        let rows = sample_rows();
        let totals = aggregate(&rows);

        for (stat_type, total) in &totals {
            assert_eq!(aggregate_value(&rows, stat_type), *total);
        }
        assert_eq!(
            aggregate_value(&rows, &StatType::ShotsAgainst),
            StatTotal::default()
        );
    }

    #[test]
    fn entity_rows_widen_values() {
        let stat = GameStatEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            stat_type: StatType::PlusMinus,
            period: 2,
            value: -1,
            timestamp: std::time::SystemTime::UNIX_EPOCH,
            details: serde_json::Value::Null,
        };
        let totals = aggregate(std::slice::from_ref(&stat));
        assert_eq!(totals[&StatType::PlusMinus].value, -1);
    }
}
