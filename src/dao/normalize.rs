//! Boundary adapter for cached stat rows written under two column naming conventions.
//!
//! Older writers stored `playerId`/`statType`/`gamesPlayed`, newer ones
//! `player_id`/`stat_type`/`games_played`; some rows carry both. Rows are
//! normalized once when they are read and converted into the canonical
//! [`PlayerStatEntity`], so nothing past the storage layer sees the camelCase
//! spelling. The REST backend selects rows by either player column and
//! removes a camelCase-only row once its canonical replacement is written.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::PlayerStatEntity;

/// Failures converting a normalized row into the canonical schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// Neither convention carried a usable player identifier.
    #[error("stat row has an invalid player id `{0}`")]
    InvalidPlayerId(String),
    /// Neither convention carried a stat type.
    #[error("stat row for player `{0}` has no stat type")]
    MissingStatType(Uuid),
}

/// Stat object as found in the wild, with every field optional.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LooseStatRecord {
    pub player_id: Option<String>,
    #[serde(rename = "playerId")]
    pub player_id_camel: Option<String>,
    pub stat_type: Option<String>,
    #[serde(rename = "statType")]
    pub stat_type_camel: Option<String>,
    pub games_played: Option<u32>,
    #[serde(rename = "gamesPlayed")]
    pub games_played_camel: Option<u32>,
    pub player_name: Option<String>,
    pub value: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// First present value wins; both slots receive it.
fn reconcile<T: Clone>(first: &Option<T>, second: &Option<T>, fallback: T) -> (Option<T>, Option<T>) {
    let resolved = first.clone().or_else(|| second.clone()).unwrap_or(fallback);
    (Some(resolved.clone()), Some(resolved))
}

impl LooseStatRecord {
    /// Fill both conventions of every dual field from whichever one is present.
    ///
    /// snake_case takes precedence when both are set. Missing strings become
    /// empty and missing counts become 0, so normalizing twice is a no-op.
    pub fn normalize(&self) -> Self {
        let (player_id, player_id_camel) =
            reconcile(&self.player_id, &self.player_id_camel, String::new());
        let (stat_type, stat_type_camel) =
            reconcile(&self.stat_type, &self.stat_type_camel, String::new());
        let (games_played, games_played_camel) =
            reconcile(&self.games_played, &self.games_played_camel, 0);

        Self {
            player_id,
            player_id_camel,
            stat_type,
            stat_type_camel,
            games_played,
            games_played_camel,
            player_name: Some(self.player_name.clone().unwrap_or_default()),
            value: Some(self.value.unwrap_or_default()),
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<LooseStatRecord> for PlayerStatEntity {
    type Error = NormalizeError;

    fn try_from(record: LooseStatRecord) -> Result<Self, Self::Error> {
        let record = record.normalize();
        let raw_id = record.player_id.unwrap_or_default();
        let player_id =
            Uuid::parse_str(&raw_id).map_err(|_| NormalizeError::InvalidPlayerId(raw_id))?;

        let stat_type = record.stat_type.unwrap_or_default();
        if stat_type.is_empty() {
            return Err(NormalizeError::MissingStatType(player_id));
        }

        Ok(Self {
            player_id,
            player_name: record.player_name.unwrap_or_default(),
            stat_type: stat_type.into(),
            value: record.value.unwrap_or_default(),
            games_played: record.games_played.unwrap_or_default(),
            updated_at: record
                .updated_at
                .map(SystemTime::from)
                .unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::StatType;

    fn camel_only() -> LooseStatRecord {
        LooseStatRecord {
            player_id_camel: Some("p-1".into()),
            stat_type_camel: Some("hits".into()),
            games_played_camel: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            LooseStatRecord::default(),
            camel_only(),
            LooseStatRecord {
                player_id: Some("a".into()),
                player_id_camel: Some("b".into()),
                games_played: Some(2),
                value: Some(-3),
                ..Default::default()
            },
        ];

        for sample in samples {
            let once = sample.normalize();
            assert_eq!(once.normalize(), once);
        }
    }

    #[test]
    fn either_convention_fills_both() {
        let from_camel = camel_only().normalize();
        assert_eq!(from_camel.player_id.as_deref(), Some("p-1"));
        assert_eq!(from_camel.stat_type.as_deref(), Some("hits"));
        assert_eq!(from_camel.games_played, Some(4));

        let from_snake = LooseStatRecord {
            player_id: Some("p-1".into()),
            stat_type: Some("hits".into()),
            games_played: Some(4),
            ..Default::default()
        }
        .normalize();
        assert_eq!(from_snake, from_camel);
    }

    #[test]
    fn snake_case_wins_when_both_present() {
        let record = LooseStatRecord {
            games_played: Some(7),
            games_played_camel: Some(1),
            ..Default::default()
        }
        .normalize();
        assert_eq!(record.games_played, Some(7));
        assert_eq!(record.games_played_camel, Some(7));
    }

    #[test]
    fn missing_values_default_to_empty_and_zero() {
        let record = LooseStatRecord::default().normalize();
        assert_eq!(record.player_id.as_deref(), Some(""));
        assert_eq!(record.player_id_camel.as_deref(), Some(""));
        assert_eq!(record.stat_type_camel.as_deref(), Some(""));
        assert_eq!(record.games_played_camel, Some(0));
        assert_eq!(record.value, Some(0));
    }

    #[test]
    fn camel_case_json_converts_to_canonical_row() {
        let player_id = Uuid::new_v4();
        let json = serde_json::json!({
            "playerId": player_id.to_string(),
            "statType": "plusMinus",
            "gamesPlayed": 3,
            "player_name": "Skater",
            "value": -2
        });
        let record: LooseStatRecord = serde_json::from_value(json).unwrap();
        let entity = PlayerStatEntity::try_from(record).unwrap();

        assert_eq!(entity.player_id, player_id);
        assert_eq!(entity.stat_type, StatType::PlusMinus);
        assert_eq!(entity.games_played, 3);
        assert_eq!(entity.value, -2);
        assert_eq!(entity.updated_at, SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn rows_without_identity_are_rejected() {
        assert_eq!(
            PlayerStatEntity::try_from(LooseStatRecord::default()),
            Err(NormalizeError::InvalidPlayerId(String::new()))
        );
    }
}
