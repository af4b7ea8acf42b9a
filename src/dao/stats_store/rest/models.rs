use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    EventDetails, EventType, GameEntity, GameEventEntity, GameStatEntity, MemberRole,
    NewGameEvent, NewGameStat, PlayerStatEntity, Position, StatType, TeamEntity,
    TeamMemberEntity, TeamType,
};

pub const CREATE_GAME_EVENT: &str = "create_game_event";
pub const RECORD_GAME_STAT: &str = "record_game_stat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRow {
    id: Uuid,
    name: String,
    abbreviation: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    id: Uuid,
    team_id: Uuid,
    name: String,
    jersey_number: Option<u8>,
    position: Option<Position>,
    role: MemberRole,
    account_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRow {
    id: Uuid,
    home_team_id: Uuid,
    away_team_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    starts_at: OffsetDateTime,
    location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRow {
    id: Uuid,
    game_id: Uuid,
    event_type: EventType,
    period: u8,
    team_type: TeamType,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    details: EventDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatRow {
    id: Uuid,
    game_id: Uuid,
    player_id: Uuid,
    stat_type: StatType,
    period: u8,
    value: i32,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(default)]
    details: serde_json::Value,
}

/// Canonical shape written to `player_stats`; reads go through the normalizer.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatRow {
    player_id: Uuid,
    player_name: String,
    stat_type: StatType,
    value: i64,
    games_played: u32,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// Arguments of the `create_game_event` procedure.
#[derive(Debug, Serialize)]
pub struct CreateGameEventArgs {
    p_game_id: Uuid,
    p_event_type: EventType,
    p_period: u8,
    p_team_type: TeamType,
    p_details: EventDetails,
}

/// Arguments of the `record_game_stat` procedure.
#[derive(Debug, Serialize)]
pub struct RecordGameStatArgs {
    p_game_id: Uuid,
    p_player_id: Uuid,
    p_stat_type: StatType,
    p_period: u8,
    p_value: i32,
    p_details: serde_json::Value,
}

impl From<TeamEntity> for TeamRow {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            abbreviation: value.abbreviation,
            created_at: value.created_at.into(),
        }
    }
}

impl From<TeamRow> for TeamEntity {
    fn from(value: TeamRow) -> Self {
        Self {
            id: value.id,
            name: value.name,
            abbreviation: value.abbreviation,
            created_at: value.created_at.into(),
        }
    }
}

impl From<TeamMemberEntity> for MemberRow {
    fn from(value: TeamMemberEntity) -> Self {
        Self {
            id: value.id,
            team_id: value.team_id,
            name: value.name,
            jersey_number: value.jersey_number,
            position: value.position,
            role: value.role,
            account_id: value.account_id,
            created_at: value.created_at.into(),
        }
    }
}

impl From<MemberRow> for TeamMemberEntity {
    fn from(value: MemberRow) -> Self {
        Self {
            id: value.id,
            team_id: value.team_id,
            name: value.name,
            jersey_number: value.jersey_number,
            position: value.position,
            role: value.role,
            account_id: value.account_id,
            created_at: value.created_at.into(),
        }
    }
}

impl From<GameEntity> for GameRow {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            starts_at: value.starts_at.into(),
            location: value.location,
            created_at: value.created_at.into(),
        }
    }
}

impl From<GameRow> for GameEntity {
    fn from(value: GameRow) -> Self {
        Self {
            id: value.id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            starts_at: value.starts_at.into(),
            location: value.location,
            created_at: value.created_at.into(),
        }
    }
}

impl From<EventRow> for GameEventEntity {
    fn from(value: EventRow) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            event_type: value.event_type,
            period: value.period,
            team_type: value.team_type,
            timestamp: value.timestamp.into(),
            details: value.details,
        }
    }
}

impl From<StatRow> for GameStatEntity {
    fn from(value: StatRow) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            player_id: value.player_id,
            stat_type: value.stat_type,
            period: value.period,
            value: value.value,
            timestamp: value.timestamp.into(),
            details: value.details,
        }
    }
}

impl From<PlayerStatEntity> for PlayerStatRow {
    fn from(value: PlayerStatEntity) -> Self {
        Self {
            player_id: value.player_id,
            player_name: value.player_name,
            stat_type: value.stat_type,
            value: value.value,
            games_played: value.games_played,
            updated_at: value.updated_at.into(),
        }
    }
}

impl From<NewGameEvent> for CreateGameEventArgs {
    fn from(value: NewGameEvent) -> Self {
        Self {
            p_game_id: value.game_id,
            p_event_type: value.details.event_type(),
            p_period: value.period,
            p_team_type: value.team_type,
            p_details: value.details,
        }
    }
}

impl From<NewGameStat> for RecordGameStatArgs {
    fn from(value: NewGameStat) -> Self {
        Self {
            p_game_id: value.game_id,
            p_player_id: value.player_id,
            p_stat_type: value.stat_type,
            p_period: value.period,
            p_value: value.value,
            p_details: value.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_arguments_use_prefixed_names() {
        let game_id = Uuid::new_v4();
        let args = CreateGameEventArgs::from(NewGameEvent {
            game_id,
            period: 3,
            team_type: TeamType::Home,
            details: EventDetails::Hit {
                player_id: Uuid::nil(),
                target_id: None,
            },
        });
        let json = serde_json::to_value(&args).unwrap();

        assert_eq!(json["p_game_id"], serde_json::json!(game_id));
        assert_eq!(json["p_event_type"], "hit");
        assert_eq!(json["p_team_type"], "home");
        assert_eq!(json["p_details"]["event_type"], "hit");
    }

    #[test]
    fn stat_rows_decode_rfc3339_timestamps() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "game_id": Uuid::new_v4(),
            "player_id": Uuid::new_v4(),
            "stat_type": "faceoff_wins",
            "period": 1,
            "value": 1,
            "timestamp": "2024-02-03T19:05:00Z",
            "details": {"opponent_id": null}
        });
        let row: StatRow = serde_json::from_value(json).unwrap();
        let entity = GameStatEntity::from(row);
        assert_eq!(entity.stat_type, StatType::FaceoffWins);
    }
}
