use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    EventDetails, EventType, GameEntity, GameEventEntity, GameStatEntity, MemberRole,
    PlayerStatEntity, Position, StatType, TeamEntity, TeamMemberEntity, TeamType,
};

use super::error::{MongoDaoError, MongoResult};

pub const TEAMS: &str = "teams";
pub const TEAM_MEMBERS: &str = "team_members";
pub const GAMES: &str = "games";
pub const GAME_EVENTS: &str = "game_events";
pub const GAME_STATS: &str = "game_stats";
pub const PLAYER_STATS: &str = "player_stats";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    abbreviation: Option<String>,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMemberDocument {
    #[serde(rename = "_id")]
    id: String,
    team_id: String,
    name: String,
    jersey_number: Option<u8>,
    position: Option<Position>,
    role: MemberRole,
    account_id: Option<String>,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    home_team_id: String,
    away_team_id: String,
    starts_at: DateTime,
    location: Option<String>,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    event_type: EventType,
    period: u8,
    team_type: TeamType,
    timestamp: DateTime,
    details: EventDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStatDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    player_id: String,
    stat_type: StatType,
    period: u8,
    value: i32,
    timestamp: DateTime,
    #[serde(default)]
    details: serde_json::Value,
}

/// Cached aggregate keyed by `player_id:stat_type` so upserts replace in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerStatDocument {
    #[serde(rename = "_id")]
    id: String,
    player_id: String,
    player_name: String,
    stat_type: StatType,
    value: i64,
    games_played: u32,
    updated_at: DateTime,
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn player_stat_key(player_id: Uuid, stat_type: &StatType) -> String {
    format!("{player_id}:{stat_type}")
}

fn parse_id(collection: &'static str, value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| MongoDaoError::InvalidId {
        collection,
        value: value.to_owned(),
    })
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            abbreviation: value.abbreviation,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(TEAMS, &value.id)?,
            name: value.name,
            abbreviation: value.abbreviation,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<TeamMemberEntity> for MongoMemberDocument {
    fn from(value: TeamMemberEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_id: value.team_id.to_string(),
            name: value.name,
            jersey_number: value.jersey_number,
            position: value.position,
            role: value.role,
            account_id: value.account_id,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoMemberDocument> for TeamMemberEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMemberDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(TEAM_MEMBERS, &value.id)?,
            team_id: parse_id(TEAM_MEMBERS, &value.team_id)?,
            name: value.name,
            jersey_number: value.jersey_number,
            position: value.position,
            role: value.role,
            account_id: value.account_id,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            home_team_id: value.home_team_id.to_string(),
            away_team_id: value.away_team_id.to_string(),
            starts_at: DateTime::from_system_time(value.starts_at),
            location: value.location,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(GAMES, &value.id)?,
            home_team_id: parse_id(GAMES, &value.home_team_id)?,
            away_team_id: parse_id(GAMES, &value.away_team_id)?,
            starts_at: value.starts_at.to_system_time(),
            location: value.location,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<GameEventEntity> for MongoEventDocument {
    fn from(value: GameEventEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            event_type: value.event_type,
            period: value.period,
            team_type: value.team_type,
            timestamp: DateTime::from_system_time(value.timestamp),
            details: value.details,
        }
    }
}

impl TryFrom<MongoEventDocument> for GameEventEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoEventDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(GAME_EVENTS, &value.id)?,
            game_id: parse_id(GAME_EVENTS, &value.game_id)?,
            event_type: value.event_type,
            period: value.period,
            team_type: value.team_type,
            timestamp: value.timestamp.to_system_time(),
            details: value.details,
        })
    }
}

impl From<GameStatEntity> for MongoStatDocument {
    fn from(value: GameStatEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            player_id: value.player_id.to_string(),
            stat_type: value.stat_type,
            period: value.period,
            value: value.value,
            timestamp: DateTime::from_system_time(value.timestamp),
            details: value.details,
        }
    }
}

impl TryFrom<MongoStatDocument> for GameStatEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoStatDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(GAME_STATS, &value.id)?,
            game_id: parse_id(GAME_STATS, &value.game_id)?,
            player_id: parse_id(GAME_STATS, &value.player_id)?,
            stat_type: value.stat_type,
            period: value.period,
            value: value.value,
            timestamp: value.timestamp.to_system_time(),
            details: value.details,
        })
    }
}

impl From<PlayerStatEntity> for MongoPlayerStatDocument {
    fn from(value: PlayerStatEntity) -> Self {
        Self {
            id: player_stat_key(value.player_id, &value.stat_type),
            player_id: value.player_id.to_string(),
            player_name: value.player_name,
            stat_type: value.stat_type,
            value: value.value,
            games_played: value.games_played,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoPlayerStatDocument> for PlayerStatEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerStatDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_id(PLAYER_STATS, &value.player_id)?,
            player_name: value.player_name,
            stat_type: value.stat_type,
            value: value.value,
            games_played: value.games_played,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}
