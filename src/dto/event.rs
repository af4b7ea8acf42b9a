use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{EventDetails, EventType, GameEventEntity, GameStatEntity, TeamType},
    dto::format_system_time,
};

/// Event submitted for a game; the game id comes from the path.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordEventRequest {
    /// Period number, starting at 1.
    #[validate(range(min = 1))]
    pub period: u8,
    /// Side credited with the event.
    pub team_type: Option<TeamType>,
    pub details: EventDetails,
}

/// Raw game event as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameEventSummary {
    pub id: Uuid,
    pub game_id: Uuid,
    pub event_type: EventType,
    pub period: u8,
    pub team_type: TeamType,
    pub timestamp: String,
    pub details: EventDetails,
}

impl From<GameEventEntity> for GameEventSummary {
    fn from(event: GameEventEntity) -> Self {
        Self {
            id: event.id,
            game_id: event.game_id,
            event_type: event.event_type,
            period: event.period,
            team_type: event.team_type,
            timestamp: format_system_time(event.timestamp),
            details: event.details,
        }
    }
}

/// Raw stat row as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStatSummary {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub stat_type: String,
    pub period: u8,
    pub value: i32,
    pub timestamp: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

impl From<GameStatEntity> for GameStatSummary {
    fn from(stat: GameStatEntity) -> Self {
        Self {
            id: stat.id,
            game_id: stat.game_id,
            player_id: stat.player_id,
            stat_type: stat.stat_type.into(),
            period: stat.period,
            value: stat.value,
            timestamp: format_system_time(stat.timestamp),
            details: stat.details,
        }
    }
}

/// Outcome of recording an event.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordEventResponse {
    pub event: GameEventSummary,
    pub stats: Vec<GameStatSummary>,
    /// Players whose cached stats are being refreshed in the background.
    pub refreshing: Vec<Uuid>,
}
