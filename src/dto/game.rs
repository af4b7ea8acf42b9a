use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{dao::models::GameEntity, dto::format_system_time};

/// Payload used to schedule a game between two registered teams.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_distinct_teams"))]
pub struct CreateGameRequest {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    /// RFC3339 puck drop time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub starts_at: OffsetDateTime,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub location: Option<String>,
}

fn validate_distinct_teams(request: &CreateGameRequest) -> Result<(), ValidationError> {
    if request.home_team_id == request.away_team_id {
        let mut err = ValidationError::new("same_team");
        err.message = Some("Home and away teams must differ".into());
        return Err(err);
    }
    Ok(())
}

/// Game as returned by the API.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub starts_at: String,
    pub location: Option<String>,
    pub created_at: String,
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            home_team_id: game.home_team_id,
            away_team_id: game.away_team_id,
            starts_at: format_system_time(game.starts_at),
            location: game.location,
            created_at: format_system_time(game.created_at),
        }
    }
}

/// Goals per side derived from recorded goal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameScore {
    pub game_id: Uuid,
    pub home: u32,
    pub away: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_rfc3339_and_rejects_same_team() {
        let team = Uuid::new_v4();
        let request: CreateGameRequest = serde_json::from_value(serde_json::json!({
            "home_team_id": team,
            "away_team_id": team,
            "starts_at": "2024-10-12T19:00:00-04:00"
        }))
        .unwrap();

        assert_eq!(request.starts_at.offset().whole_hours(), -4);
        assert!(request.validate().is_err());
    }
}
