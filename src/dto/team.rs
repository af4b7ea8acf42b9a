//! DTOs for teams and their rostered members.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MemberRole, Position, TeamEntity, TeamMemberEntity},
    dto::{
        format_system_time,
        validation::{validate_abbreviation, validate_not_blank},
    },
};

/// Payload used to register a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_abbreviation"))]
    pub abbreviation: Option<String>,
}

/// Team as returned by the API.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            abbreviation: team.abbreviation,
            created_at: format_system_time(team.created_at),
        }
    }
}

fn default_role() -> MemberRole {
    MemberRole::Player
}

/// Payload used to add a member to a team roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(max = 99))]
    pub jersey_number: Option<u8>,
    #[serde(default)]
    pub position: Option<Position>,
    /// Defaults to `player`.
    #[serde(default = "default_role")]
    pub role: MemberRole,
    /// Opaque account identifier of the person behind the membership.
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Team member as returned by the API. `id` is the player identity used by stats.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberSummary {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub jersey_number: Option<u8>,
    pub position: Option<Position>,
    pub role: MemberRole,
    pub account_id: Option<String>,
    pub created_at: String,
}

impl From<TeamMemberEntity> for MemberSummary {
    fn from(member: TeamMemberEntity) -> Self {
        Self {
            id: member.id,
            team_id: member.team_id,
            name: member.name,
            jersey_number: member.jersey_number,
            position: member.position,
            role: member.role,
            account_id: member.account_id,
            created_at: format_system_time(member.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_request_defaults_to_player_role() {
        let request: CreateMemberRequest =
            serde_json::from_value(serde_json::json!({"name": "Goalie", "position": "goalie"}))
                .unwrap();

        assert_eq!(request.role, MemberRole::Player);
        assert_eq!(request.position, Some(Position::Goalie));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn team_request_rejects_bad_abbreviation() {
        let request = CreateTeamRequest {
            name: "Canadiens".into(),
            abbreviation: Some("mtl".into()),
        };
        assert!(request.validate().is_err());

        let blank = CreateTeamRequest {
            name: "  ".into(),
            abbreviation: None,
        };
        assert!(blank.validate().is_err());
    }
}
