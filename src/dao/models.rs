use std::{convert::Infallible, fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Collections exposed by the remote data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Games,
    GameEvents,
    GameStats,
    PlayerStats,
    TeamMembers,
    Teams,
}

impl Table {
    /// Name of the collection in the backing store.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Games => "games",
            Table::GameEvents => "game_events",
            Table::GameStats => "game_stats",
            Table::PlayerStats => "player_stats",
            Table::TeamMembers => "team_members",
            Table::Teams => "teams",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the game a team plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamType {
    Home,
    Away,
}

impl TeamType {
    /// Wire name of the side.
    pub fn as_str(self) -> &'static str {
        match self {
            TeamType::Home => "home",
            TeamType::Away => "away",
        }
    }
}

/// Kind of event recorded during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Goal,
    Penalty,
    Faceoff,
    Shot,
    Hit,
}

impl EventType {
    /// Wire name of the event type.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Goal => "goal",
            EventType::Penalty => "penalty",
            EventType::Faceoff => "faceoff",
            EventType::Shot => "shot",
            EventType::Hit => "hit",
        }
    }
}

/// Tag categorizing a recorded statistic.
///
/// The store keeps these as plain strings, so tags this build does not know
/// about survive a read/write cycle through [`StatType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatType {
    Goals,
    Assists,
    PlusMinus,
    Penalties,
    FaceoffWins,
    FaceoffLosses,
    Shots,
    ShotsAgainst,
    Hits,
    Other(String),
}

impl StatType {
    /// Wire name of the stat type.
    pub fn as_str(&self) -> &str {
        match self {
            StatType::Goals => "goals",
            StatType::Assists => "assists",
            StatType::PlusMinus => "plusMinus",
            StatType::Penalties => "penalties",
            StatType::FaceoffWins => "faceoff_wins",
            StatType::FaceoffLosses => "faceoff_losses",
            StatType::Shots => "shots",
            StatType::ShotsAgainst => "shots_against",
            StatType::Hits => "hits",
            StatType::Other(tag) => tag,
        }
    }
}

impl FromStr for StatType {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "goals" => StatType::Goals,
            "assists" => StatType::Assists,
            "plusMinus" => StatType::PlusMinus,
            "penalties" => StatType::Penalties,
            "faceoff_wins" => StatType::FaceoffWins,
            "faceoff_losses" => StatType::FaceoffLosses,
            "shots" => StatType::Shots,
            "shots_against" => StatType::ShotsAgainst,
            "hits" => StatType::Hits,
            other => StatType::Other(other.to_owned()),
        })
    }
}

impl From<String> for StatType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<StatType> for String {
    fn from(value: StatType) -> Self {
        match value {
            StatType::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Penalty severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyDuration {
    Minor,
    Major,
}

/// Result of a faceoff for the tracked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FaceoffOutcome {
    Won,
    Lost,
}

/// Whether a shot counts for or against the tracked team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShotAttribution {
    For,
    Against,
}

/// Role of a person on a team roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Player,
    Coach,
}

/// Playing position of a rostered player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defense,
    Goalie,
}

/// Event specific payload. Every player reference is a team member id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventDetails {
    /// A goal, with up to two assists and the skaters on ice for both teams.
    Goal {
        scorer_id: Uuid,
        #[serde(default)]
        primary_assist_id: Option<Uuid>,
        #[serde(default)]
        secondary_assist_id: Option<Uuid>,
        #[serde(default)]
        on_ice: Vec<Uuid>,
    },
    /// A penalty assessed to a player.
    Penalty {
        player_id: Uuid,
        duration: PenaltyDuration,
        #[serde(default)]
        infraction: Option<String>,
    },
    /// A faceoff taken by a player.
    Faceoff {
        player_id: Uuid,
        outcome: FaceoffOutcome,
        #[serde(default)]
        opponent_id: Option<Uuid>,
    },
    /// A shot for or against the tracked team.
    Shot {
        player_id: Uuid,
        attribution: ShotAttribution,
    },
    /// A body check delivered by a player.
    Hit {
        player_id: Uuid,
        #[serde(default)]
        target_id: Option<Uuid>,
    },
}

impl EventDetails {
    /// Event type matching the payload variant.
    pub fn event_type(&self) -> EventType {
        match self {
            EventDetails::Goal { .. } => EventType::Goal,
            EventDetails::Penalty { .. } => EventType::Penalty,
            EventDetails::Faceoff { .. } => EventType::Faceoff,
            EventDetails::Shot { .. } => EventType::Shot,
            EventDetails::Hit { .. } => EventType::Hit,
        }
    }

    /// The player the event is primarily attributed to.
    pub fn primary_player(&self) -> Uuid {
        match self {
            EventDetails::Goal { scorer_id, .. } => *scorer_id,
            EventDetails::Penalty { player_id, .. }
            | EventDetails::Faceoff { player_id, .. }
            | EventDetails::Shot { player_id, .. }
            | EventDetails::Hit { player_id, .. } => *player_id,
        }
    }
}

/// Team persisted in the `teams` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Short code shown on scoreboards.
    pub abbreviation: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Membership of a person on a team. Its id is the player identity used by every stat row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMemberEntity {
    /// Team-scoped member identifier.
    pub id: Uuid,
    /// Team the member belongs to.
    pub team_id: Uuid,
    /// Display name.
    pub name: String,
    /// Sweater number, when assigned.
    pub jersey_number: Option<u8>,
    /// Playing position, when the member is a player.
    pub position: Option<Position>,
    /// Player or coach.
    pub role: MemberRole,
    /// Opaque account identifier of the person, never used for stats.
    pub account_id: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Game between a home and an away team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Team playing at home.
    pub home_team_id: Uuid,
    /// Visiting team.
    pub away_team_id: Uuid,
    /// Scheduled puck drop.
    pub starts_at: SystemTime,
    /// Rink name.
    pub location: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl GameEntity {
    /// Team id playing on the given side.
    pub fn team_id(&self, side: TeamType) -> Uuid {
        match side {
            TeamType::Home => self.home_team_id,
            TeamType::Away => self.away_team_id,
        }
    }

    /// Side the given team plays on, if it takes part in the game.
    pub fn side_of(&self, team_id: Uuid) -> Option<TeamType> {
        if team_id == self.home_team_id {
            Some(TeamType::Home)
        } else if team_id == self.away_team_id {
            Some(TeamType::Away)
        } else {
            None
        }
    }
}

/// Raw event row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEventEntity {
    /// Identifier assigned by the store.
    pub id: Uuid,
    /// Game the event belongs to.
    pub game_id: Uuid,
    /// Kind of event, mirrors the `details` variant.
    pub event_type: EventType,
    /// Period number, starting at 1.
    pub period: u8,
    /// Side credited with the event.
    pub team_type: TeamType,
    /// Time the store accepted the event.
    pub timestamp: SystemTime,
    /// Event specific payload.
    pub details: EventDetails,
}

/// Raw per-occurrence stat row derived from an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStatEntity {
    /// Identifier assigned by the store.
    pub id: Uuid,
    /// Game the stat was recorded in.
    pub game_id: Uuid,
    /// Team member credited with the stat.
    pub player_id: Uuid,
    /// Stat category.
    pub stat_type: StatType,
    /// Period number, starting at 1.
    pub period: u8,
    /// Amount contributed; signed for plus/minus rows.
    pub value: i32,
    /// Time the store accepted the row.
    pub timestamp: SystemTime,
    /// Opaque context copied from the originating event.
    pub details: serde_json::Value,
}

/// Cached aggregate of a player's stat rows for one stat type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStatEntity {
    /// Team member the aggregate belongs to.
    pub player_id: Uuid,
    /// Member name at refresh time.
    pub player_name: String,
    /// Stat category.
    pub stat_type: StatType,
    /// Sum of the raw values.
    pub value: i64,
    /// Distinct games that contributed a row.
    pub games_played: u32,
    /// Last refresh.
    pub updated_at: SystemTime,
}

/// Event about to be written through the `create_game_event` procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameEvent {
    pub game_id: Uuid,
    pub period: u8,
    pub team_type: TeamType,
    pub details: EventDetails,
}

/// Stat row about to be written through the `record_game_stat` procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameStat {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub stat_type: StatType,
    pub period: u8,
    pub value: i32,
    pub details: serde_json::Value,
}

impl NewGameEvent {
    /// Materialize the row the way the store procedure does.
    pub fn into_entity(self, id: Uuid, timestamp: SystemTime) -> GameEventEntity {
        GameEventEntity {
            id,
            game_id: self.game_id,
            event_type: self.details.event_type(),
            period: self.period,
            team_type: self.team_type,
            timestamp,
            details: self.details,
        }
    }
}

impl NewGameStat {
    /// Materialize the row the way the store procedure does.
    pub fn into_entity(self, id: Uuid, timestamp: SystemTime) -> GameStatEntity {
        GameStatEntity {
            id,
            game_id: self.game_id,
            player_id: self.player_id,
            stat_type: self.stat_type,
            period: self.period,
            value: self.value,
            timestamp,
            details: self.details,
        }
    }
}

/// Equality filter applied to `game_stats` reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFilter {
    pub game_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
}

impl StatFilter {
    /// Rows credited to one player, across games.
    pub fn player(player_id: Uuid) -> Self {
        Self {
            game_id: None,
            player_id: Some(player_id),
        }
    }

    /// Rows recorded in one game.
    pub fn game(game_id: Uuid) -> Self {
        Self {
            game_id: Some(game_id),
            player_id: None,
        }
    }

    /// Whether the row passes every set filter.
    pub fn matches(&self, stat: &GameStatEntity) -> bool {
        self.game_id.is_none_or(|id| id == stat.game_id)
            && self.player_id.is_none_or(|id| id == stat.player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_type_round_trips_known_and_unknown_tags() {
        assert_eq!("plusMinus".parse::<StatType>().unwrap(), StatType::PlusMinus);
        assert_eq!(String::from(StatType::FaceoffWins), "faceoff_wins");

        let custom = StatType::from("blocked_shots".to_string());
        assert_eq!(custom, StatType::Other("blocked_shots".into()));
        assert_eq!(custom.as_str(), "blocked_shots");
    }

    #[test]
    fn event_details_use_event_type_tag() {
        let player_id = Uuid::new_v4();
        let json = serde_json::json!({
            "event_type": "penalty",
            "player_id": player_id,
            "duration": "major"
        });
        let details: EventDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.event_type(), EventType::Penalty);
        assert_eq!(details.primary_player(), player_id);
    }

    #[test]
    fn game_side_lookup() {
        let game = GameEntity {
            id: Uuid::new_v4(),
            home_team_id: Uuid::new_v4(),
            away_team_id: Uuid::new_v4(),
            starts_at: SystemTime::UNIX_EPOCH,
            location: None,
            created_at: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(game.side_of(game.home_team_id), Some(TeamType::Home));
        assert_eq!(game.side_of(game.away_team_id), Some(TeamType::Away));
        assert_eq!(game.side_of(Uuid::new_v4()), None);
        assert_eq!(game.team_id(TeamType::Away), game.away_team_id);
    }
}
