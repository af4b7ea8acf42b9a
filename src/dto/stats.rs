use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerStatEntity, StatType},
    dto::format_system_time,
    services::aggregator::StatTotal,
};

/// Aggregate of one stat type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatTotalDto {
    pub value: i64,
    pub games_played: u32,
}

impl From<StatTotal> for StatTotalDto {
    fn from(total: StatTotal) -> Self {
        Self {
            value: total.value,
            games_played: total.games_played,
        }
    }
}

/// Stat totals keyed by stat type tag, in stat type order.
pub type StatMap = IndexMap<String, StatTotalDto>;

/// Convert aggregator output into the ordered response map.
pub fn stat_map(totals: BTreeMap<StatType, StatTotal>) -> StatMap {
    totals
        .into_iter()
        .map(|(stat_type, total)| (stat_type.into(), total.into()))
        .collect()
}

/// On-demand aggregate of one player's stat rows.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatsResponse {
    pub player_id: Uuid,
    pub player_name: String,
    #[schema(value_type = std::collections::HashMap<String, StatTotalDto>)]
    pub stats: StatMap,
}

/// On-demand aggregate of a single stat type for one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatResponse {
    pub player_id: Uuid,
    pub player_name: String,
    pub stat_type: String,
    pub value: i64,
    pub games_played: u32,
}

/// Row of the cached `player_stats` table.
#[derive(Debug, Serialize, ToSchema)]
pub struct CachedStatSummary {
    pub player_id: Uuid,
    pub player_name: String,
    pub stat_type: String,
    pub value: i64,
    pub games_played: u32,
    pub updated_at: String,
}

impl From<PlayerStatEntity> for CachedStatSummary {
    fn from(stat: PlayerStatEntity) -> Self {
        Self {
            player_id: stat.player_id,
            player_name: stat.player_name,
            stat_type: stat.stat_type.into(),
            value: stat.value,
            games_played: stat.games_played,
            updated_at: format_system_time(stat.updated_at),
        }
    }
}

/// Per-member aggregates of a team plus the team-wide totals.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamStatsResponse {
    pub team_id: Uuid,
    pub players: Vec<PlayerStatsResponse>,
    #[schema(value_type = std::collections::HashMap<String, StatTotalDto>)]
    pub totals: StatMap,
}
