//! Read side of the stat pipeline: on-demand aggregates, the cached
//! `player_stats` table, game scores and administrative stat removal.

use std::time::SystemTime;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            EventDetails, GameEntity, PlayerStatEntity, StatFilter, StatType, Table,
            TeamMemberEntity, TeamType,
        },
        stats_store::StatsStore,
    },
    dto::{
        changes::ChangeKind,
        event::{GameEventSummary, GameStatSummary},
        game::GameScore,
        stats::{
            CachedStatSummary, PlayerStatResponse, PlayerStatsResponse, TeamStatsResponse,
            stat_map,
        },
    },
    error::ServiceError,
    services::aggregator::{aggregate, aggregate_value},
    state::ChangeHub,
};

pub(crate) async fn require_member(
    store: &dyn StatsStore,
    player_id: Uuid,
) -> Result<TeamMemberEntity, ServiceError> {
    store
        .find_member(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team member `{player_id}` not found")))
}

pub(crate) async fn require_game(
    store: &dyn StatsStore,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))
}

/// Recompute a player's cached aggregates from the raw rows.
///
/// Stat types still cached but no longer backed by any row are reset to zero.
/// Concurrent refreshes of the same player are not serialized; the last write wins.
pub async fn refresh_player_stats(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    player_id: Uuid,
) -> Result<Vec<PlayerStatEntity>, ServiceError> {
    let member = require_member(store, player_id).await?;
    let rows = store.list_game_stats(StatFilter::player(player_id)).await?;
    let mut totals = aggregate(&rows);

    for cached in store.list_player_stats(player_id).await? {
        totals.entry(cached.stat_type).or_default();
    }

    let updated_at = SystemTime::now();
    let mut refreshed = Vec::with_capacity(totals.len());
    for (stat_type, total) in totals {
        let entity = PlayerStatEntity {
            player_id,
            player_name: member.name.clone(),
            stat_type,
            value: total.value,
            games_played: total.games_played,
            updated_at,
        };
        store.upsert_player_stat(entity.clone()).await?;
        changes.publish(
            Table::PlayerStats,
            ChangeKind::Update,
            None,
            &CachedStatSummary::from(entity.clone()),
        );
        refreshed.push(entity);
    }

    debug!(%player_id, count = refreshed.len(), "refreshed cached player stats");
    Ok(refreshed)
}

/// Aggregate a player's raw rows on demand.
pub async fn player_stats(
    store: &dyn StatsStore,
    player_id: Uuid,
) -> Result<PlayerStatsResponse, ServiceError> {
    let member = require_member(store, player_id).await?;
    let rows = store.list_game_stats(StatFilter::player(player_id)).await?;

    Ok(PlayerStatsResponse {
        player_id,
        player_name: member.name,
        stats: stat_map(aggregate(&rows)),
    })
}

/// Aggregate one stat type of a player. Types without rows total zero.
pub async fn player_stat(
    store: &dyn StatsStore,
    player_id: Uuid,
    stat_type: StatType,
) -> Result<PlayerStatResponse, ServiceError> {
    let member = require_member(store, player_id).await?;
    let rows = store.list_game_stats(StatFilter::player(player_id)).await?;
    let total = aggregate_value(&rows, &stat_type);

    Ok(PlayerStatResponse {
        player_id,
        player_name: member.name,
        stat_type: stat_type.into(),
        value: total.value,
        games_played: total.games_played,
    })
}

/// Read the cached `player_stats` rows of a player.
pub async fn cached_player_stats(
    store: &dyn StatsStore,
    player_id: Uuid,
) -> Result<Vec<CachedStatSummary>, ServiceError> {
    require_member(store, player_id).await?;
    let rows = store.list_player_stats(player_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Per-member aggregates of a team and the totals across all of its rows.
pub async fn team_stats(
    store: &dyn StatsStore,
    team_id: Uuid,
) -> Result<TeamStatsResponse, ServiceError> {
    if store.find_team(team_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }

    let members = store.list_members(team_id).await?;
    let mut team_rows = Vec::new();
    let mut players = Vec::with_capacity(members.len());
    for member in members {
        let rows = store.list_game_stats(StatFilter::player(member.id)).await?;
        players.push(PlayerStatsResponse {
            player_id: member.id,
            player_name: member.name,
            stats: stat_map(aggregate(&rows)),
        });
        team_rows.extend(rows);
    }

    Ok(TeamStatsResponse {
        team_id,
        players,
        totals: stat_map(aggregate(&team_rows)),
    })
}

/// Raw stat rows of a game.
pub async fn game_stats(
    store: &dyn StatsStore,
    game_id: Uuid,
) -> Result<Vec<GameStatSummary>, ServiceError> {
    require_game(store, game_id).await?;
    let rows = store.list_game_stats(StatFilter::game(game_id)).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Raw events of a game, oldest first.
pub async fn game_events(
    store: &dyn StatsStore,
    game_id: Uuid,
) -> Result<Vec<GameEventSummary>, ServiceError> {
    require_game(store, game_id).await?;
    let events = store.list_game_events(game_id).await?;
    Ok(events.into_iter().map(Into::into).collect())
}

/// Goals per side, counted from the game's goal events.
pub async fn game_score(store: &dyn StatsStore, game_id: Uuid) -> Result<GameScore, ServiceError> {
    require_game(store, game_id).await?;
    let events = store.list_game_events(game_id).await?;

    let mut score = GameScore {
        game_id,
        home: 0,
        away: 0,
    };
    for event in events {
        if !matches!(event.details, EventDetails::Goal { .. }) {
            continue;
        }
        match event.team_type {
            TeamType::Home => score.home += 1,
            TeamType::Away => score.away += 1,
        }
    }
    Ok(score)
}

/// Remove a stat row and refresh the affected player's cache.
///
/// The refresh is best effort: its failure is logged and the deletion still succeeds.
pub async fn delete_game_stat(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    stat_id: Uuid,
) -> Result<GameStatSummary, ServiceError> {
    let Some(stat) = store.delete_game_stat(stat_id).await? else {
        return Err(ServiceError::NotFound(format!("stat `{stat_id}` not found")));
    };

    let summary = GameStatSummary::from(stat.clone());
    changes.publish(
        Table::GameStats,
        ChangeKind::Delete,
        Some(stat.game_id),
        &summary,
    );

    if let Err(err) = refresh_player_stats(store, changes, stat.player_id).await {
        warn!(
            player_id = %stat.player_id,
            %stat_id,
            error = %err,
            "failed to refresh player stats after deletion"
        );
    }

    Ok(summary)
}
