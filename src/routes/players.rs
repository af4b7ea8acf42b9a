use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dao::models::StatType,
    dto::{
        event::GameStatSummary,
        stats::{CachedStatSummary, PlayerStatResponse, PlayerStatsResponse},
    },
    error::AppError,
    services::stats_service,
    state::SharedState,
};

/// Player aggregates and administrative stat removal.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{id}/stats", get(player_stats))
        .route("/players/{id}/stats/cached", get(cached_player_stats))
        .route("/players/{id}/stats/{stat_type}", get(player_stat))
        .route("/players/{id}/stats/refresh", post(refresh_player_stats))
        .route("/stats/{id}", delete(delete_stat))
}

/// Aggregate a player's raw stat rows on demand.
#[utoipa::path(
    get,
    path = "/players/{id}/stats",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Team member identifier")),
    responses(
        (status = 200, description = "Aggregated stats", body = PlayerStatsResponse),
        (status = 404, description = "Unknown member")
    )
)]
pub async fn player_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(stats_service::player_stats(store.as_ref(), id).await?))
}

/// Aggregate a single stat type of a player on demand.
#[utoipa::path(
    get,
    path = "/players/{id}/stats/{stat_type}",
    tag = "stats",
    params(
        ("id" = Uuid, Path, description = "Team member identifier"),
        ("stat_type" = String, Path, description = "Stat type tag, e.g. `goals` or `plusMinus`")
    ),
    responses(
        (status = 200, description = "Aggregate of one stat type", body = PlayerStatResponse),
        (status = 404, description = "Unknown member")
    )
)]
pub async fn player_stat(
    State(state): State<SharedState>,
    Path((id, stat_type)): Path<(Uuid, String)>,
) -> Result<Json<PlayerStatResponse>, AppError> {
    let store = state.require_store().await?;
    let stat_type = StatType::from(stat_type);
    Ok(Json(
        stats_service::player_stat(store.as_ref(), id, stat_type).await?,
    ))
}

/// Read the cached aggregate rows of a player.
#[utoipa::path(
    get,
    path = "/players/{id}/stats/cached",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Team member identifier")),
    responses((status = 200, description = "Cached aggregates", body = [CachedStatSummary]))
)]
pub async fn cached_player_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CachedStatSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(
        stats_service::cached_player_stats(store.as_ref(), id).await?,
    ))
}

/// Recompute and store a player's cached aggregates.
#[utoipa::path(
    post,
    path = "/players/{id}/stats/refresh",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Team member identifier")),
    responses((status = 200, description = "Refreshed aggregates", body = [CachedStatSummary]))
)]
pub async fn refresh_player_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CachedStatSummary>>, AppError> {
    let store = state.require_store().await?;
    let refreshed =
        stats_service::refresh_player_stats(store.as_ref(), state.changes(), id).await?;
    Ok(Json(refreshed.into_iter().map(Into::into).collect()))
}

/// Delete a raw stat row and refresh the affected player's cache.
#[utoipa::path(
    delete,
    path = "/stats/{id}",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Stat row identifier")),
    responses(
        (status = 200, description = "Deleted row", body = GameStatSummary),
        (status = 404, description = "Unknown stat row")
    )
)]
pub async fn delete_stat(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameStatSummary>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(
        stats_service::delete_game_stat(store.as_ref(), state.changes(), id).await?,
    ))
}
