use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        event::{GameEventSummary, GameStatSummary, RecordEventRequest, RecordEventResponse},
        game::{CreateGameRequest, GameScore, GameSummary},
    },
    error::AppError,
    services::{
        recorder::{self, EventPayload},
        roster_service, stats_service,
    },
    state::SharedState,
};

/// Game schedule, event recording and per-game reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/events", get(list_events).post(record_event))
        .route("/games/{id}/stats", get(game_stats))
        .route("/games/{id}/score", get(game_score))
}

/// List scheduled games ordered by start time.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses((status = 200, description = "Scheduled games", body = [GameSummary]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::list_games(store.as_ref()).await?))
}

/// Schedule a game between two existing teams.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game scheduled", body = GameSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameSummary>), AppError> {
    let store = state.require_store().await?;
    let game = roster_service::create_game(store.as_ref(), state.changes(), payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Retrieve a game by its ID.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::get_game(store.as_ref(), id).await?))
}

/// Delete a game. Recorded events and stats are kept.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let store = state.require_store().await?;
    roster_service::delete_game(store.as_ref(), state.changes(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a game's raw events.
#[utoipa::path(
    get,
    path = "/games/{id}/events",
    tag = "events",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Recorded events", body = [GameEventSummary]))
)]
pub async fn list_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GameEventSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(stats_service::game_events(store.as_ref(), id).await?))
}

/// Record an event and derive its stat rows.
///
/// Cached player stats are refreshed in the background; the response lists the
/// players being refreshed without waiting for it.
#[utoipa::path(
    post,
    path = "/games/{id}/events",
    tag = "events",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = RecordEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = RecordEventResponse),
        (status = 400, description = "Missing period or team type"),
        (status = 404, description = "Unknown game"),
        (status = 503, description = "A write failed or the store is unavailable")
    )
)]
pub async fn record_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RecordEventRequest>>,
) -> Result<(StatusCode, Json<RecordEventResponse>), AppError> {
    let store = state.require_store().await?;
    let outcome = recorder::record_event(
        store,
        state.changes(),
        state.config().penalties,
        EventPayload {
            game_id: id,
            period: payload.period,
            team_type: payload.team_type,
            details: payload.details,
        },
    )
    .await?;

    let response = RecordEventResponse {
        refreshing: outcome.refresh.players().to_vec(),
        event: outcome.event.into(),
        stats: outcome.stats.into_iter().map(Into::into).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Raw stat rows recorded in a game.
#[utoipa::path(
    get,
    path = "/games/{id}/stats",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Stat rows", body = [GameStatSummary]))
)]
pub async fn game_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GameStatSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(stats_service::game_stats(store.as_ref(), id).await?))
}

/// Goals per side derived from goal events.
#[utoipa::path(
    get,
    path = "/games/{id}/score",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Current score", body = GameScore))
)]
pub async fn game_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameScore>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(stats_service::game_score(store.as_ref(), id).await?))
}
