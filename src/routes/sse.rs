use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::changes::ChangeQuery,
    error::AppError,
    services::{roster_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/games/{id}/changes",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier"), ChangeQuery),
    responses((status = 200, description = "Row changes of the game", content_type = "text/event-stream", body = String))
)]
/// Stream row-level changes of one game.
pub async fn game_changes(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ChangeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let store = state.require_store().await?;
    roster_service::get_game(store.as_ref(), id).await?;

    let receiver = state.changes().subscribe();
    info!(game_id = %id, table = ?query.table, "New change SSE connection");
    Ok(sse_service::change_stream(receiver, id, query.table))
}

#[utoipa::path(
    get,
    path = "/games/{id}/score/stream",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Score after every event change", content_type = "text/event-stream", body = String))
)]
/// Stream the game score, re-derived whenever the game's events change.
pub async fn score_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(game_id = %id, "New score SSE connection");
    sse_service::score_stream(state, id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/games/{id}/changes", get(game_changes))
        .route("/games/{id}/score/stream", get(score_stream))
}
