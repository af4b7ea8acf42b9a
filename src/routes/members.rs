use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::team::MemberSummary, error::AppError, services::roster_service, state::SharedState,
};

/// Endpoints addressing a member directly by its id.
pub fn router() -> Router<SharedState> {
    Router::new().route("/members/{id}", get(get_member).delete(delete_member))
}

/// Retrieve a team member.
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team member identifier")),
    responses(
        (status = 200, description = "Team member", body = MemberSummary),
        (status = 404, description = "Unknown member")
    )
)]
pub async fn get_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberSummary>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::get_member(store.as_ref(), id).await?))
}

/// Remove a member from its team. Recorded stats are kept.
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team member identifier")),
    responses((status = 204, description = "Member removed"))
)]
pub async fn delete_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let store = state.require_store().await?;
    roster_service::delete_member(store.as_ref(), state.changes(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
