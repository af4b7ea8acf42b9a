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
        stats::TeamStatsResponse,
        team::{CreateMemberRequest, CreateTeamRequest, MemberSummary, TeamSummary},
    },
    error::AppError,
    services::{roster_service, stats_service},
    state::SharedState,
};

/// Team and roster endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", get(get_team).delete(delete_team))
        .route("/teams/{id}/members", get(list_members).post(add_member))
        .route("/teams/{id}/stats", get(team_stats))
}

/// List registered teams ordered by name.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses((status = 200, description = "Registered teams", body = [TeamSummary]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::list_teams(store.as_ref()).await?))
}

/// Register a team.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamSummary),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<(StatusCode, Json<TeamSummary>), AppError> {
    let store = state.require_store().await?;
    let team = roster_service::create_team(store.as_ref(), state.changes(), payload).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Retrieve a team by its ID.
#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team", body = TeamSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamSummary>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::get_team(store.as_ref(), id).await?))
}

/// Delete a team that has no members left.
#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 409, description = "Team still has members")
    )
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let store = state.require_store().await?;
    roster_service::delete_team(store.as_ref(), state.changes(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a team's roster ordered by jersey number.
#[utoipa::path(
    get,
    path = "/teams/{id}/members",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses((status = 200, description = "Roster", body = [MemberSummary]))
)]
pub async fn list_members(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemberSummary>>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(roster_service::list_members(store.as_ref(), id).await?))
}

/// Add a player or coach to a team.
#[utoipa::path(
    post,
    path = "/teams/{id}/members",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberSummary),
        (status = 409, description = "Jersey number already taken")
    )
)]
pub async fn add_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CreateMemberRequest>>,
) -> Result<(StatusCode, Json<MemberSummary>), AppError> {
    let store = state.require_store().await?;
    let member = roster_service::add_member(store.as_ref(), state.changes(), id, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Per-member aggregates of a team and its totals.
#[utoipa::path(
    get,
    path = "/teams/{id}/stats",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses((status = 200, description = "Team stats", body = TeamStatsResponse))
)]
pub async fn team_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamStatsResponse>, AppError> {
    let store = state.require_store().await?;
    Ok(Json(stats_service::team_stats(store.as_ref(), id).await?))
}
