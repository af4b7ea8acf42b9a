use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Hockey Stats Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::teams::list_teams,
        crate::routes::teams::create_team,
        crate::routes::teams::get_team,
        crate::routes::teams::delete_team,
        crate::routes::teams::list_members,
        crate::routes::teams::add_member,
        crate::routes::teams::team_stats,
        crate::routes::members::get_member,
        crate::routes::members::delete_member,
        crate::routes::games::list_games,
        crate::routes::games::create_game,
        crate::routes::games::get_game,
        crate::routes::games::delete_game,
        crate::routes::games::list_events,
        crate::routes::games::record_event,
        crate::routes::games::game_stats,
        crate::routes::games::game_score,
        crate::routes::players::player_stats,
        crate::routes::players::player_stat,
        crate::routes::players::cached_player_stats,
        crate::routes::players::refresh_player_stats,
        crate::routes::players::delete_stat,
        crate::routes::sse::game_changes,
        crate::routes::sse::score_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::team::CreateTeamRequest,
            crate::dto::team::TeamSummary,
            crate::dto::team::CreateMemberRequest,
            crate::dto::team::MemberSummary,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::game::GameScore,
            crate::dto::event::RecordEventRequest,
            crate::dto::event::RecordEventResponse,
            crate::dto::event::GameEventSummary,
            crate::dto::event::GameStatSummary,
            crate::dto::stats::StatTotalDto,
            crate::dto::stats::PlayerStatsResponse,
            crate::dto::stats::PlayerStatResponse,
            crate::dto::stats::CachedStatSummary,
            crate::dto::stats::TeamStatsResponse,
            crate::dto::changes::RowChange,
            crate::dto::changes::ChangeKind,
            crate::dao::models::Table,
            crate::dao::models::TeamType,
            crate::dao::models::EventType,
            crate::dao::models::EventDetails,
            crate::dao::models::PenaltyDuration,
            crate::dao::models::FaceoffOutcome,
            crate::dao::models::ShotAttribution,
            crate::dao::models::MemberRole,
            crate::dao::models::Position,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Teams and rosters"),
        (name = "games", description = "Game schedule and score"),
        (name = "events", description = "Event recording"),
        (name = "stats", description = "Raw and aggregated statistics"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/teams/{id}/members",
            "/games/{id}/events",
            "/games/{id}/score/stream",
            "/players/{id}/stats/refresh",
            "/stats/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
