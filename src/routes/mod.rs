use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod games;
pub mod health;
pub mod members;
pub mod players;
pub mod sse;
pub mod teams;

/// Compose every route tree and bind the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(teams::router())
        .merge(members::router())
        .merge(games::router())
        .merge(players::router())
        .merge(sse::router())
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, dao::stats_store::memory::MemoryStatsStore, state::AppState};

    async fn app() -> Router<()> {
        let state =
            AppState::with_store(AppConfig::default(), Arc::new(MemoryStatsStore::new())).await;
        router(state)
    }

    async fn send(
        app: &Router<()>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn degraded_state_answers_service_unavailable() {
        let app = router(AppState::new(AppConfig::default()));
        let (status, body) = send(&app, "GET", "/teams", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("degraded"));

        let (status, body) = send(&app, "GET", "/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn goal_flow_over_http() {
        let app = app().await;

        let (status, home) = send(
            &app,
            "POST",
            "/teams",
            Some(serde_json::json!({"name": "Home", "abbreviation": "HOM"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, away) = send(
            &app,
            "POST",
            "/teams",
            Some(serde_json::json!({"name": "Away"})),
        )
        .await;

        let (status, scorer) = send(
            &app,
            "POST",
            &format!("/teams/{}/members", home["id"].as_str().unwrap()),
            Some(serde_json::json!({
                "name": "Scorer",
                "jersey_number": 91,
                "position": "center"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, game) = send(
            &app,
            "POST",
            "/games",
            Some(serde_json::json!({
                "home_team_id": home["id"],
                "away_team_id": away["id"],
                "starts_at": "2024-11-02T19:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let game_id = game["id"].as_str().unwrap();

        let (status, recorded) = send(
            &app,
            "POST",
            &format!("/games/{game_id}/events"),
            Some(serde_json::json!({
                "period": 1,
                "team_type": "home",
                "details": {"event_type": "goal", "scorer_id": scorer["id"]}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["event"]["event_type"], "goal");
        assert_eq!(recorded["stats"][0]["stat_type"], "goals");
        assert_eq!(recorded["refreshing"][0], scorer["id"]);

        let (_, score) = send(&app, "GET", &format!("/games/{game_id}/score"), None).await;
        assert_eq!(score["home"], 1);
        assert_eq!(score["away"], 0);

        let (status, stats) = send(
            &app,
            "GET",
            &format!("/players/{}/stats", scorer["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["stats"]["goals"]["value"], 1);
        assert_eq!(stats["stats"]["goals"]["games_played"], 1);

        let scorer_id = scorer["id"].as_str().unwrap();
        let (status, goals) =
            send(&app, "GET", &format!("/players/{scorer_id}/stats/goals"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(goals["stat_type"], "goals");
        assert_eq!(goals["value"], 1);

        let (status, cached) =
            send(&app, "GET", &format!("/players/{scorer_id}/stats/cached"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cached.is_array());
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let app = app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/teams",
            Some(serde_json::json!({"name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/games/{}/events", uuid::Uuid::new_v4()),
            Some(serde_json::json!({
                "period": 1,
                "details": {"event_type": "hit", "player_id": uuid::Uuid::new_v4()}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = format!("/stats/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, "DELETE", &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
