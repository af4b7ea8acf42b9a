use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the installed store and combine the result with the degraded flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        None => {
            warn!("no storage connection installed (degraded mode)");
            false
        }
    };

    HealthResponse::new(
        reachable,
        state.is_degraded(),
        state.changes().subscriber_count(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::stats_store::memory::MemoryStatsStore, dto::health::HealthStatus,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let report = health_status(&state).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.storage_reachable);

        state.set_store(Arc::new(MemoryStatsStore::new())).await;
        let _feed = state.changes().subscribe();
        let report = health_status(&state).await;
        assert_eq!(report.status, HealthStatus::Ok);
        assert_eq!(report.change_subscribers, 1);
    }
}
