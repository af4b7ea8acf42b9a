use serde::Serialize;
use utoipa::ToSchema;

/// Overall availability reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Whether the last store ping succeeded.
    pub storage_reachable: bool,
    /// Open change-feed subscriptions (SSE clients).
    pub change_subscribers: usize,
}

impl HealthResponse {
    pub fn new(storage_reachable: bool, degraded: bool, change_subscribers: usize) -> Self {
        let status = if storage_reachable && !degraded {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            storage_reachable,
            change_subscribers,
        }
    }
}
