/// Reduction of raw stat rows into per-type totals.
pub mod aggregator;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Plus/minus sign resolution for goals.
pub mod plus_minus;
/// Event recording and stat derivation.
pub mod recorder;
/// Team, member and game management.
pub mod roster_service;
/// Server-Sent Events streaming of the change feed.
pub mod sse_service;
/// Player, team and game stat reads plus the cached aggregate refresh.
pub mod stats_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
