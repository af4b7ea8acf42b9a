/// Database model definitions.
pub mod models;
/// Boundary adapter reconciling stat rows written under two naming conventions.
pub mod normalize;
/// Persistence of rosters, games, events and stat rows.
pub mod stats_store;
/// Storage abstraction layer for database operations.
pub mod storage;
