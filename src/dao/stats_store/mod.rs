pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;
#[cfg(feature = "rest-store")]
pub mod rest;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, GameEventEntity, GameStatEntity, NewGameEvent, NewGameStat, PlayerStatEntity,
    StatFilter, TeamEntity, TeamMemberEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the remote data store holding rosters, games and stat rows.
///
/// Reads returning collections are ordered: teams by name, members by jersey number
/// then name, games by start time, events and stat rows by timestamp.
pub trait StatsStore: Send + Sync {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_member(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<TeamMemberEntity>>>;
    fn list_members(&self, team_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>>;
    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Server-side procedure writing one event row; the store assigns id and timestamp.
    fn create_game_event(
        &self,
        event: NewGameEvent,
    ) -> BoxFuture<'static, StorageResult<GameEventEntity>>;
    fn list_game_events(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>>;

    /// Server-side procedure writing one stat row; the store assigns id and timestamp.
    fn record_game_stat(&self, stat: NewGameStat)
    -> BoxFuture<'static, StorageResult<GameStatEntity>>;
    fn list_game_stats(
        &self,
        filter: StatFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<GameStatEntity>>>;
    /// Remove a stat row, returning it when it existed.
    fn delete_game_stat(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStatEntity>>>;

    /// Insert or replace the cached aggregate keyed by (player, stat type).
    fn upsert_player_stat(&self, stat: PlayerStatEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_player_stats(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
