//! Process-local [`StatsStore`] used for development runs and as the test double of the
//! service layer.

use std::{io, sync::Arc, time::SystemTime};

use dashmap::{DashMap, DashSet};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameEntity, GameEventEntity, GameStatEntity, NewGameEvent, NewGameStat, PlayerStatEntity,
        StatFilter, StatType, Table, TeamEntity, TeamMemberEntity,
    },
    stats_store::StatsStore,
    storage::{StorageError, StorageResult},
};

#[derive(Clone, Default)]
pub struct MemoryStatsStore {
    inner: Arc<MemoryTables>,
}

#[derive(Default)]
struct MemoryTables {
    teams: DashMap<Uuid, TeamEntity>,
    members: DashMap<Uuid, TeamMemberEntity>,
    games: DashMap<Uuid, GameEntity>,
    events: DashMap<Uuid, GameEventEntity>,
    stats: DashMap<Uuid, GameStatEntity>,
    player_stats: DashMap<(Uuid, StatType), PlayerStatEntity>,
    failing: DashSet<Table>,
}

impl MemoryStatsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation touching `table` fail as if the backend were down.
    #[cfg(test)]
    pub(crate) fn fail_on(&self, table: Table) {
        self.inner.failing.insert(table);
    }

    fn guard(&self, table: Table) -> StorageResult<()> {
        if self.inner.failing.contains(&table) {
            return Err(StorageError::unavailable(
                format!("in-memory table `{table}` is offline"),
                io::Error::new(io::ErrorKind::NotConnected, "table offline"),
            ));
        }
        Ok(())
    }

    fn ready<T: Send + 'static>(value: StorageResult<T>) -> BoxFuture<'static, StorageResult<T>> {
        Box::pin(async move { value })
    }

    fn collect_sorted<T, K, F>(map: &DashMap<Uuid, T>, keep: F, key: K) -> Vec<T>
    where
        T: Clone,
        F: Fn(&T) -> bool,
        K: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        let mut rows = map
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        rows.sort_by(key);
        rows
    }
}

impl StatsStore for MemoryStatsStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.guard(Table::Teams).map(|()| {
            self.inner.teams.insert(team.id, team);
        });
        Self::ready(result)
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let result = self
            .guard(Table::Teams)
            .map(|()| self.inner.teams.get(&id).map(|team| team.clone()));
        Self::ready(result)
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let result = self.guard(Table::Teams).map(|()| {
            Self::collect_sorted(&self.inner.teams, |_| true, |a, b| a.name.cmp(&b.name))
        });
        Self::ready(result)
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let result = self
            .guard(Table::Teams)
            .map(|()| self.inner.teams.remove(&id).is_some());
        Self::ready(result)
    }

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.guard(Table::TeamMembers).map(|()| {
            self.inner.members.insert(member.id, member);
        });
        Self::ready(result)
    }

    fn find_member(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamMemberEntity>>> {
        let result = self
            .guard(Table::TeamMembers)
            .map(|()| self.inner.members.get(&id).map(|member| member.clone()));
        Self::ready(result)
    }

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let result = self.guard(Table::TeamMembers).map(|()| {
            Self::collect_sorted(
                &self.inner.members,
                |member| member.team_id == team_id,
                |a, b| {
                    a.jersey_number
                        .cmp(&b.jersey_number)
                        .then_with(|| a.name.cmp(&b.name))
                },
            )
        });
        Self::ready(result)
    }

    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let result = self
            .guard(Table::TeamMembers)
            .map(|()| self.inner.members.remove(&id).is_some());
        Self::ready(result)
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.guard(Table::Games).map(|()| {
            self.inner.games.insert(game.id, game);
        });
        Self::ready(result)
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let result = self
            .guard(Table::Games)
            .map(|()| self.inner.games.get(&id).map(|game| game.clone()));
        Self::ready(result)
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let result = self.guard(Table::Games).map(|()| {
            Self::collect_sorted(
                &self.inner.games,
                |_| true,
                |a, b| a.starts_at.cmp(&b.starts_at),
            )
        });
        Self::ready(result)
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let result = self
            .guard(Table::Games)
            .map(|()| self.inner.games.remove(&id).is_some());
        Self::ready(result)
    }

    fn create_game_event(
        &self,
        event: NewGameEvent,
    ) -> BoxFuture<'static, StorageResult<GameEventEntity>> {
        let result = self.guard(Table::GameEvents).map(|()| {
            let entity = event.into_entity(Uuid::new_v4(), SystemTime::now());
            self.inner.events.insert(entity.id, entity.clone());
            entity
        });
        Self::ready(result)
    }

    fn list_game_events(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>> {
        let result = self.guard(Table::GameEvents).map(|()| {
            Self::collect_sorted(
                &self.inner.events,
                |event| event.game_id == game_id,
                |a, b| a.timestamp.cmp(&b.timestamp),
            )
        });
        Self::ready(result)
    }

    fn record_game_stat(
        &self,
        stat: NewGameStat,
    ) -> BoxFuture<'static, StorageResult<GameStatEntity>> {
        let result = self.guard(Table::GameStats).map(|()| {
            let entity = stat.into_entity(Uuid::new_v4(), SystemTime::now());
            self.inner.stats.insert(entity.id, entity.clone());
            entity
        });
        Self::ready(result)
    }

    fn list_game_stats(
        &self,
        filter: StatFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<GameStatEntity>>> {
        let result = self.guard(Table::GameStats).map(|()| {
            Self::collect_sorted(
                &self.inner.stats,
                |stat| filter.matches(stat),
                |a, b| a.timestamp.cmp(&b.timestamp),
            )
        });
        Self::ready(result)
    }

    fn delete_game_stat(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStatEntity>>> {
        let result = self
            .guard(Table::GameStats)
            .map(|()| self.inner.stats.remove(&id).map(|(_, stat)| stat));
        Self::ready(result)
    }

    fn upsert_player_stat(&self, stat: PlayerStatEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.guard(Table::PlayerStats).map(|()| {
            self.inner
                .player_stats
                .insert((stat.player_id, stat.stat_type.clone()), stat);
        });
        Self::ready(result)
    }

    fn list_player_stats(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatEntity>>> {
        let result = self.guard(Table::PlayerStats).map(|()| {
            let mut rows = self
                .inner
                .player_stats
                .iter()
                .filter(|entry| entry.key().0 == player_id)
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            rows.sort_by(|a, b| a.stat_type.cmp(&b.stat_type));
            rows
        });
        Self::ready(result)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Self::ready(Ok(()))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Self::ready(Ok(()))
    }
}
