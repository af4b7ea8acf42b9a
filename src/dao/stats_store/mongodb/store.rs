use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::{MongoConnection, ping},
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_EVENTS, GAME_STATS, GAMES, MongoEventDocument, MongoGameDocument,
        MongoMemberDocument, MongoPlayerStatDocument, MongoStatDocument, MongoTeamDocument,
        PLAYER_STATS, TEAM_MEMBERS, TEAMS, doc_id, player_stat_key,
    },
};
use crate::dao::{
    models::{
        GameEntity, GameEventEntity, GameStatEntity, NewGameEvent, NewGameStat, PlayerStatEntity,
        StatFilter, TeamEntity, TeamMemberEntity,
    },
    stats_store::StatsStore,
    storage::StorageResult,
};

/// Indexes backing the equality filters and orderings of [`StatsStore`] reads.
const INDEXES: &[(&str, &str, fn() -> Document)] = &[
    (TEAM_MEMBERS, "member_team_idx", || doc! {"team_id": 1, "jersey_number": 1}),
    (GAMES, "game_start_idx", || doc! {"starts_at": 1}),
    (GAME_EVENTS, "event_game_idx", || doc! {"game_id": 1, "timestamp": 1}),
    (GAME_STATS, "stat_player_idx", || doc! {"player_id": 1, "timestamp": 1}),
    (GAME_STATS, "stat_game_idx", || doc! {"game_id": 1, "timestamp": 1}),
    (PLAYER_STATS, "player_stat_player_idx", || doc! {"player_id": 1}),
];

#[derive(Clone)]
pub struct MongoStatsStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    connection: RwLock<MongoConnection>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.connection.read().await.database.clone();
        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    /// Swap in a fresh client; the old one is dropped with the replaced connection.
    async fn reconnect(&self) -> MongoResult<()> {
        let fresh = MongoConnection::open(&self.config).await?;
        *self.connection.write().await = fresh;
        Ok(())
    }
}

impl MongoStatsStore {
    /// Connect to MongoDB and ensure the read indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let connection = MongoConnection::open(&config).await?;
        let inner = Arc::new(MongoInner {
            connection: RwLock::new(connection),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for &(collection, name, keys) in INDEXES {
            let index = IndexModel::builder()
                .keys(keys())
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.connection.read().await.database.clone()
    }

    async fn collection<D>(&self, name: &str) -> Collection<D>
    where
        D: Send + Sync,
    {
        self.inner.connection.read().await.database.collection::<D>(name)
    }

    async fn find_one<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let document = self
            .collection::<D>(name)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;
        document.map(E::try_from).transpose()
    }

    async fn find_many<D, E>(
        &self,
        name: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(name)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn upsert<D>(&self, name: &'static str, filter: Document, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(name)
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    async fn insert<D>(&self, name: &'static str, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(name)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    async fn delete(&self, name: &'static str, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(name)
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn create_game_event(&self, event: NewGameEvent) -> MongoResult<GameEventEntity> {
        let entity = event.into_entity(Uuid::new_v4(), SystemTime::now());
        self.insert(GAME_EVENTS, MongoEventDocument::from(entity.clone()))
            .await?;
        Ok(entity)
    }

    async fn record_game_stat(&self, stat: NewGameStat) -> MongoResult<GameStatEntity> {
        let entity = stat.into_entity(Uuid::new_v4(), SystemTime::now());
        self.insert(GAME_STATS, MongoStatDocument::from(entity.clone()))
            .await?;
        Ok(entity)
    }

    async fn delete_game_stat(&self, id: Uuid) -> MongoResult<Option<GameStatEntity>> {
        let removed = self
            .collection::<MongoStatDocument>(GAME_STATS)
            .await
            .find_one_and_delete(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAME_STATS,
                source,
            })?;
        removed.map(GameStatEntity::try_from).transpose()
    }
}

fn stat_filter(filter: StatFilter) -> Document {
    let mut query = Document::new();
    if let Some(game_id) = filter.game_id {
        query.insert("game_id", game_id.to_string());
    }
    if let Some(player_id) = filter.player_id {
        query.insert("player_id", player_id.to_string());
    }
    query
}

impl StatsStore for MongoStatsStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(team.id);
            store
                .upsert(TEAMS, filter, MongoTeamDocument::from(team))
                .await
                .map_err(Into::into)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoTeamDocument, TeamEntity>(TEAMS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoTeamDocument, TeamEntity>(TEAMS, doc! {}, doc! {"name": 1})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(TEAMS, id).await.map_err(Into::into) })
    }

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(member.id);
            store
                .upsert(TEAM_MEMBERS, filter, MongoMemberDocument::from(member))
                .await
                .map_err(Into::into)
        })
    }

    fn find_member(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoMemberDocument, TeamMemberEntity>(TEAM_MEMBERS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoMemberDocument, TeamMemberEntity>(
                    TEAM_MEMBERS,
                    doc! {"team_id": team_id.to_string()},
                    doc! {"jersey_number": 1, "name": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(TEAM_MEMBERS, id).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(game.id);
            store
                .upsert(GAMES, filter, MongoGameDocument::from(game))
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoGameDocument, GameEntity>(GAMES, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoGameDocument, GameEntity>(GAMES, doc! {}, doc! {"starts_at": 1})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(GAMES, id).await.map_err(Into::into) })
    }

    fn create_game_event(
        &self,
        event: NewGameEvent,
    ) -> BoxFuture<'static, StorageResult<GameEventEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_game_event(event).await.map_err(Into::into) })
    }

    fn list_game_events(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoEventDocument, GameEventEntity>(
                    GAME_EVENTS,
                    doc! {"game_id": game_id.to_string()},
                    doc! {"timestamp": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn record_game_stat(
        &self,
        stat: NewGameStat,
    ) -> BoxFuture<'static, StorageResult<GameStatEntity>> {
        let store = self.clone();
        Box::pin(async move { store.record_game_stat(stat).await.map_err(Into::into) })
    }

    fn list_game_stats(
        &self,
        filter: StatFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<GameStatEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoStatDocument, GameStatEntity>(
                    GAME_STATS,
                    stat_filter(filter),
                    doc! {"timestamp": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn delete_game_stat(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStatEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game_stat(id).await.map_err(Into::into) })
    }

    fn upsert_player_stat(&self, stat: PlayerStatEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"_id": player_stat_key(stat.player_id, &stat.stat_type)};
            store
                .upsert(PLAYER_STATS, filter, MongoPlayerStatDocument::from(stat))
                .await
                .map_err(Into::into)
        })
    }

    fn list_player_stats(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoPlayerStatDocument, PlayerStatEntity>(
                    PLAYER_STATS,
                    doc! {"player_id": player_id.to_string()},
                    doc! {"stat_type": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
