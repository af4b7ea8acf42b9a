use std::{collections::BTreeMap, sync::Arc};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::dao::{
    models::{
        GameEntity, GameEventEntity, GameStatEntity, NewGameEvent, NewGameStat, PlayerStatEntity,
        StatFilter, StatType, Table, TeamEntity, TeamMemberEntity,
    },
    normalize::LooseStatRecord,
    stats_store::StatsStore,
    storage::StorageResult,
};

use super::{
    config::RestConfig,
    error::{RestDaoError, RestResult},
    models::{
        CREATE_GAME_EVENT, CreateGameEventArgs, EventRow, GameRow, MemberRow, PlayerStatRow,
        RECORD_GAME_STAT, RecordGameStatArgs, StatRow, TeamRow,
    },
};

const API_PREFIX: &str = "rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

type Query = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct RestStatsStore {
    client: Client,
    base_url: Arc<str>,
    api_key: Option<Arc<str>>,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

impl RestStatsStore {
    /// Build the HTTP client and verify the API answers.
    pub async fn connect(config: RestConfig) -> RestResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| RestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            api_key: config.api_key.map(Arc::<str>::from),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, API_PREFIX, path);
        let builder = self.client.request(method, url);
        match self.api_key {
            Some(ref key) => builder.header("apikey", key.as_ref()).bearer_auth(key.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> RestResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            Err(RestDaoError::Rejected {
                path: path.to_string(),
                status,
                body,
            })
        } else {
            Err(RestDaoError::RequestStatus {
                path: path.to_string(),
                status,
            })
        }
    }

    async fn decode<T>(path: &str, response: Response) -> RestResult<T>
    where
        T: DeserializeOwned,
    {
        response
            .json::<T>()
            .await
            .map_err(|source| RestDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn ping(&self) -> RestResult<()> {
        self.send(API_PREFIX, self.request(Method::GET, "")).await?;
        Ok(())
    }

    async fn select<T>(&self, table: Table, query: Query) -> RestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = table.as_str();
        let builder = self.request(Method::GET, path).query(&query);
        let response = self.send(path, builder).await?;
        Self::decode(path, response).await
    }

    async fn select_by_id<T>(&self, table: Table, id: Uuid) -> RestResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self
            .select::<T>(table, vec![("id", eq(id)), ("limit", "1".into())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert<T>(&self, table: Table, row: &T, on_conflict: &str) -> RestResult<()>
    where
        T: ?Sized + Serialize,
    {
        let path = table.as_str();
        let builder = self
            .request(Method::POST, path)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(row);
        self.send(path, builder).await?;
        Ok(())
    }

    async fn delete<T>(&self, table: Table, id: Uuid) -> RestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.delete_where(table, vec![("id", eq(id))]).await
    }

    async fn delete_where<T>(&self, table: Table, query: Query) -> RestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = table.as_str();
        let builder = self
            .request(Method::DELETE, path)
            .query(&query)
            .header("Prefer", RETURN_REPRESENTATION);
        let response = self.send(path, builder).await?;
        Self::decode(path, response).await
    }

    async fn rpc<A, T>(&self, procedure: &'static str, args: &A) -> RestResult<T>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        let path = format!("rpc/{procedure}");
        let builder = self.request(Method::POST, &path).json(args);
        let response = self.send(&path, builder).await?;
        let rows: Option<T> = Self::decode(&path, response).await?;
        rows.ok_or(RestDaoError::EmptyResult { procedure })
    }

    async fn list_player_stats(&self, player_id: Uuid) -> RestResult<Vec<PlayerStatEntity>> {
        let path = Table::PlayerStats.as_str();
        let records = self
            .select::<LooseStatRecord>(Table::PlayerStats, player_stat_query(player_id))
            .await?;

        let rows = records
            .into_iter()
            .map(|record| {
                PlayerStatEntity::try_from(record).map_err(|source| RestDaoError::InvalidRow {
                    path: path.to_string(),
                    source,
                })
            })
            .collect::<RestResult<Vec<_>>>()?;
        Ok(latest_per_stat_type(rows))
    }

    /// Write the canonical row, then drop any camelCase-only row it supersedes.
    async fn upsert_player_stat(&self, stat: PlayerStatEntity) -> RestResult<()> {
        let legacy = legacy_player_stat_query(stat.player_id, &stat.stat_type);
        let row = PlayerStatRow::from(stat);
        self.upsert(Table::PlayerStats, &row, "player_id,stat_type")
            .await?;
        self.delete_where::<LooseStatRecord>(Table::PlayerStats, legacy)
            .await?;
        Ok(())
    }
}

/// Rows of a player under either column convention.
fn player_stat_query(player_id: Uuid) -> Query {
    vec![(
        "or",
        format!("(player_id.eq.{player_id},playerId.eq.{player_id})"),
    )]
}

/// Rows for (player, stat type) written only under the camelCase player column.
fn legacy_player_stat_query(player_id: Uuid, stat_type: &StatType) -> Query {
    vec![
        ("playerId", eq(player_id)),
        ("player_id", "is.null".to_string()),
        (
            "or",
            format!("(stat_type.eq.{stat_type},statType.eq.{stat_type})"),
        ),
    ]
}

/// One row per stat type, keeping the most recently refreshed one.
fn latest_per_stat_type(rows: Vec<PlayerStatEntity>) -> Vec<PlayerStatEntity> {
    let mut latest: BTreeMap<StatType, PlayerStatEntity> = BTreeMap::new();
    for row in rows {
        match latest.get(&row.stat_type) {
            Some(kept) if kept.updated_at >= row.updated_at => {}
            _ => {
                latest.insert(row.stat_type.clone(), row);
            }
        }
    }
    latest.into_values().collect()
}

fn stat_query(filter: StatFilter) -> Query {
    let mut query = vec![("order", "timestamp.asc".to_string())];
    if let Some(game_id) = filter.game_id {
        query.push(("game_id", eq(game_id)));
    }
    if let Some(player_id) = filter.player_id {
        query.push(("player_id", eq(player_id)));
    }
    query
}

impl StatsStore for RestStatsStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let row = TeamRow::from(team);
            store
                .upsert(Table::Teams, &row, "id")
                .await
                .map_err(Into::into)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let row = store.select_by_id::<TeamRow>(Table::Teams, id).await?;
            Ok(row.map(Into::into))
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<TeamRow>(Table::Teams, vec![("order", "name.asc".into())])
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.delete::<TeamRow>(Table::Teams, id).await?;
            Ok(!removed.is_empty())
        })
    }

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let row = MemberRow::from(member);
            store
                .upsert(Table::TeamMembers, &row, "id")
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
            let row = store
                .select_by_id::<MemberRow>(Table::TeamMembers, id)
                .await?;
            Ok(row.map(Into::into))
        })
    }

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<MemberRow>(
                    Table::TeamMembers,
                    vec![
                        ("team_id", eq(team_id)),
                        ("order", "jersey_number.asc.nullsfirst,name.asc".into()),
                    ],
                )
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.delete::<MemberRow>(Table::TeamMembers, id).await?;
            Ok(!removed.is_empty())
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let row = GameRow::from(game);
            store
                .upsert(Table::Games, &row, "id")
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let row = store.select_by_id::<GameRow>(Table::Games, id).await?;
            Ok(row.map(Into::into))
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<GameRow>(Table::Games, vec![("order", "starts_at.asc".into())])
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.delete::<GameRow>(Table::Games, id).await?;
            Ok(!removed.is_empty())
        })
    }

    fn create_game_event(
        &self,
        event: NewGameEvent,
    ) -> BoxFuture<'static, StorageResult<GameEventEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let args = CreateGameEventArgs::from(event);
            let row = store.rpc::<_, EventRow>(CREATE_GAME_EVENT, &args).await?;
            Ok(row.into())
        })
    }

    fn list_game_events(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<EventRow>(
                    Table::GameEvents,
                    vec![
                        ("game_id", eq(game_id)),
                        ("order", "timestamp.asc".into()),
                    ],
                )
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn record_game_stat(
        &self,
        stat: NewGameStat,
    ) -> BoxFuture<'static, StorageResult<GameStatEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let args = RecordGameStatArgs::from(stat);
            let row = store.rpc::<_, StatRow>(RECORD_GAME_STAT, &args).await?;
            Ok(row.into())
        })
    }

    fn list_game_stats(
        &self,
        filter: StatFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<GameStatEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<StatRow>(Table::GameStats, stat_query(filter))
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn delete_game_stat(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStatEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.delete::<StatRow>(Table::GameStats, id).await?;
            Ok(removed.into_iter().next().map(Into::into))
        })
    }

    fn upsert_player_stat(&self, stat: PlayerStatEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_player_stat(stat).await.map_err(Into::into) })
    }

    fn list_player_stats(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_player_stats(player_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_query_only_includes_set_filters() {
        let player_id = Uuid::new_v4();
        let query = stat_query(StatFilter::player(player_id));
        assert_eq!(
            query,
            vec![
                ("order", "timestamp.asc".to_string()),
                ("player_id", format!("eq.{player_id}")),
            ]
        );
    }

    #[test]
    fn player_stat_query_matches_both_conventions() {
        let player_id = Uuid::new_v4();
        assert_eq!(
            player_stat_query(player_id),
            vec![(
                "or",
                format!("(player_id.eq.{player_id},playerId.eq.{player_id})")
            )]
        );
    }

    #[test]
    fn legacy_query_targets_camel_only_rows_of_one_type() {
        let player_id = Uuid::new_v4();
        assert_eq!(
            legacy_player_stat_query(player_id, &StatType::PlusMinus),
            vec![
                ("playerId", format!("eq.{player_id}")),
                ("player_id", "is.null".to_string()),
                ("or", "(stat_type.eq.plusMinus,statType.eq.plusMinus)".to_string()),
            ]
        );
    }

    #[test]
    fn camel_and_snake_rows_collapse_to_latest() {
        let player_id = Uuid::new_v4();
        let legacy: LooseStatRecord = serde_json::from_value(serde_json::json!({
            "playerId": player_id.to_string(),
            "statType": "hits",
            "gamesPlayed": 2,
            "value": 3
        }))
        .unwrap();
        let legacy = PlayerStatEntity::try_from(legacy).unwrap();
        let fresh = PlayerStatEntity {
            player_id,
            player_name: "Grinder".into(),
            stat_type: StatType::Hits,
            value: 5,
            games_played: 3,
            updated_at: std::time::SystemTime::now(),
        };
        let goals = PlayerStatEntity {
            stat_type: StatType::Goals,
            value: 1,
            games_played: 1,
            ..fresh.clone()
        };

        let rows = latest_per_stat_type(vec![fresh.clone(), goals.clone(), legacy.clone()]);
        assert_eq!(rows, vec![goals, fresh]);

        let only_legacy = latest_per_stat_type(vec![legacy.clone()]);
        assert_eq!(only_legacy, vec![legacy]);
    }
}
