//! Team, roster and schedule management.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, Table, TeamEntity, TeamMemberEntity},
        stats_store::StatsStore,
    },
    dto::{
        changes::ChangeKind,
        game::{CreateGameRequest, GameSummary},
        team::{CreateMemberRequest, CreateTeamRequest, MemberSummary, TeamSummary},
    },
    error::ServiceError,
    services::stats_service::{require_game, require_member},
    state::ChangeHub,
};

async fn require_team(store: &dyn StatsStore, team_id: Uuid) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

pub async fn create_team(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    request: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: request.name.trim().to_owned(),
        abbreviation: request.abbreviation,
        created_at: SystemTime::now(),
    };
    store.save_team(team.clone()).await?;
    info!(team_id = %team.id, name = %team.name, "team created");

    let summary = TeamSummary::from(team);
    changes.publish(Table::Teams, ChangeKind::Insert, None, &summary);
    Ok(summary)
}

pub async fn list_teams(store: &dyn StatsStore) -> Result<Vec<TeamSummary>, ServiceError> {
    let teams = store.list_teams().await?;
    Ok(teams.into_iter().map(Into::into).collect())
}

pub async fn get_team(store: &dyn StatsStore, team_id: Uuid) -> Result<TeamSummary, ServiceError> {
    require_team(store, team_id).await.map(Into::into)
}

/// Delete a team without members.
pub async fn delete_team(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    team_id: Uuid,
) -> Result<(), ServiceError> {
    require_team(store, team_id).await?;
    let members = store.list_members(team_id).await?;
    if !members.is_empty() {
        return Err(ServiceError::InvalidState(format!(
            "team `{team_id}` still has {} member(s)",
            members.len()
        )));
    }

    if !store.delete_team(team_id).await? {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }
    changes.publish(Table::Teams, ChangeKind::Delete, None, &team_id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

pub async fn add_member(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    team_id: Uuid,
    request: CreateMemberRequest,
) -> Result<MemberSummary, ServiceError> {
    require_team(store, team_id).await?;

    if let Some(number) = request.jersey_number {
        let taken = store
            .list_members(team_id)
            .await?
            .iter()
            .any(|member| member.jersey_number == Some(number));
        if taken {
            return Err(ServiceError::InvalidState(format!(
                "jersey number {number} is already taken on team `{team_id}`"
            )));
        }
    }

    let member = TeamMemberEntity {
        id: Uuid::new_v4(),
        team_id,
        name: request.name.trim().to_owned(),
        jersey_number: request.jersey_number,
        position: request.position,
        role: request.role,
        account_id: request.account_id,
        created_at: SystemTime::now(),
    };
    store.save_member(member.clone()).await?;
    info!(member_id = %member.id, %team_id, "team member added");

    let summary = MemberSummary::from(member);
    changes.publish(Table::TeamMembers, ChangeKind::Insert, None, &summary);
    Ok(summary)
}

pub async fn list_members(
    store: &dyn StatsStore,
    team_id: Uuid,
) -> Result<Vec<MemberSummary>, ServiceError> {
    require_team(store, team_id).await?;
    let members = store.list_members(team_id).await?;
    Ok(members.into_iter().map(Into::into).collect())
}

pub async fn get_member(
    store: &dyn StatsStore,
    member_id: Uuid,
) -> Result<MemberSummary, ServiceError> {
    require_member(store, member_id).await.map(Into::into)
}

/// Remove a member. Stat rows credited to the member are kept.
pub async fn delete_member(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    member_id: Uuid,
) -> Result<(), ServiceError> {
    if !store.delete_member(member_id).await? {
        return Err(ServiceError::NotFound(format!(
            "team member `{member_id}` not found"
        )));
    }
    changes.publish(Table::TeamMembers, ChangeKind::Delete, None, &member_id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

pub async fn create_game(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    if request.home_team_id == request.away_team_id {
        return Err(ServiceError::InvalidInput(
            "home and away teams must differ".into(),
        ));
    }
    require_team(store, request.home_team_id).await?;
    require_team(store, request.away_team_id).await?;

    let game = GameEntity {
        id: Uuid::new_v4(),
        home_team_id: request.home_team_id,
        away_team_id: request.away_team_id,
        starts_at: request.starts_at.into(),
        location: request.location,
        created_at: SystemTime::now(),
    };
    store.save_game(game.clone()).await?;
    info!(game_id = %game.id, "game scheduled");

    let summary = GameSummary::from(game);
    changes.publish(Table::Games, ChangeKind::Insert, Some(summary.id), &summary);
    Ok(summary)
}

pub async fn list_games(store: &dyn StatsStore) -> Result<Vec<GameSummary>, ServiceError> {
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

pub async fn get_game(store: &dyn StatsStore, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    require_game(store, game_id).await.map(Into::into)
}

/// Delete a game. Its events and stat rows are kept.
pub async fn delete_game(
    store: &dyn StatsStore,
    changes: &ChangeHub,
    game_id: Uuid,
) -> Result<(), ServiceError> {
    if !store.delete_game(game_id).await? {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    }
    changes.publish(Table::Games, ChangeKind::Delete, Some(game_id), &game_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::dao::{models::MemberRole, stats_store::memory::MemoryStatsStore};

    fn team_request(name: &str) -> CreateTeamRequest {
        CreateTeamRequest {
            name: name.into(),
            abbreviation: None,
        }
    }

    fn member_request(name: &str, jersey_number: Option<u8>) -> CreateMemberRequest {
        CreateMemberRequest {
            name: name.into(),
            jersey_number,
            position: None,
            role: MemberRole::Player,
            account_id: None,
        }
    }

    #[tokio::test]
    async fn team_with_members_cannot_be_deleted() {
        let store = MemoryStatsStore::new();
        let changes = ChangeHub::new(8);
        let team = create_team(&store, &changes, team_request(" Rockets "))
            .await
            .unwrap();
        assert_eq!(team.name, "Rockets");

        let member = add_member(&store, &changes, team.id, member_request("Center", Some(19)))
            .await
            .unwrap();
        assert!(matches!(
            delete_team(&store, &changes, team.id).await,
            Err(ServiceError::InvalidState(_))
        ));

        delete_member(&store, &changes, member.id).await.unwrap();
        delete_team(&store, &changes, team.id).await.unwrap();
        assert!(matches!(
            get_team(&store, team.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn jersey_numbers_are_unique_per_team() {
        let store = MemoryStatsStore::new();
        let changes = ChangeHub::new(8);
        let team = create_team(&store, &changes, team_request("Rockets"))
            .await
            .unwrap();
        let other = create_team(&store, &changes, team_request("Comets"))
            .await
            .unwrap();

        add_member(&store, &changes, team.id, member_request("First", Some(7)))
            .await
            .unwrap();
        assert!(matches!(
            add_member(&store, &changes, team.id, member_request("Second", Some(7))).await,
            Err(ServiceError::InvalidState(_))
        ));
        add_member(&store, &changes, other.id, member_request("Third", Some(7)))
            .await
            .unwrap();
        add_member(&store, &changes, team.id, member_request("Coach", None))
            .await
            .unwrap();

        let roster = list_members(&store, team.id).await.unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn games_need_two_distinct_existing_teams() {
        let store = MemoryStatsStore::new();
        let changes = ChangeHub::new(8);
        let home = create_team(&store, &changes, team_request("Home"))
            .await
            .unwrap();
        let away = create_team(&store, &changes, team_request("Away"))
            .await
            .unwrap();
        let request = |home_team_id, away_team_id| CreateGameRequest {
            home_team_id,
            away_team_id,
            starts_at: OffsetDateTime::UNIX_EPOCH,
            location: None,
        };

        assert!(matches!(
            create_game(&store, &changes, request(home.id, home.id)).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            create_game(&store, &changes, request(home.id, Uuid::new_v4())).await,
            Err(ServiceError::NotFound(_))
        ));

        let mut feed = changes.subscribe();
        let game = create_game(&store, &changes, request(home.id, away.id))
            .await
            .unwrap();
        assert_eq!(get_game(&store, game.id).await.unwrap().away_team_id, away.id);
        assert_eq!(feed.recv().await.unwrap().game_id, Some(game.id));

        delete_game(&store, &changes, game.id).await.unwrap();
        assert!(list_games(&store).await.unwrap().is_empty());
        assert!(matches!(
            delete_game(&store, &changes, game.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
