//! Plus/minus attribution for skaters on the ice when a goal is scored.

use thiserror::Error;
use uuid::Uuid;

use crate::dao::{
    models::{GameEntity, TeamMemberEntity, TeamType},
    stats_store::StatsStore,
    storage::StorageError,
};

/// Sign of a plus/minus row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlusMinus {
    Plus,
    Minus,
}

impl PlusMinus {
    /// Value written to the `plusMinus` stat row.
    pub fn value(self) -> i32 {
        match self {
            PlusMinus::Plus => 1,
            PlusMinus::Minus => -1,
        }
    }
}

/// Reasons the resolver cannot decide a sign.
#[derive(Debug, Error)]
pub enum PlusMinusError {
    #[error("team member `{0}` not found")]
    MemberNotFound(Uuid),
    #[error("game `{0}` not found")]
    GameNotFound(Uuid),
    #[error("team `{team_id}` of member `{player_id}` does not play in game `{game_id}`")]
    NotInGame {
        game_id: Uuid,
        player_id: Uuid,
        team_id: Uuid,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Decide the sign for a player whose team and game are already known.
///
/// Plus when the player's side is the side credited with the goal.
pub fn resolve_for(
    game: &GameEntity,
    member: &TeamMemberEntity,
    scoring: TeamType,
) -> Result<PlusMinus, PlusMinusError> {
    let side = game
        .side_of(member.team_id)
        .ok_or(PlusMinusError::NotInGame {
            game_id: game.id,
            player_id: member.id,
            team_id: member.team_id,
        })?;

    let player_is_home = side == TeamType::Home;
    let goal_is_home = scoring == TeamType::Home;
    Ok(if player_is_home == goal_is_home {
        PlusMinus::Plus
    } else {
        PlusMinus::Minus
    })
}

/// Look up the player's team and the game, then decide the sign.
pub async fn resolve(
    store: &dyn StatsStore,
    game_id: Uuid,
    player_id: Uuid,
    scoring: TeamType,
) -> Result<PlusMinus, PlusMinusError> {
    let member = store
        .find_member(player_id)
        .await?
        .ok_or(PlusMinusError::MemberNotFound(player_id))?;
    let game = store
        .find_game(game_id)
        .await?
        .ok_or(PlusMinusError::GameNotFound(game_id))?;

    resolve_for(&game, &member, scoring)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::{
        models::{MemberRole, Table},
        stats_store::memory::MemoryStatsStore,
    };

    fn game(home: Uuid, away: Uuid) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            home_team_id: home,
            away_team_id: away,
            starts_at: SystemTime::UNIX_EPOCH,
            location: None,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn member(team_id: Uuid) -> TeamMemberEntity {
        TeamMemberEntity {
            id: Uuid::new_v4(),
            team_id,
            name: "Skater".into(),
            jersey_number: Some(9),
            position: None,
            role: MemberRole::Player,
            account_id: None,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn truth_table() {
        let (home, away) = (Uuid::new_v4(), Uuid::new_v4());
        let game = game(home, away);
        let home_player = member(home);
        let away_player = member(away);

        let cases = [
            (&home_player, TeamType::Home, PlusMinus::Plus),
            (&home_player, TeamType::Away, PlusMinus::Minus),
            (&away_player, TeamType::Home, PlusMinus::Minus),
            (&away_player, TeamType::Away, PlusMinus::Plus),
        ];

        for (player, scoring, expected) in cases {
            assert_eq!(resolve_for(&game, player, scoring).unwrap(), expected);
        }
    }

    #[test]
    fn outsider_cannot_be_resolved() {
        let game = game(Uuid::new_v4(), Uuid::new_v4());
        let outsider = member(Uuid::new_v4());
        assert!(matches!(
            resolve_for(&game, &outsider, TeamType::Home),
            Err(PlusMinusError::NotInGame { .. })
        ));
    }

    #[tokio::test]
    async fn resolve_reads_member_and_game_from_store() {
        let store = MemoryStatsStore::new();
        let (home, away) = (Uuid::new_v4(), Uuid::new_v4());
        let game = game(home, away);
        let player = member(away);
        store.save_game(game.clone()).await.unwrap();
        store.save_member(player.clone()).await.unwrap();

        let sign = resolve(&store, game.id, player.id, TeamType::Away)
            .await
            .unwrap();
        assert_eq!(sign, PlusMinus::Plus);
        assert_eq!(sign.value(), 1);
    }

    #[tokio::test]
    async fn missing_rows_are_reported() {
        let store = MemoryStatsStore::new();
        let player = member(Uuid::new_v4());
        let game_id = Uuid::new_v4();

        assert!(matches!(
            resolve(&store, game_id, player.id, TeamType::Home).await,
            Err(PlusMinusError::MemberNotFound(id)) if id == player.id
        ));

        store.save_member(player.clone()).await.unwrap();
        assert!(matches!(
            resolve(&store, game_id, player.id, TeamType::Home).await,
            Err(PlusMinusError::GameNotFound(id)) if id == game_id
        ));

        store.fail_on(Table::TeamMembers);
        assert!(matches!(
            resolve(&store, game_id, player.id, TeamType::Home).await,
            Err(PlusMinusError::Storage(_))
        ));
    }
}
