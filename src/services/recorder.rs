//! Event recording: persist one raw event, derive its stat rows, then refresh the
//! cached aggregates of every player involved in the background.
//!
//! Writes are independent store calls without a surrounding transaction. When a
//! stat write fails after the event row was written, the event stays behind and
//! is logged with its id; nothing is rolled back or retried.

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::PenaltyMinutes,
    dao::{
        models::{
            EventDetails, FaceoffOutcome, GameEventEntity, GameStatEntity, NewGameEvent,
            NewGameStat, ShotAttribution, StatType, Table, TeamType,
        },
        stats_store::StatsStore,
    },
    dto::{
        changes::ChangeKind,
        event::{GameEventSummary, GameStatSummary},
    },
    error::ServiceError,
    services::{plus_minus, stats_service},
    state::ChangeHub,
};

/// Event submitted for recording, before validation.
#[derive(Debug, Clone)]
pub struct EventPayload {
    pub game_id: Uuid,
    pub period: u8,
    pub team_type: Option<TeamType>,
    pub details: EventDetails,
}

/// Rows written for an event, plus the handle of the refresh it triggered.
#[derive(Debug)]
pub struct RecordOutcome {
    pub event: GameEventEntity,
    pub stats: Vec<GameStatEntity>,
    pub refresh: RefreshHandle,
}

/// A player whose cached stats could not be refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub player_id: Uuid,
    pub message: String,
}

/// Result of a background refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<Uuid>,
    pub failed: Vec<RefreshFailure>,
}

impl RefreshReport {
    /// Whether every player was refreshed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handle on the spawned refresh task. Dropping it detaches the task.
#[derive(Debug)]
pub struct RefreshHandle {
    players: Vec<Uuid>,
    task: JoinHandle<RefreshReport>,
}

impl RefreshHandle {
    /// Players scheduled for refresh, in order.
    pub fn players(&self) -> &[Uuid] {
        &self.players
    }

    /// Wait for the refresh to finish.
    pub async fn join(self) -> RefreshReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) => RefreshReport {
                refreshed: Vec::new(),
                failed: self
                    .players
                    .into_iter()
                    .map(|player_id| RefreshFailure {
                        player_id,
                        message: format!("refresh task aborted: {err}"),
                    })
                    .collect(),
            },
        }
    }
}

/// Validate, persist and expand an event into stat rows.
pub async fn record_event(
    store: Arc<dyn StatsStore>,
    changes: &ChangeHub,
    penalties: PenaltyMinutes,
    payload: EventPayload,
) -> Result<RecordOutcome, ServiceError> {
    let team_type = validate(&payload)?;
    stats_service::require_game(store.as_ref(), payload.game_id).await?;

    let event = store
        .create_game_event(NewGameEvent {
            game_id: payload.game_id,
            period: payload.period,
            team_type,
            details: payload.details,
        })
        .await?;
    changes.publish(
        Table::GameEvents,
        ChangeKind::Insert,
        Some(event.game_id),
        &GameEventSummary::from(event.clone()),
    );

    let pending = derive_stats(store.as_ref(), &event, penalties).await;
    let mut stats = Vec::with_capacity(pending.len());
    for stat in pending {
        let written = store.record_game_stat(stat).await.map_err(|err| {
            error!(
                event_id = %event.id,
                game_id = %event.game_id,
                written = stats.len(),
                error = %err,
                "stat write failed after event write; event left without its stats"
            );
            err
        })?;
        changes.publish(
            Table::GameStats,
            ChangeKind::Insert,
            Some(written.game_id),
            &GameStatSummary::from(written.clone()),
        );
        stats.push(written);
    }

    info!(
        event_id = %event.id,
        event_type = event.event_type.as_str(),
        stats = stats.len(),
        "recorded game event"
    );

    let refresh = spawn_refresh(store, changes.clone(), involved_players(&stats));
    Ok(RecordOutcome {
        event,
        stats,
        refresh,
    })
}

fn validate(payload: &EventPayload) -> Result<TeamType, ServiceError> {
    if payload.game_id.is_nil() {
        return Err(ServiceError::InvalidInput("game id is required".into()));
    }
    if payload.period == 0 {
        return Err(ServiceError::InvalidInput("period must be at least 1".into()));
    }
    if let EventDetails::Goal {
        scorer_id,
        primary_assist_id,
        secondary_assist_id,
        ..
    } = &payload.details
    {
        validate_goal_credits(*scorer_id, *primary_assist_id, *secondary_assist_id)?;
    }
    payload
        .team_type
        .ok_or_else(|| ServiceError::InvalidInput("team type is required".into()))
}

/// One goal credits each player at most once: scorer and assists must be distinct.
fn validate_goal_credits(
    scorer_id: Uuid,
    primary_assist_id: Option<Uuid>,
    secondary_assist_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if secondary_assist_id.is_some() && primary_assist_id.is_none() {
        return Err(ServiceError::InvalidInput(
            "secondary assist requires a primary assist".into(),
        ));
    }
    let mut credited = vec![scorer_id];
    for assist in [primary_assist_id, secondary_assist_id].into_iter().flatten() {
        if credited.contains(&assist) {
            return Err(ServiceError::InvalidInput(format!(
                "player `{assist}` is credited twice for the same goal"
            )));
        }
        credited.push(assist);
    }
    Ok(())
}

fn stat_row(
    event: &GameEventEntity,
    player_id: Uuid,
    stat_type: StatType,
    value: i32,
) -> NewGameStat {
    NewGameStat {
        game_id: event.game_id,
        player_id,
        stat_type,
        period: event.period,
        value,
        details: json!({
            "event_id": event.id,
            "event_type": event.event_type,
            "team_type": event.team_type,
        }),
    }
}

/// Stat rows produced by an event.
async fn derive_stats(
    store: &dyn StatsStore,
    event: &GameEventEntity,
    penalties: PenaltyMinutes,
) -> Vec<NewGameStat> {
    match &event.details {
        EventDetails::Goal {
            scorer_id,
            primary_assist_id,
            secondary_assist_id,
            on_ice,
        } => {
            let mut rows = vec![stat_row(event, *scorer_id, StatType::Goals, 1)];
            rows.extend(
                [primary_assist_id, secondary_assist_id]
                    .into_iter()
                    .flatten()
                    .map(|assist| stat_row(event, *assist, StatType::Assists, 1)),
            );

            let mut seen = Vec::with_capacity(on_ice.len());
            for player_id in on_ice {
                if seen.contains(player_id) {
                    continue;
                }
                seen.push(*player_id);
                match plus_minus::resolve(store, event.game_id, *player_id, event.team_type).await
                {
                    Ok(sign) => {
                        rows.push(stat_row(event, *player_id, StatType::PlusMinus, sign.value()))
                    }
                    Err(err) => warn!(
                        event_id = %event.id,
                        %player_id,
                        error = %err,
                        "cannot determine plus/minus; skipping player"
                    ),
                }
            }
            rows
        }
        EventDetails::Penalty {
            player_id,
            duration,
            ..
        } => vec![stat_row(
            event,
            *player_id,
            StatType::Penalties,
            penalties.for_duration(*duration),
        )],
        EventDetails::Faceoff {
            player_id, outcome, ..
        } => {
            let stat_type = match outcome {
                FaceoffOutcome::Won => StatType::FaceoffWins,
                FaceoffOutcome::Lost => StatType::FaceoffLosses,
            };
            vec![stat_row(event, *player_id, stat_type, 1)]
        }
        EventDetails::Shot {
            player_id,
            attribution,
        } => {
            let stat_type = match attribution {
                ShotAttribution::For => StatType::Shots,
                ShotAttribution::Against => StatType::ShotsAgainst,
            };
            vec![stat_row(event, *player_id, stat_type, 1)]
        }
        EventDetails::Hit { player_id, .. } => {
            vec![stat_row(event, *player_id, StatType::Hits, 1)]
        }
    }
}

/// Distinct players credited by the written rows, in first-seen order.
fn involved_players(stats: &[GameStatEntity]) -> Vec<Uuid> {
    let mut players = Vec::new();
    for stat in stats {
        if !players.contains(&stat.player_id) {
            players.push(stat.player_id);
        }
    }
    players
}

fn spawn_refresh(
    store: Arc<dyn StatsStore>,
    changes: ChangeHub,
    players: Vec<Uuid>,
) -> RefreshHandle {
    let scheduled = players.clone();
    let task = tokio::spawn(async move {
        let mut report = RefreshReport::default();
        for player_id in players {
            match stats_service::refresh_player_stats(store.as_ref(), &changes, player_id).await {
                Ok(_) => report.refreshed.push(player_id),
                Err(err) => {
                    warn!(%player_id, error = %err, "failed to refresh player stats");
                    report.failed.push(RefreshFailure {
                        player_id,
                        message: err.to_string(),
                    });
                }
            }
        }
        debug!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "player stats refresh finished"
        );
        report
    });

    RefreshHandle {
        players: scheduled,
        task,
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::{
        models::{GameEntity, MemberRole, PenaltyDuration, StatFilter, TeamMemberEntity},
        stats_store::memory::MemoryStatsStore,
    };

    struct Rink {
        store: Arc<MemoryStatsStore>,
        changes: ChangeHub,
        game: GameEntity,
        home: Vec<Uuid>,
        away: Vec<Uuid>,
    }

    async fn rink() -> Rink {
        let store = Arc::new(MemoryStatsStore::new());
        let game = GameEntity {
            id: Uuid::new_v4(),
            home_team_id: Uuid::new_v4(),
            away_team_id: Uuid::new_v4(),
            starts_at: SystemTime::UNIX_EPOCH,
            location: Some("Bell Centre".into()),
            created_at: SystemTime::UNIX_EPOCH,
        };
        store.save_game(game.clone()).await.unwrap();

        let mut rosters = Vec::new();
        for team_id in [game.home_team_id, game.away_team_id] {
            let mut ids = Vec::new();
            for jersey in 1..=3u8 {
                let member = TeamMemberEntity {
                    id: Uuid::new_v4(),
                    team_id,
                    name: format!("Player {jersey}"),
                    jersey_number: Some(jersey),
                    position: None,
                    role: MemberRole::Player,
                    account_id: None,
                    created_at: SystemTime::UNIX_EPOCH,
                };
                ids.push(member.id);
                store.save_member(member).await.unwrap();
            }
            rosters.push(ids);
        }
        let away = rosters.pop().unwrap();
        let home = rosters.pop().unwrap();

        Rink {
            store,
            changes: ChangeHub::new(64),
            game,
            home,
            away,
        }
    }

    fn payload(game_id: Uuid, team_type: TeamType, details: EventDetails) -> EventPayload {
        EventPayload {
            game_id,
            period: 1,
            team_type: Some(team_type),
            details,
        }
    }

    async fn record(rink: &Rink, payload: EventPayload) -> Result<RecordOutcome, ServiceError> {
        record_event(
            rink.store.clone(),
            &rink.changes,
            PenaltyMinutes::default(),
            payload,
        )
        .await
    }

    fn values(stats: &[GameStatEntity], stat_type: StatType) -> Vec<(Uuid, i32)> {
        stats
            .iter()
            .filter(|stat| stat.stat_type == stat_type)
            .map(|stat| (stat.player_id, stat.value))
            .collect()
    }

    #[tokio::test]
    async fn simple_goal_writes_one_event_and_one_goal_row() {
        let rink = rink().await;
        let scorer = rink.home[0];

        let outcome = record(
            &rink,
            payload(
                rink.game.id,
                TeamType::Home,
                EventDetails::Goal {
                    scorer_id: scorer,
                    primary_assist_id: None,
                    secondary_assist_id: None,
                    on_ice: Vec::new(),
                },
            ),
        )
        .await
        .unwrap();

        assert_eq!(outcome.event.event_type.as_str(), "goal");
        assert_eq!(outcome.stats.len(), 1);
        assert_eq!(outcome.stats[0].stat_type, StatType::Goals);
        assert_eq!(outcome.stats[0].value, 1);
        assert_eq!(outcome.stats[0].player_id, scorer);
        assert_eq!(outcome.stats[0].game_id, rink.game.id);

        let events = rink.store.list_game_events(rink.game.id).await.unwrap();
        assert_eq!(events, vec![outcome.event.clone()]);

        let report = outcome.refresh.join().await;
        assert_eq!(report.refreshed, vec![scorer]);
        let cached = rink.store.list_player_stats(scorer).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].value, 1);
    }

    #[tokio::test]
    async fn goal_credits_assists_and_signs_on_ice_players() {
        let rink = rink().await;
        let outsider = Uuid::new_v4();
        let on_ice = vec![
            rink.home[0],
            rink.home[1],
            rink.away[0],
            rink.away[1],
            outsider,
        ];

        let outcome = record(
            &rink,
            payload(
                rink.game.id,
                TeamType::Away,
                EventDetails::Goal {
                    scorer_id: rink.away[0],
                    primary_assist_id: Some(rink.away[1]),
                    secondary_assist_id: Some(rink.away[2]),
                    on_ice,
                },
            ),
        )
        .await
        .unwrap();

        assert_eq!(values(&outcome.stats, StatType::Goals), vec![(rink.away[0], 1)]);
        assert_eq!(
            values(&outcome.stats, StatType::Assists),
            vec![(rink.away[1], 1), (rink.away[2], 1)]
        );
        assert_eq!(
            values(&outcome.stats, StatType::PlusMinus),
            vec![
                (rink.home[0], -1),
                (rink.home[1], -1),
                (rink.away[0], 1),
                (rink.away[1], 1),
            ]
        );

        let mut expected = vec![
            rink.away[0],
            rink.away[1],
            rink.away[2],
            rink.home[0],
            rink.home[1],
        ];
        let mut scheduled = outcome.refresh.players().to_vec();
        expected.sort();
        scheduled.sort();
        assert_eq!(scheduled, expected);
        assert!(outcome.refresh.join().await.is_complete());
    }

    #[tokio::test]
    async fn penalty_minutes_follow_duration() {
        let rink = rink().await;
        for (duration, minutes) in [(PenaltyDuration::Minor, 2), (PenaltyDuration::Major, 5)] {
            let outcome = record(
                &rink,
                payload(
                    rink.game.id,
                    TeamType::Home,
                    EventDetails::Penalty {
                        player_id: rink.home[2],
                        duration,
                        infraction: Some("hooking".into()),
                    },
                ),
            )
            .await
            .unwrap();

            assert_eq!(
                values(&outcome.stats, StatType::Penalties),
                vec![(rink.home[2], minutes)]
            );
        }
    }

    #[tokio::test]
    async fn configured_penalty_values_are_used() {
        let rink = rink().await;
        let outcome = record_event(
            rink.store.clone(),
            &rink.changes,
            PenaltyMinutes { minor: 3, major: 10 },
            payload(
                rink.game.id,
                TeamType::Away,
                EventDetails::Penalty {
                    player_id: rink.away[0],
                    duration: PenaltyDuration::Major,
                    infraction: None,
                },
            ),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stats[0].value, 10);
    }

    #[tokio::test]
    async fn faceoff_shot_and_hit_map_to_single_rows() {
        let rink = rink().await;
        let player = rink.home[0];
        let cases = [
            (
                EventDetails::Faceoff {
                    player_id: player,
                    outcome: FaceoffOutcome::Won,
                    opponent_id: Some(rink.away[0]),
                },
                StatType::FaceoffWins,
            ),
            (
                EventDetails::Faceoff {
                    player_id: player,
                    outcome: FaceoffOutcome::Lost,
                    opponent_id: None,
                },
                StatType::FaceoffLosses,
            ),
            (
                EventDetails::Shot {
                    player_id: player,
                    attribution: ShotAttribution::For,
                },
                StatType::Shots,
            ),
            (
                EventDetails::Shot {
                    player_id: player,
                    attribution: ShotAttribution::Against,
                },
                StatType::ShotsAgainst,
            ),
            (
                EventDetails::Hit {
                    player_id: player,
                    target_id: None,
                },
                StatType::Hits,
            ),
        ];

        for (details, stat_type) in cases {
            let outcome = record(&rink, payload(rink.game.id, TeamType::Home, details))
                .await
                .unwrap();
            assert_eq!(outcome.stats.len(), 1);
            assert_eq!(outcome.stats[0].stat_type, stat_type);
            assert_eq!(outcome.stats[0].value, 1);
        }
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected_before_any_write() {
        let rink = rink().await;
        let hit = EventDetails::Hit {
            player_id: rink.home[0],
            target_id: None,
        };

        let nil_game = payload(Uuid::nil(), TeamType::Home, hit.clone());
        let mut zero_period = payload(rink.game.id, TeamType::Home, hit.clone());
        zero_period.period = 0;
        let mut no_side = payload(rink.game.id, TeamType::Home, hit.clone());
        no_side.team_type = None;

        for bad in [nil_game, zero_period, no_side] {
            assert!(matches!(
                record(&rink, bad).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            record(&rink, payload(Uuid::new_v4(), TeamType::Home, hit)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(rink.store.list_game_events(rink.game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn goal_credits_must_name_distinct_players() {
        let rink = rink().await;
        let scorer = rink.home[0];
        let mate = rink.home[1];
        let goal = |primary, secondary| EventDetails::Goal {
            scorer_id: scorer,
            primary_assist_id: primary,
            secondary_assist_id: secondary,
            on_ice: Vec::new(),
        };

        for details in [
            goal(Some(scorer), None),
            goal(Some(mate), Some(mate)),
            goal(Some(mate), Some(scorer)),
            goal(Some(scorer), Some(scorer)),
            goal(None, Some(mate)),
        ] {
            assert!(matches!(
                record(&rink, payload(rink.game.id, TeamType::Home, details)).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
        assert!(rink.store.list_game_events(rink.game.id).await.unwrap().is_empty());
        assert!(
            rink.store
                .list_game_stats(StatFilter::game(rink.game.id))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn stat_write_failure_fails_the_recording() {
        let rink = rink().await;
        rink.store.fail_on(Table::GameStats);

        let result = record(
            &rink,
            payload(
                rink.game.id,
                TeamType::Home,
                EventDetails::Hit {
                    player_id: rink.home[0],
                    target_id: None,
                },
            ),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(rink.store.list_game_events(rink.game.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_does_not_fail_the_recording() {
        let rink = rink().await;
        rink.store.fail_on(Table::PlayerStats);
        let player = rink.away[2];

        let outcome = record(
            &rink,
            payload(
                rink.game.id,
                TeamType::Away,
                EventDetails::Shot {
                    player_id: player,
                    attribution: ShotAttribution::For,
                },
            ),
        )
        .await
        .unwrap();

        let report = outcome.refresh.join().await;
        assert!(!report.is_complete());
        assert_eq!(report.failed[0].player_id, player);
        assert_eq!(
            rink.store
                .list_game_stats(StatFilter::player(player))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn written_rows_are_published() {
        let rink = rink().await;
        let mut feed = rink.changes.subscribe();

        let outcome = record(
            &rink,
            payload(
                rink.game.id,
                TeamType::Home,
                EventDetails::Hit {
                    player_id: rink.home[1],
                    target_id: Some(rink.away[1]),
                },
            ),
        )
        .await
        .unwrap();
        outcome.refresh.join().await;

        let first = feed.recv().await.unwrap();
        assert_eq!(first.table, Table::GameEvents);
        assert_eq!(first.game_id, Some(rink.game.id));
        let second = feed.recv().await.unwrap();
        assert_eq!(second.table, Table::GameStats);
        assert_eq!(second.row["stat_type"], "hits");
        let third = feed.recv().await.unwrap();
        assert_eq!(third.table, Table::PlayerStats);
    }
}
