use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::Table,
    dto::changes::RowChange,
    services::stats_service,
    state::SharedState,
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(KEEP_ALIVE_INTERVAL)
        .text("keep-alive")
}

fn change_event(change: &RowChange) -> Option<Event> {
    match Event::default().event(change.kind.as_str()).json_data(change) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(table = %change.table, error = %err, "failed to encode change event");
            None
        }
    }
}

/// Forward changes of one game, optionally restricted to one table, as SSE events.
///
/// Lagged subscribers skip the missed changes and keep streaming.
pub fn change_stream(
    mut receiver: broadcast::Receiver<RowChange>,
    game_id: Uuid,
    table: Option<Table>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(change) => {
                            if !change.matches(Some(game_id), table) {
                                continue;
                            }
                            let Some(event) = change_event(&change) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(%game_id, skipped, "change stream lagged; skipping changes");
                            continue;
                        }
                    }
                }
            }
        }

        info!(%game_id, "change SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(keep_alive())
}

async fn score_event(state: &SharedState, game_id: Uuid) -> Option<Event> {
    let store = match state.require_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(%game_id, error = %err, "cannot derive score");
            return None;
        }
    };

    match stats_service::game_score(store.as_ref(), game_id).await {
        Ok(score) => Event::default().event("score").json_data(score).ok(),
        Err(err) => {
            warn!(%game_id, error = %err, "failed to derive score");
            None
        }
    }
}

/// Emit the current score, then a fresh score after every event change of the game.
pub fn score_stream(
    state: SharedState,
    game_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = state.changes().subscribe();

    let stream = async_stream::stream! {
        if let Some(event) = score_event(&state, game_id).await {
            yield Ok::<_, Infallible>(event);
        }

        loop {
            match receiver.recv().await {
                Ok(change) if change.matches(Some(game_id), Some(Table::GameEvents)) => {
                    if let Some(event) = score_event(&state, game_id).await {
                        yield Ok::<_, Infallible>(event);
                    }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%game_id, skipped, "score stream lagged; re-deriving");
                    if let Some(event) = score_event(&state, game_id).await {
                        yield Ok::<_, Infallible>(event);
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(keep_alive())
}
