use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::Table,
    dto::changes::{ChangeKind, RowChange},
};

/// Broadcast hub fanning out row-level changes to SSE subscribers.
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<RowChange>,
}

impl ChangeHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent changes.
    pub fn subscribe(&self) -> broadcast::Receiver<RowChange> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send a change to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, change: RowChange) {
        let _ = self.sender.send(change);
    }

    /// Serialize `row` and publish it as a change of `table`.
    pub fn publish<T: Serialize>(
        &self,
        table: Table,
        kind: ChangeKind,
        game_id: Option<Uuid>,
        row: &T,
    ) {
        match serde_json::to_value(row) {
            Ok(row) => self.broadcast(RowChange {
                table,
                kind,
                game_id,
                row,
            }),
            Err(err) => warn!(%table, error = %err, "failed to serialize change payload"),
        }
    }
}
