use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dao::models::Table;

/// Kind of row-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    /// SSE event name used when streaming this change.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Change notification published after a write reached the store.
pub struct RowChange {
    /// Collection the row belongs to.
    pub table: Table,
    /// What happened to the row.
    pub kind: ChangeKind,
    /// Game the row is attached to, when it is game scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
    /// Row as rendered by the API.
    #[schema(value_type = Object)]
    pub row: serde_json::Value,
}

impl RowChange {
    /// Whether the change passes the optional game and table filters.
    pub fn matches(&self, game_id: Option<Uuid>, table: Option<Table>) -> bool {
        game_id.is_none_or(|id| self.game_id == Some(id)) && table.is_none_or(|t| t == self.table)
    }
}

/// Optional filter of the change stream.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangeQuery {
    /// Only stream changes of this table.
    pub table: Option<Table>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_on_game_and_table() {
        let game_id = Uuid::new_v4();
        let change = RowChange {
            table: Table::GameStats,
            kind: ChangeKind::Insert,
            game_id: Some(game_id),
            row: serde_json::Value::Null,
        };

        assert!(change.matches(Some(game_id), None));
        assert!(change.matches(Some(game_id), Some(Table::GameStats)));
        assert!(!change.matches(Some(game_id), Some(Table::GameEvents)));
        assert!(!change.matches(Some(Uuid::new_v4()), None));
        assert!(change.matches(None, None));
    }
}
