use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use taskboard_core::BoardResult;

use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Validate};
use crate::project::ProjectId;

pub type ColumnId = EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    /// Key matched against backlog item statuses, e.g. `TODO`.
    #[serde(rename = "status")]
    pub status_key: String,
    pub order: i32,
    pub project_id: ProjectId,
    #[serde(default)]
    pub is_default: bool,
}

impl Column {
    pub fn from_draft(id: ColumnId, draft: &ColumnDraft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            status_key: normalize_status_key(&draft.status_key),
            order: draft.order,
            project_id: draft.project_id,
            is_default: false,
        }
    }

    /// Apply an edit. The status key never changes once a column exists,
    /// and default columns keep their position too.
    pub fn apply_draft(&mut self, draft: &ColumnDraft) {
        self.name = draft.name.clone();
        if !self.is_default {
            self.order = draft.order;
        }
    }

    /// Board order: by `order`, ties broken by id.
    pub fn board_order(&self, other: &Column) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl RemoteEntity for Column {
    type Draft = ColumnDraft;
    const KIND: EntityKind = EntityKind::Column;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDraft {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(rename = "status")]
    pub status_key: String,
    pub order: i32,
}

impl Validate for ColumnDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.name, "Column name")?;
        require(&self.status_key, "Column status")
    }
}

/// Status keys are stored upper-case with underscores, so
/// `"In review"` becomes `"IN_REVIEW"`.
pub fn normalize_status_key(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(id: ColumnId, order: i32) -> Column {
        Column {
            id,
            name: format!("Column {}", id),
            status_key: format!("KEY_{}", id),
            order,
            project_id: 1,
            is_default: false,
        }
    }

    #[test]
    fn test_normalize_status_key() {
        assert_eq!(normalize_status_key("In review"), "IN_REVIEW");
        assert_eq!(normalize_status_key("  done "), "DONE");
        assert_eq!(normalize_status_key("TODO"), "TODO");
    }

    #[test]
    fn test_board_order_breaks_ties_by_id() {
        let a = column(7, 2);
        let b = column(3, 2);
        let c = column(9, 1);
        let mut columns = vec![a, b, c];
        columns.sort_by(|x, y| x.board_order(y));
        let ids: Vec<_> = columns.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9, 3, 7]);
    }

    #[test]
    fn test_default_column_keeps_order_on_edit() {
        let mut col = column(1, 1);
        col.is_default = true;
        col.apply_draft(&ColumnDraft {
            project_id: 1,
            name: "Backlog".into(),
            status_key: "OTHER".into(),
            order: 9,
        });
        assert_eq!(col.name, "Backlog");
        assert_eq!(col.order, 1);
        assert_eq!(col.status_key, "KEY_1");
    }

    #[test]
    fn test_deserialize_store_payload() {
        let json = r#"{"id":4,"name":"En cours","status":"IN_PROGRESS","order":2,"projectId":1,"isDefault":true}"#;
        let col: Column = serde_json::from_str(json).unwrap();
        assert_eq!(col.status_key, "IN_PROGRESS");
        assert!(col.is_default);
        assert_eq!(col.project_id, 1);
    }
}
