use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taskboard_core::BoardResult;

use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Tracked, Validate};
use crate::project::ProjectId;
use crate::reference;
use crate::release::ReleaseId;
use crate::sprint::SprintId;
use crate::sub_task::SubTask;
use crate::user::UserRef;

pub type ItemId = EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A unit of planned work ("user story") placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// Always equal to some column's status key.
    pub status: String,
    #[serde(default, rename = "assignedTo")]
    pub assignees: BTreeSet<UserRef>,
    #[serde(
        default,
        rename = "sprint",
        with = "reference::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub sprint_id: Option<SprintId>,
    #[serde(
        default,
        rename = "version",
        with = "reference::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_id: Option<ReleaseId>,
    /// `None` until the sub-tasks have been fetched.
    #[serde(default, rename = "tasks", skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<SubTask>>,
    #[serde(skip)]
    pub expanded: bool,
}

impl BacklogItem {
    pub fn from_draft(id: ItemId, draft: &BacklogItemDraft) -> Self {
        let mut item = Self {
            id,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            status: String::new(),
            assignees: BTreeSet::new(),
            sprint_id: None,
            release_id: None,
            // A brand-new item has nothing to fetch.
            sub_tasks: Some(Vec::new()),
            expanded: false,
        };
        item.apply_draft(draft);
        item
    }

    pub fn apply_draft(&mut self, draft: &BacklogItemDraft) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.priority = draft.priority;
        self.status = draft.status.clone();
        self.assignees = draft.assignees.iter().map(UserRef::new).collect();
        self.sprint_id = draft.sprint_id;
    }

    /// Copy the persisted fields of `other`, keeping this item's transient
    /// display state.
    pub fn restore_fields(&mut self, other: &BacklogItem) {
        self.title = other.title.clone();
        self.description = other.description.clone();
        self.priority = other.priority;
        self.status = other.status.clone();
        self.assignees = other.assignees.clone();
        self.sprint_id = other.sprint_id;
        self.release_id = other.release_id;
    }

    pub fn sub_tasks_loaded(&self) -> bool {
        self.sub_tasks.is_some()
    }

    pub fn to_draft(&self, project_id: ProjectId) -> BacklogItemDraft {
        BacklogItemDraft {
            project_id,
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status.clone(),
            assignees: self.assignees.iter().map(|u| u.username.clone()).collect(),
            sprint_id: self.sprint_id,
        }
    }
}

impl RemoteEntity for BacklogItem {
    type Draft = BacklogItemDraft;
    const KIND: EntityKind = EntityKind::BacklogItem;

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Tracked for BacklogItem {
    type Status = String;

    fn status(&self) -> String {
        self.status.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemDraft {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: String,
    #[serde(rename = "assignedToUsernames")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<SprintId>,
}

impl BacklogItemDraft {
    pub fn new(project_id: ProjectId, title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            status: status.into(),
            ..Default::default()
        }
    }
}

impl Validate for BacklogItemDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.title, "Title")?;
        require(&self.status, "Status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_store_payload() {
        let json = r#"{
            "id": 12,
            "title": "Login page",
            "description": "Build the form",
            "priority": "HIGH",
            "status": "IN_PROGRESS",
            "assignedTo": [{"username": "ana"}, {"username": "bo"}],
            "sprint": {"id": 3, "name": "Sprint 1", "status": "ACTIVE"},
            "version": null
        }"#;
        let item: BacklogItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 12);
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.sprint_id, Some(3));
        assert_eq!(item.release_id, None);
        assert_eq!(item.assignees.len(), 2);
        assert!(!item.sub_tasks_loaded());
        assert!(!item.expanded);
    }

    #[test]
    fn test_expanded_flag_is_never_serialized() {
        let mut item = BacklogItem::from_draft(1, &BacklogItemDraft::new(1, "A", "TODO"));
        item.expanded = true;
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("expanded").is_none());
    }

    #[test]
    fn test_draft_wire_names() {
        let mut draft = BacklogItemDraft::new(5, "Fix bug", "TODO");
        draft.assignees = vec!["ana".into()];
        draft.sprint_id = Some(2);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["projectId"], 5);
        assert_eq!(json["assignedToUsernames"][0], "ana");
        assert_eq!(json["sprintId"], 2);
        assert_eq!(json["priority"], "MEDIUM");
    }

    #[test]
    fn test_draft_requires_title() {
        let draft = BacklogItemDraft::new(1, "  ", "TODO");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_restore_fields_keeps_display_state() {
        let original = BacklogItem::from_draft(1, &BacklogItemDraft::new(1, "A", "TODO"));
        let mut current = original.clone();
        current.status = "DONE".into();
        current.title = "B".into();
        current.expanded = true;
        current.restore_fields(&original);
        assert_eq!(current.status, "TODO");
        assert_eq!(current.title, "A");
        assert!(current.expanded);
    }
}
