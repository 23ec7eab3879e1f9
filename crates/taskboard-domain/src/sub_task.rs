use serde::{Deserialize, Serialize};
use taskboard_core::BoardResult;

use crate::backlog_item::{ItemId, Priority};
use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Validate};
use crate::reference;
use crate::user::UserRef;

pub type SubTaskId = EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubTaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: SubTaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: SubTaskStatus,
    #[serde(default, rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
    /// Owning backlog item. Embedded task lists may omit it; the board
    /// model fills it in when it adopts them.
    #[serde(default, rename = "userStory", with = "reference::required")]
    pub item_id: ItemId,
}

impl SubTask {
    pub fn from_draft(id: SubTaskId, draft: &SubTaskDraft) -> Self {
        let mut sub_task = Self {
            id,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            status: SubTaskStatus::default(),
            assignee: None,
            item_id: draft.item_id,
        };
        sub_task.apply_draft(draft);
        sub_task
    }

    pub fn apply_draft(&mut self, draft: &SubTaskDraft) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.priority = draft.priority;
        self.status = draft.status;
        self.assignee = draft.assignee.as_deref().map(UserRef::new);
    }
}

impl RemoteEntity for SubTask {
    type Draft = SubTaskDraft;
    const KIND: EntityKind = EntityKind::SubTask;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskDraft {
    #[serde(rename = "userStoryId")]
    pub item_id: ItemId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: SubTaskStatus,
    #[serde(rename = "assignedToUsername", skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl SubTaskDraft {
    pub fn new(item_id: ItemId, title: impl Into<String>) -> Self {
        Self {
            item_id,
            title: title.into(),
            ..Default::default()
        }
    }
}

impl Validate for SubTaskDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.title, "Title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_and_without_owner() {
        let json = r#"{"id":1,"title":"Write test","priority":"LOW","status":"DONE","userStory":{"id":9}}"#;
        let task: SubTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.item_id, 9);
        assert_eq!(task.status, SubTaskStatus::Done);

        let json = r#"{"id":2,"title":"Embedded","status":"IN_PROGRESS","assignedTo":{"username":"ana"}}"#;
        let task: SubTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.item_id, 0);
        assert_eq!(task.assignee, Some(UserRef::new("ana")));
    }

    #[test]
    fn test_draft_wire_names() {
        let mut draft = SubTaskDraft::new(4, "Review");
        draft.assignee = Some("bo".into());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["userStoryId"], 4);
        assert_eq!(json["assignedToUsername"], "bo");
        assert_eq!(json["status"], "TODO");
    }
}
