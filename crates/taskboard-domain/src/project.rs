use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taskboard_core::BoardResult;

use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Validate};
use crate::user::UserRef;

pub type ProjectId = EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner: UserRef,
    #[serde(default)]
    pub members: BTreeSet<UserRef>,
}

impl Project {
    pub fn is_member(&self, username: &str) -> bool {
        self.owner.username == username || self.members.iter().any(|m| m.username == username)
    }

    pub fn apply_draft(&mut self, draft: &ProjectDraft) {
        self.name = draft.name.clone();
        self.description = draft.description.clone();
    }
}

impl RemoteEntity for Project {
    type Draft = ProjectDraft;
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
}

impl Validate for ProjectDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.name, "Project name")
    }
}
