use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskboard_core::{BoardError, BoardResult};

use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Tracked, Validate};
use crate::project::ProjectId;

pub type SprintId = EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: SprintId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: SprintStatus,
    pub project_id: ProjectId,
}

impl Sprint {
    pub fn from_draft(id: SprintId, draft: &SprintDraft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            project_id: draft.project_id,
        }
    }

    pub fn apply_draft(&mut self, draft: &SprintDraft) {
        self.name = draft.name.clone();
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.status = draft.status;
    }

    pub fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

impl RemoteEntity for Sprint {
    type Draft = SprintDraft;
    const KIND: EntityKind = EntityKind::Sprint;

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Tracked for Sprint {
    type Status = SprintStatus;

    fn status(&self) -> SprintStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintDraft {
    pub project_id: ProjectId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
}

impl Validate for SprintDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.name, "Sprint name")?;
        if self.end_date <= self.start_date {
            return Err(BoardError::Validation(
                "End date must be after start date".into(),
            ));
        }
        Ok(())
    }
}
