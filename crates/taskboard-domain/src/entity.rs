use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use taskboard_core::BoardResult;

/// Identifier assigned by the remote store. Always positive.
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Column,
    BacklogItem,
    SubTask,
    Sprint,
    Release,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Column => "column",
            EntityKind::BacklogItem => "backlog item",
            EntityKind::SubTask => "sub-task",
            EntityKind::Sprint => "sprint",
            EntityKind::Release => "release",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An entity that lives in the remote store and travels as JSON.
pub trait RemoteEntity: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Field bundle sent on create and update.
    type Draft: Clone + fmt::Debug + Serialize + Validate + 'static;

    const KIND: EntityKind;

    fn id(&self) -> EntityId;
}

/// An entity with a status that has its own remote endpoint.
pub trait Tracked: RemoteEntity {
    type Status: Clone + fmt::Debug + PartialEq + Serialize + 'static;

    fn status(&self) -> Self::Status;
}

/// Checks a form bundle before anything is sent.
pub trait Validate {
    fn validate(&self) -> BoardResult<()>;
}

pub(crate) fn require(value: &str, field: &str) -> BoardResult<()> {
    if value.trim().is_empty() {
        return Err(taskboard_core::BoardError::Validation(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}
