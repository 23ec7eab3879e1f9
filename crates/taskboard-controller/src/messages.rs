//! User-facing text for engine outcomes.

use std::fmt;
use taskboard_core::{BoardError, ErrorClass};
use taskboard_domain::EntityKind;

/// Every operation the engine performs, for logging and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateItem,
    EditItem,
    DeleteItem,
    MoveItem,
    CreateSubTask,
    EditSubTask,
    DeleteSubTask,
    LoadSubTasks,
    CreateColumn,
    EditColumn,
    DeleteColumn,
    CreateSprint,
    EditSprint,
    DeleteSprint,
    ChangeSprintStatus,
    AssignToSprint,
    RemoveFromSprint,
    CreateRelease,
    EditRelease,
    DeleteRelease,
    ChangeReleaseStatus,
    AssignToRelease,
    RemoveFromRelease,
    LoadSprintItems,
    LoadReleaseItems,
    EditProject,
}

impl Action {
    /// The entity the operation is about.
    pub fn kind(self) -> EntityKind {
        use Action::*;
        match self {
            CreateItem | EditItem | DeleteItem | MoveItem => EntityKind::BacklogItem,
            CreateSubTask | EditSubTask | DeleteSubTask | LoadSubTasks => EntityKind::SubTask,
            CreateColumn | EditColumn | DeleteColumn => EntityKind::Column,
            CreateSprint | EditSprint | DeleteSprint | ChangeSprintStatus | AssignToSprint
            | RemoveFromSprint | LoadSprintItems => EntityKind::Sprint,
            CreateRelease | EditRelease | DeleteRelease | ChangeReleaseStatus
            | AssignToRelease | RemoveFromRelease | LoadReleaseItems => EntityKind::Release,
            EditProject => EntityKind::Project,
        }
    }

    /// Shown after the store confirms. Background loads stay silent.
    pub fn success_message(self) -> Option<&'static str> {
        use Action::*;
        let message = match self {
            CreateItem => "Backlog item created",
            EditItem => "Backlog item updated",
            DeleteItem => "Backlog item deleted",
            MoveItem => "Backlog item moved",
            CreateSubTask => "Task created",
            EditSubTask => "Task updated",
            DeleteSubTask => "Task deleted",
            LoadSubTasks => return None,
            CreateColumn => "Column created",
            EditColumn => "Column updated",
            DeleteColumn => "Column deleted",
            CreateSprint => "Sprint created",
            EditSprint => "Sprint updated",
            DeleteSprint => "Sprint deleted",
            ChangeSprintStatus => "Sprint status updated",
            AssignToSprint => "Backlog item added to sprint",
            RemoveFromSprint => "Backlog item removed from sprint",
            CreateRelease => "Release created",
            EditRelease => "Release updated",
            DeleteRelease => "Release deleted",
            ChangeReleaseStatus => "Release status updated",
            AssignToRelease => "Backlog item added to release",
            RemoveFromRelease => "Backlog item removed from release",
            LoadSprintItems | LoadReleaseItems => return None,
            EditProject => "Project updated",
        };
        Some(message)
    }

    /// Fallback when the store gave no message of its own.
    pub fn failure_message(self) -> &'static str {
        use Action::*;
        match self {
            CreateItem => "Failed to create backlog item",
            EditItem => "Failed to update backlog item",
            DeleteItem => "Failed to delete backlog item",
            MoveItem => "Failed to move backlog item",
            CreateSubTask => "Failed to create task",
            EditSubTask => "Failed to update task",
            DeleteSubTask => "Failed to delete task",
            LoadSubTasks => "Failed to load tasks",
            CreateColumn => "Failed to create column",
            EditColumn => "Failed to update column",
            DeleteColumn => "Failed to delete column",
            CreateSprint => "Failed to create sprint",
            EditSprint => "Failed to update sprint",
            DeleteSprint => "Failed to delete sprint",
            ChangeSprintStatus => "Failed to change sprint status",
            AssignToSprint => "Failed to add backlog item to sprint",
            RemoveFromSprint => "Failed to remove backlog item from sprint",
            CreateRelease => "Failed to create release",
            EditRelease => "Failed to update release",
            DeleteRelease => "Failed to delete release",
            ChangeReleaseStatus => "Failed to change release status",
            AssignToRelease => "Failed to add backlog item to release",
            RemoveFromRelease => "Failed to remove backlog item from release",
            LoadSprintItems => "Failed to load sprint items",
            LoadReleaseItems => "Failed to load release items",
            EditProject => "Failed to update project",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Text shown for a failed operation. The store's own message wins;
/// otherwise the wording depends on the error class.
pub fn failure_text(action: Action, error: &BoardError) -> String {
    if let Some(message) = error.user_message() {
        return message.to_string();
    }
    match error.class() {
        ErrorClass::NotFound => format!("This {} no longer exists", action.kind()),
        ErrorClass::Authorization => {
            format!("{}: you are not allowed to do this", action.failure_message())
        }
        ErrorClass::Transient => format!("{}. Please try again.", action.failure_message()),
        ErrorClass::Validation => action.failure_message().to_string(),
    }
}
