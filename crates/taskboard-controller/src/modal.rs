//! One dialog at a time, each with its own error slot.
//!
//! Submitting runs exactly one engine operation. Validation problems and
//! store rejections stay inside the dialog that caused them; only
//! authorization failures also surface as a notification.

use std::cell::RefCell;
use std::rc::Rc;
use taskboard_core::{BoardError, BoardResult, ErrorClass};
use taskboard_domain::{
    BacklogItemDraft, ColumnDraft, ColumnId, ItemId, ProjectDraft, ReleaseDraft, ReleaseId,
    SprintDraft, SprintId, SubTaskDraft, SubTaskId, Validate,
};

use crate::engine::ReconciliationEngine;
use crate::messages::{failure_text, Action};
use crate::pending::Pending;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Item(ItemId),
    SubTask(SubTaskId),
    Column(ColumnId),
    Sprint(SprintId),
    Release(ReleaseId),
}

/// The grouping an assignment picker adds items to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    Sprint(SprintId),
    Release(ReleaseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    EditProject,
    CreateColumn,
    EditColumn(ColumnId),
    CreateItem,
    EditItem(ItemId),
    CreateSubTask(ItemId),
    EditSubTask(SubTaskId),
    CreateSprint,
    EditSprint(SprintId),
    CreateRelease,
    EditRelease(ReleaseId),
    ConfirmDelete(DeleteTarget),
    Assign(AssignmentTarget),
}

/// What a dialog hands over when the user confirms it.
#[derive(Debug, Clone)]
pub enum Submission {
    Project(ProjectDraft),
    Column(ColumnDraft),
    Item(BacklogItemDraft),
    SubTask(SubTaskDraft),
    Sprint(SprintDraft),
    Release(ReleaseDraft),
    ConfirmDelete,
    Assign(ItemId),
}

#[derive(Debug)]
struct OpenDialog {
    kind: DialogKind,
    error: Option<String>,
    submitting: bool,
    serial: u64,
}

#[derive(Debug, Default)]
struct ModalState {
    open: Option<OpenDialog>,
    next_serial: u64,
}

pub struct ModalOrchestrator {
    engine: ReconciliationEngine,
    state: Rc<RefCell<ModalState>>,
}

impl ModalOrchestrator {
    /// `engine` should be the board's engine; the orchestrator takes a
    /// scoped handle to it so failures land in the dialog.
    pub fn new(engine: &ReconciliationEngine) -> Self {
        Self {
            engine: engine.scoped(),
            state: Rc::new(RefCell::new(ModalState::default())),
        }
    }

    /// Open a dialog. Does nothing while another one is open.
    pub fn open(&self, kind: DialogKind) -> bool {
        let mut state = self.state.borrow_mut();
        if let Some(current) = &state.open {
            tracing::debug!("Not opening {:?}: {:?} is open", kind, current.kind);
            return false;
        }
        state.next_serial += 1;
        let serial = state.next_serial;
        state.open = Some(OpenDialog {
            kind,
            error: None,
            submitting: false,
            serial,
        });
        true
    }

    /// Close the open dialog, discarding its error. A submission still in
    /// flight completes but no longer touches any dialog.
    pub fn close(&self) {
        self.state.borrow_mut().open = None;
    }

    pub fn current(&self) -> Option<DialogKind> {
        self.state.borrow().open.as_ref().map(|dialog| dialog.kind)
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.state
            .borrow()
            .open
            .as_ref()
            .and_then(|dialog| dialog.error.clone())
    }

    pub fn is_submitting(&self) -> bool {
        self.state
            .borrow()
            .open
            .as_ref()
            .is_some_and(|dialog| dialog.submitting)
    }

    pub fn submit(&self, submission: Submission) -> Pending<()> {
        let (kind, serial) = {
            let state = self.state.borrow();
            match &state.open {
                None => return Pending::ready(Err(BoardError::Conflict("No dialog is open".into()))),
                Some(dialog) if dialog.submitting => {
                    return Pending::ready(Err(BoardError::Conflict(
                        "The dialog is already being saved".into(),
                    )))
                }
                Some(dialog) => (dialog.kind, dialog.serial),
            }
        };

        if let Err(error) = validate(&submission) {
            self.set_error(serial, error.user_message().map(str::to_string));
            return Pending::ready(Err(error));
        }

        let (action, pending) = match self.dispatch(kind, submission) {
            Ok(dispatched) => dispatched,
            Err(error) => {
                self.set_error(serial, error.user_message().map(str::to_string));
                return Pending::ready(Err(error));
            }
        };
        self.set_submitting(serial, true);

        let state = self.state.clone();
        Pending::spawn(async move {
            let result = pending.await;
            let mut state = state.borrow_mut();
            let Some(dialog) = state.open.as_mut().filter(|d| d.serial == serial) else {
                return result;
            };
            dialog.submitting = false;
            match &result {
                Ok(()) => state.open = None,
                Err(BoardError::ViewClosed) => {}
                Err(error) if error.class() == ErrorClass::Authorization => {
                    // Already notified; the dialog stays open as it was.
                    dialog.error = None;
                }
                Err(error) => dialog.error = Some(failure_text(action, error)),
            }
            result
        })
    }

    fn dispatch(
        &self,
        kind: DialogKind,
        submission: Submission,
    ) -> BoardResult<(Action, Pending<()>)> {
        let engine = &self.engine;
        let dispatched = match (kind, submission) {
            (DialogKind::EditProject, Submission::Project(draft)) => {
                (Action::EditProject, discard(engine.edit_project(draft)))
            }
            (DialogKind::CreateColumn, Submission::Column(draft)) => {
                (Action::CreateColumn, discard(engine.create_column(draft)))
            }
            (DialogKind::EditColumn(id), Submission::Column(draft)) => {
                (Action::EditColumn, discard(engine.edit_column(id, draft)))
            }
            (DialogKind::CreateItem, Submission::Item(draft)) => {
                (Action::CreateItem, discard(engine.create_item(draft)))
            }
            (DialogKind::EditItem(id), Submission::Item(draft)) => {
                (Action::EditItem, discard(engine.edit_item(id, draft)))
            }
            (DialogKind::CreateSubTask(item_id), Submission::SubTask(mut draft)) => {
                draft.item_id = item_id;
                (Action::CreateSubTask, discard(engine.create_sub_task(draft)))
            }
            (DialogKind::EditSubTask(id), Submission::SubTask(draft)) => {
                (Action::EditSubTask, discard(engine.edit_sub_task(id, draft)))
            }
            (DialogKind::CreateSprint, Submission::Sprint(draft)) => {
                (Action::CreateSprint, discard(engine.create_sprint(draft)))
            }
            (DialogKind::EditSprint(id), Submission::Sprint(draft)) => {
                (Action::EditSprint, discard(engine.edit_sprint(id, draft)))
            }
            (DialogKind::CreateRelease, Submission::Release(draft)) => {
                (Action::CreateRelease, discard(engine.create_release(draft)))
            }
            (DialogKind::EditRelease(id), Submission::Release(draft)) => {
                (Action::EditRelease, discard(engine.edit_release(id, draft)))
            }
            (DialogKind::ConfirmDelete(target), Submission::ConfirmDelete) => match target {
                DeleteTarget::Item(id) => (Action::DeleteItem, engine.delete_item(id)),
                DeleteTarget::SubTask(id) => (Action::DeleteSubTask, engine.delete_sub_task(id)),
                DeleteTarget::Column(id) => (Action::DeleteColumn, engine.delete_column(id)),
                DeleteTarget::Sprint(id) => (Action::DeleteSprint, engine.delete_sprint(id)),
                DeleteTarget::Release(id) => (Action::DeleteRelease, engine.delete_release(id)),
            },
            (DialogKind::Assign(AssignmentTarget::Sprint(id)), Submission::Assign(item_id)) => (
                Action::AssignToSprint,
                discard(engine.assign_to_sprint(id, item_id)),
            ),
            (DialogKind::Assign(AssignmentTarget::Release(id)), Submission::Assign(item_id)) => (
                Action::AssignToRelease,
                discard(engine.assign_to_release(id, item_id)),
            ),
            (kind, submission) => {
                return Err(BoardError::Internal(format!(
                    "{:?} cannot be submitted to {:?}",
                    submission, kind
                )))
            }
        };
        Ok(dispatched)
    }

    fn set_error(&self, serial: u64, message: Option<String>) {
        if let Some(dialog) = self
            .state
            .borrow_mut()
            .open
            .as_mut()
            .filter(|d| d.serial == serial)
        {
            dialog.error = message;
        }
    }

    fn set_submitting(&self, serial: u64, submitting: bool) {
        if let Some(dialog) = self
            .state
            .borrow_mut()
            .open
            .as_mut()
            .filter(|d| d.serial == serial)
        {
            dialog.submitting = submitting;
            dialog.error = None;
        }
    }
}

fn validate(submission: &Submission) -> BoardResult<()> {
    match submission {
        Submission::Project(draft) => draft.validate(),
        Submission::Column(draft) => draft.validate(),
        Submission::Item(draft) => draft.validate(),
        Submission::SubTask(draft) => draft.validate(),
        Submission::Sprint(draft) => draft.validate(),
        Submission::Release(draft) => draft.validate(),
        Submission::ConfirmDelete | Submission::Assign(_) => Ok(()),
    }
}

/// Dialogs only care whether an operation worked, not what it returned.
fn discard<T: 'static>(pending: Pending<T>) -> Pending<()> {
    pending.map(|_| ())
}
