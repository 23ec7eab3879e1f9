//! Optimistic reconciliation between the board model and the store.
//!
//! Every mutation follows the same shape: apply the change locally, call
//! the gateway, then either merge the store's answer or apply the exact
//! inverse and tell the user. Operations return as soon as the local
//! change is visible; the remote half runs as a local task.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;
use taskboard_core::{BoardError, BoardResult, ErrorClass, GatewayError, GatewayResult};
use taskboard_domain::{
    normalize_status_key, BacklogItem, BacklogItemDraft, BoardFilter, BoardModel, Column,
    ColumnDraft, ColumnId, ItemId, Project, ProjectDraft, Release, ReleaseDraft, ReleaseId,
    ReleaseStatus, Sprint, SprintDraft, SprintFilter, SprintId, SprintStatus, SubTask,
    SubTaskDraft, SubTaskId, Validate,
};
use taskboard_gateway::GatewaySet;
use tokio::sync::watch;

use crate::effect::Undo;
use crate::messages::{failure_text, Action};
use crate::notification::{Notification, NotificationSink};
use crate::pending::Pending;

/// How failures reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feedback {
    /// Every failure becomes an error notification.
    Notify,
    /// The caller shows failures itself; only authorization problems are
    /// still notified.
    Scoped,
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    model: Weak<RefCell<BoardModel>>,
    gateways: GatewaySet,
    notifier: Rc<dyn NotificationSink>,
    revision: Rc<watch::Sender<u64>>,
    timeout: Option<Duration>,
    feedback: Feedback,
}

impl ReconciliationEngine {
    pub fn new(
        model: Weak<RefCell<BoardModel>>,
        gateways: GatewaySet,
        notifier: Rc<dyn NotificationSink>,
        timeout: Option<Duration>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            model,
            gateways,
            notifier,
            revision: Rc::new(revision),
            timeout,
            feedback: Feedback::Notify,
        }
    }

    /// A handle whose failures are left to the caller to display.
    pub fn scoped(&self) -> Self {
        Self {
            feedback: Feedback::Scoped,
            ..self.clone()
        }
    }

    /// Bumped after every change to the model.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub(crate) fn touch(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub(crate) fn model(&self) -> Option<Rc<RefCell<BoardModel>>> {
        self.model.upgrade()
    }

    // Backlog items

    pub fn create_item(&self, draft: BacklogItemDraft) -> Pending<BacklogItem> {
        let action = Action::CreateItem;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            require_column(model, &draft.status)?;
            let id = model.allocate_provisional_id();
            model.upsert_item(BacklogItem::from_draft(id, &draft));
            Ok(id)
        });
        let provisional = match prepared {
            Ok(id) => id,
            Err(e) => return self.reject(action, e),
        };
        tracing::debug!("Added provisional backlog item {}", provisional);

        let gateway = self.gateways.items.clone();
        self.run(
            action,
            Undo::RemoveItem(provisional),
            async move { gateway.create(&draft).await },
            move |model, item: BacklogItem| {
                model.replace_item(provisional, item.clone());
                item
            },
        )
    }

    pub fn edit_item(&self, id: ItemId, draft: BacklogItemDraft) -> Pending<BacklogItem> {
        let action = Action::EditItem;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(id, "backlog item")?;
            require_column(model, &draft.status)?;
            model
                .apply_item_draft(id, &draft)
                .ok_or_else(|| gone("backlog item", id))
        });
        let previous = match prepared {
            Ok(previous) => previous,
            Err(e) => return self.reject(action, e),
        };
        tracing::debug!("Applied edit to backlog item {}", id);

        let gateway = self.gateways.items.clone();
        self.run(
            action,
            Undo::RestoreItemFields(previous),
            async move { gateway.update(id, &draft).await },
            merge_item,
        )
    }

    /// Delete an item and, with it, its sub-tasks.
    pub fn delete_item(&self, id: ItemId) -> Pending<()> {
        let action = Action::DeleteItem;
        let prepared = self.prepare(|model| {
            confirmed(id, "backlog item")?;
            model.remove_item(id).ok_or_else(|| gone("backlog item", id))
        });
        let (index, item) = match prepared {
            Ok(removed) => removed,
            Err(e) => return self.reject(action, e),
        };
        tracing::debug!(
            "Removed backlog item {} with {} loaded task(s)",
            id,
            item.sub_tasks.as_ref().map_or(0, Vec::len)
        );

        let gateway = self.gateways.items.clone();
        self.run(
            action,
            Undo::RestoreItem { index, item },
            async move { gateway.delete(id).await },
            |_, ()| (),
        )
    }

    /// Change an item's status, i.e. move it to another column.
    pub fn move_item(&self, id: ItemId, status_key: &str) -> Pending<BacklogItem> {
        let action = Action::MoveItem;
        let status = status_key.to_string();
        let prepared = self.prepare(|model| {
            confirmed(id, "backlog item")?;
            let item = model.item(id).ok_or_else(|| gone("backlog item", id))?;
            if item.status == status {
                return Ok(Err(item.clone()));
            }
            require_column(model, &status)?;
            let previous = model.set_item_status(id, &status).unwrap_or_default();
            Ok(Ok(previous))
        });
        let previous = match prepared {
            Ok(Ok(previous)) => previous,
            Ok(Err(unchanged)) => {
                tracing::debug!("Backlog item {} is already in {}", id, status);
                return Pending::ready(Ok(unchanged));
            }
            Err(e) => return self.reject(action, e),
        };
        tracing::debug!("Moved backlog item {} from {} to {}", id, previous, status);

        let gateway = self.gateways.items.clone();
        self.run(
            action,
            Undo::RestoreItemStatus {
                id,
                status: previous,
            },
            async move { gateway.update_status(id, status).await },
            merge_item,
        )
    }

    // Sub-tasks

    pub fn create_sub_task(&self, draft: SubTaskDraft) -> Pending<SubTask> {
        let action = Action::CreateSubTask;
        let item_id = draft.item_id;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(item_id, "backlog item")?;
            if model.item(item_id).is_none() {
                return Err(gone("backlog item", item_id));
            }
            let id = model.allocate_provisional_id();
            // Lands in the list only if it is loaded; otherwise the next
            // fetch brings it.
            model.upsert_sub_task(SubTask::from_draft(id, &draft));
            Ok(id)
        });
        let provisional = match prepared {
            Ok(id) => id,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sub_tasks.clone();
        self.run(
            action,
            Undo::RemoveSubTask(provisional),
            async move { gateway.create(&draft).await },
            move |model, mut sub_task: SubTask| {
                if sub_task.item_id == 0 {
                    sub_task.item_id = item_id;
                }
                model.replace_sub_task(provisional, sub_task.clone());
                sub_task
            },
        )
    }

    pub fn edit_sub_task(&self, id: SubTaskId, draft: SubTaskDraft) -> Pending<SubTask> {
        let action = Action::EditSubTask;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(id, "task")?;
            model
                .apply_sub_task_draft(id, &draft)
                .ok_or_else(|| gone("task", id))
        });
        let previous = match prepared {
            Ok(previous) => previous,
            Err(e) => return self.reject(action, e),
        };
        let item_id = previous.item_id;

        let gateway = self.gateways.sub_tasks.clone();
        self.run(
            action,
            Undo::RestoreSubTaskFields(previous),
            async move { gateway.update(id, &draft).await },
            move |model, mut sub_task: SubTask| {
                if sub_task.item_id == 0 {
                    sub_task.item_id = item_id;
                }
                model.replace_sub_task(id, sub_task.clone());
                sub_task
            },
        )
    }

    pub fn delete_sub_task(&self, id: SubTaskId) -> Pending<()> {
        let action = Action::DeleteSubTask;
        let prepared = self.prepare(|model| {
            confirmed(id, "task")?;
            model.remove_sub_task(id).ok_or_else(|| gone("task", id))
        });
        let (index, sub_task) = match prepared {
            Ok(removed) => removed,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sub_tasks.clone();
        self.run(
            action,
            Undo::RestoreSubTask { index, sub_task },
            async move { gateway.delete(id).await },
            |_, ()| (),
        )
    }

    /// Fetch an item's sub-tasks unless they are loaded or already being
    /// fetched.
    pub fn load_sub_tasks(&self, item_id: ItemId) -> Pending<()> {
        let claimed = self.prepare(|model| Ok(model.begin_sub_task_fetch(item_id)));
        match claimed {
            Ok(true) => self.fetch_sub_tasks(item_id, None),
            Ok(false) => Pending::ready(Ok(())),
            Err(e) => Pending::ready(Err(e)),
        }
    }

    /// Drop the cached sub-tasks of an item and fetch them again. The old
    /// list comes back if the fetch fails.
    pub fn refresh_sub_tasks(&self, item_id: ItemId) -> Pending<()> {
        let prepared = self.prepare(|model| {
            let previous = model.invalidate_sub_tasks(item_id);
            if model.begin_sub_task_fetch(item_id) {
                return Ok(Some(previous));
            }
            if let Some(sub_tasks) = previous {
                model.set_sub_tasks(item_id, sub_tasks);
            }
            Ok(None)
        });
        match prepared {
            Ok(Some(previous)) => self.fetch_sub_tasks(item_id, previous),
            Ok(None) => Pending::ready(Ok(())),
            Err(e) => Pending::ready(Err(e)),
        }
    }

    fn fetch_sub_tasks(&self, item_id: ItemId, previous: Option<Vec<SubTask>>) -> Pending<()> {
        tracing::debug!("Fetching tasks of backlog item {}", item_id);
        let gateway = self.gateways.sub_tasks.clone();
        self.run(
            Action::LoadSubTasks,
            Undo::RestoreSubTasks { item_id, previous },
            async move { gateway.list(item_id).await },
            move |model, sub_tasks: Vec<SubTask>| {
                model.set_sub_tasks(item_id, sub_tasks);
            },
        )
    }

    // Columns

    pub fn create_column(&self, draft: ColumnDraft) -> Pending<Column> {
        let action = Action::CreateColumn;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            let status_key = normalize_status_key(&draft.status_key);
            if model.column_by_status(&status_key).is_some() {
                return Err(BoardError::Validation(format!(
                    "A column with status {} already exists",
                    status_key
                )));
            }
            let id = model.allocate_provisional_id();
            model.upsert_column(Column::from_draft(id, &draft));
            Ok(id)
        });
        let provisional = match prepared {
            Ok(id) => id,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.columns.clone();
        self.run(
            action,
            Undo::RemoveColumn(provisional),
            async move { gateway.create(&draft).await },
            move |model, column: Column| {
                model.replace_column(provisional, column.clone());
                column
            },
        )
    }

    /// Rename or reposition a column. The status key is fixed, and default
    /// columns keep their position.
    pub fn edit_column(&self, id: ColumnId, draft: ColumnDraft) -> Pending<Column> {
        let action = Action::EditColumn;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(id, "column")?;
            let previous = model.column(id).cloned().ok_or_else(|| gone("column", id))?;
            let mut updated = previous.clone();
            updated.apply_draft(&draft);
            let draft = ColumnDraft {
                status_key: previous.status_key.clone(),
                order: updated.order,
                ..draft.clone()
            };
            model.upsert_column(updated);
            Ok((previous, draft))
        });
        let (previous, draft) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.columns.clone();
        self.run(
            action,
            Undo::RestoreColumn(previous),
            async move { gateway.update(id, &draft).await },
            |model, column: Column| {
                model.upsert_column(column.clone());
                column
            },
        )
    }

    /// Delete a column. Default columns are refused here; whether a column
    /// still holds items is for the store to decide. An occupied column
    /// stays on the board until the store answers, so its items always
    /// have somewhere to show.
    pub fn delete_column(&self, id: ColumnId) -> Pending<()> {
        let action = Action::DeleteColumn;
        let prepared = self.prepare(|model| {
            confirmed(id, "column")?;
            let column = model.column(id).ok_or_else(|| gone("column", id))?;
            if column.is_default {
                return Err(BoardError::Validation(
                    "Default columns cannot be deleted".into(),
                ));
            }
            let occupied = !model
                .items_by_column(&column.status_key, &BoardFilter::default())
                .is_empty();
            if occupied {
                tracing::debug!("Column {} holds items; deleting after the store agrees", id);
                return Ok(None);
            }
            model.remove_column(id).ok_or_else(|| gone("column", id)).map(Some)
        });
        let undo = match prepared {
            Ok(Some(column)) => Undo::RestoreColumn(column),
            Ok(None) => Undo::Nothing,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.columns.clone();
        self.run(
            action,
            undo,
            async move { gateway.delete(id).await },
            move |model, ()| {
                model.remove_column(id);
            },
        )
    }

    // Sprints

    pub fn create_sprint(&self, draft: SprintDraft) -> Pending<Sprint> {
        let action = Action::CreateSprint;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            let id = model.allocate_provisional_id();
            model.upsert_sprint(Sprint::from_draft(id, &draft));
            Ok(id)
        });
        let provisional = match prepared {
            Ok(id) => id,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RemoveSprint(provisional),
            async move { gateway.create(&draft).await },
            move |model, sprint: Sprint| {
                model.replace_sprint(provisional, sprint.clone());
                sprint
            },
        )
    }

    pub fn edit_sprint(&self, id: SprintId, draft: SprintDraft) -> Pending<Sprint> {
        let action = Action::EditSprint;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(id, "sprint")?;
            let previous = model.sprint(id).cloned().ok_or_else(|| gone("sprint", id))?;
            let mut updated = previous.clone();
            updated.apply_draft(&draft);
            model.upsert_sprint(updated);
            Ok(previous)
        });
        let previous = match prepared {
            Ok(previous) => previous,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RestoreSprintFields(previous),
            async move { gateway.update(id, &draft).await },
            merge_sprint,
        )
    }

    /// Delete a sprint. Its items stay on the board, unscheduled.
    pub fn delete_sprint(&self, id: SprintId) -> Pending<()> {
        let action = Action::DeleteSprint;
        let prepared = self.prepare(|model| {
            confirmed(id, "sprint")?;
            model.remove_sprint(id).ok_or_else(|| gone("sprint", id))
        });
        let (index, sprint, item_ids) = match prepared {
            Ok(removed) => removed,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RestoreSprint {
                index,
                sprint,
                item_ids,
            },
            async move { gateway.delete(id).await },
            |_, ()| (),
        )
    }

    /// Start or complete a sprint. Sprints never go back to planning.
    pub fn change_sprint_status(&self, id: SprintId, status: SprintStatus) -> Pending<Sprint> {
        let action = Action::ChangeSprintStatus;
        let prepared = self.prepare(|model| {
            confirmed(id, "sprint")?;
            let sprint = model.sprint(id).cloned().ok_or_else(|| gone("sprint", id))?;
            if sprint.status == status {
                return Ok(Err(sprint));
            }
            if status == SprintStatus::Planned {
                return Err(BoardError::Validation(
                    "A sprint cannot be moved back to planning".into(),
                ));
            }
            let mut updated = sprint.clone();
            updated.status = status;
            model.upsert_sprint(updated);
            Ok(Ok(sprint))
        });
        let previous = match prepared {
            Ok(Ok(previous)) => previous,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RestoreSprintFields(previous),
            async move { gateway.update_status(id, status).await },
            merge_sprint,
        )
    }

    pub fn assign_to_sprint(&self, sprint_id: SprintId, item_id: ItemId) -> Pending<BacklogItem> {
        let action = Action::AssignToSprint;
        let prepared = self.prepare(|model| {
            confirmed(sprint_id, "sprint")?;
            confirmed(item_id, "backlog item")?;
            if model.sprint(sprint_id).is_none() {
                return Err(gone("sprint", sprint_id));
            }
            let item = model.item(item_id).ok_or_else(|| gone("backlog item", item_id))?;
            if item.sprint_id == Some(sprint_id) {
                return Ok(Err(item.clone()));
            }
            Ok(Ok(model.set_item_sprint(item_id, Some(sprint_id)).flatten()))
        });
        let previous = match prepared {
            Ok(Ok(previous)) => previous,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RestoreItemSprint {
                id: item_id,
                sprint_id: previous,
            },
            async move { gateway.assign(sprint_id, item_id).await },
            merge_item,
        )
    }

    pub fn remove_from_sprint(&self, item_id: ItemId) -> Pending<BacklogItem> {
        let action = Action::RemoveFromSprint;
        let prepared = self.prepare(|model| {
            confirmed(item_id, "backlog item")?;
            let item = model.item(item_id).ok_or_else(|| gone("backlog item", item_id))?;
            match item.sprint_id {
                None => Ok(Err(item.clone())),
                Some(sprint_id) => {
                    model.set_item_sprint(item_id, None);
                    Ok(Ok(sprint_id))
                }
            }
        });
        let sprint_id = match prepared {
            Ok(Ok(sprint_id)) => sprint_id,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::RestoreItemSprint {
                id: item_id,
                sprint_id: Some(sprint_id),
            },
            async move { gateway.unassign(sprint_id, item_id).await },
            merge_item,
        )
    }

    // Releases

    pub fn create_release(&self, draft: ReleaseDraft) -> Pending<Release> {
        let action = Action::CreateRelease;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            let id = model.allocate_provisional_id();
            model.upsert_release(Release::from_draft(id, &draft));
            Ok(id)
        });
        let provisional = match prepared {
            Ok(id) => id,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RemoveRelease(provisional),
            async move { gateway.create(&draft).await },
            move |model, release: Release| {
                model.replace_release(provisional, release.clone());
                release
            },
        )
    }

    pub fn edit_release(&self, id: ReleaseId, draft: ReleaseDraft) -> Pending<Release> {
        let action = Action::EditRelease;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            confirmed(id, "release")?;
            let previous = model.release(id).cloned().ok_or_else(|| gone("release", id))?;
            let mut updated = previous.clone();
            updated.apply_draft(&draft);
            model.upsert_release(updated);
            Ok(previous)
        });
        let previous = match prepared {
            Ok(previous) => previous,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RestoreReleaseFields(previous),
            async move { gateway.update(id, &draft).await },
            merge_release,
        )
    }

    /// Delete a release. Its items stay on the board, unreleased.
    pub fn delete_release(&self, id: ReleaseId) -> Pending<()> {
        let action = Action::DeleteRelease;
        let prepared = self.prepare(|model| {
            confirmed(id, "release")?;
            model.remove_release(id).ok_or_else(|| gone("release", id))
        });
        let (index, release, item_ids) = match prepared {
            Ok(removed) => removed,
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RestoreRelease {
                index,
                release,
                item_ids,
            },
            async move { gateway.delete(id).await },
            |_, ()| (),
        )
    }

    pub fn change_release_status(&self, id: ReleaseId, status: ReleaseStatus) -> Pending<Release> {
        let action = Action::ChangeReleaseStatus;
        let prepared = self.prepare(|model| {
            confirmed(id, "release")?;
            let release = model.release(id).cloned().ok_or_else(|| gone("release", id))?;
            if release.status == status {
                return Ok(Err(release));
            }
            let mut updated = release.clone();
            updated.status = status;
            model.upsert_release(updated);
            Ok(Ok(release))
        });
        let previous = match prepared {
            Ok(Ok(previous)) => previous,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RestoreReleaseFields(previous),
            async move { gateway.update_status(id, status).await },
            merge_release,
        )
    }

    pub fn assign_to_release(&self, release_id: ReleaseId, item_id: ItemId) -> Pending<BacklogItem> {
        let action = Action::AssignToRelease;
        let prepared = self.prepare(|model| {
            confirmed(release_id, "release")?;
            confirmed(item_id, "backlog item")?;
            if model.release(release_id).is_none() {
                return Err(gone("release", release_id));
            }
            let item = model.item(item_id).ok_or_else(|| gone("backlog item", item_id))?;
            if item.release_id == Some(release_id) {
                return Ok(Err(item.clone()));
            }
            Ok(Ok(model.set_item_release(item_id, Some(release_id)).flatten()))
        });
        let previous = match prepared {
            Ok(Ok(previous)) => previous,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RestoreItemRelease {
                id: item_id,
                release_id: previous,
            },
            async move { gateway.assign(release_id, item_id).await },
            merge_item,
        )
    }

    pub fn remove_from_release(&self, item_id: ItemId) -> Pending<BacklogItem> {
        let action = Action::RemoveFromRelease;
        let prepared = self.prepare(|model| {
            confirmed(item_id, "backlog item")?;
            let item = model.item(item_id).ok_or_else(|| gone("backlog item", item_id))?;
            match item.release_id {
                None => Ok(Err(item.clone())),
                Some(release_id) => {
                    model.set_item_release(item_id, None);
                    Ok(Ok(release_id))
                }
            }
        });
        let release_id = match prepared {
            Ok(Ok(release_id)) => release_id,
            Ok(Err(unchanged)) => return Pending::ready(Ok(unchanged)),
            Err(e) => return self.reject(action, e),
        };

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::RestoreItemRelease {
                id: item_id,
                release_id: Some(release_id),
            },
            async move { gateway.unassign(release_id, item_id).await },
            merge_item,
        )
    }

    // Membership

    /// Reload which items the store has planned into a sprint. Items the
    /// store no longer lists there lose their sprint locally.
    pub fn refresh_sprint_items(&self, sprint_id: SprintId) -> Pending<()> {
        let action = Action::LoadSprintItems;
        let checked = self.prepare(|model| {
            confirmed(sprint_id, "sprint")?;
            model
                .sprint(sprint_id)
                .map(|_| ())
                .ok_or_else(|| gone("sprint", sprint_id))
        });
        if let Err(e) = checked {
            return self.reject(action, e);
        }

        let gateway = self.gateways.sprints.clone();
        self.run(
            action,
            Undo::Nothing,
            async move { gateway.items(sprint_id).await },
            move |model, items: Vec<BacklogItem>| {
                let listed: BTreeSet<ItemId> = items.iter().map(|item| item.id).collect();
                let stale: Vec<ItemId> = model
                    .items_by_sprint(SprintFilter::Sprint(sprint_id))
                    .iter()
                    .map(|item| item.id)
                    .filter(|id| !listed.contains(id))
                    .collect();
                for id in stale {
                    model.set_item_sprint(id, None);
                }
                for item in items {
                    model.upsert_item(item);
                }
            },
        )
    }

    /// Reload which items the store has in a release.
    pub fn refresh_release_items(&self, release_id: ReleaseId) -> Pending<()> {
        let action = Action::LoadReleaseItems;
        let checked = self.prepare(|model| {
            confirmed(release_id, "release")?;
            model
                .release(release_id)
                .map(|_| ())
                .ok_or_else(|| gone("release", release_id))
        });
        if let Err(e) = checked {
            return self.reject(action, e);
        }

        let gateway = self.gateways.releases.clone();
        self.run(
            action,
            Undo::Nothing,
            async move { gateway.items(release_id).await },
            move |model, items: Vec<BacklogItem>| {
                let listed: BTreeSet<ItemId> = items.iter().map(|item| item.id).collect();
                let stale: Vec<ItemId> = model
                    .release_items(release_id)
                    .iter()
                    .map(|item| item.id)
                    .filter(|id| !listed.contains(id))
                    .collect();
                for id in stale {
                    model.set_item_release(id, None);
                }
                for item in items {
                    model.upsert_item(item);
                }
            },
        )
    }

    // Project

    pub fn edit_project(&self, draft: ProjectDraft) -> Pending<Project> {
        let action = Action::EditProject;
        let prepared = self.prepare(|model| {
            draft.validate()?;
            let mut updated = model.project().clone();
            updated.apply_draft(&draft);
            Ok(model.set_project(updated))
        });
        let previous = match prepared {
            Ok(previous) => previous,
            Err(e) => return self.reject(action, e),
        };
        let id = previous.id;

        let gateway = self.gateways.projects.clone();
        self.run(
            action,
            Undo::RestoreProject(previous),
            async move { gateway.update(id, &draft).await },
            |model, project: Project| {
                model.set_project(project.clone());
                project
            },
        )
    }

    // Plumbing

    /// Run the optimistic step against the live model.
    fn prepare<R>(&self, step: impl FnOnce(&mut BoardModel) -> BoardResult<R>) -> BoardResult<R> {
        let model = self.model.upgrade().ok_or(BoardError::ViewClosed)?;
        let result = step(&mut model.borrow_mut());
        if result.is_ok() {
            self.touch();
        }
        result
    }

    fn reject<T: 'static>(&self, action: Action, error: BoardError) -> Pending<T> {
        tracing::debug!("Refused {} locally: {}", action, error);
        self.report(action, &error);
        Pending::ready(Err(error))
    }

    /// Spawn the remote half of an operation whose local change is already
    /// applied.
    fn run<R, T>(
        &self,
        action: Action,
        undo: Undo,
        call: impl Future<Output = GatewayResult<R>> + 'static,
        merge: impl FnOnce(&mut BoardModel, R) -> T + 'static,
    ) -> Pending<T>
    where
        R: 'static,
        T: 'static,
    {
        let engine = self.clone();
        Pending::spawn(async move {
            let result = engine.guard(call).await;
            engine.settle(action, undo, result, merge)
        })
    }

    async fn guard<R>(&self, call: impl Future<Output = GatewayResult<R>>) -> GatewayResult<R> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(GatewayError::Network(Some("The request timed out".into())))
            }),
            None => call.await,
        }
    }

    fn settle<R, T>(
        &self,
        action: Action,
        undo: Undo,
        result: GatewayResult<R>,
        merge: impl FnOnce(&mut BoardModel, R) -> T,
    ) -> BoardResult<T> {
        let Some(model) = self.model.upgrade() else {
            tracing::debug!("Ignoring response to {}: board closed", action);
            return Err(BoardError::ViewClosed);
        };

        match result {
            Ok(response) => {
                let value = merge(&mut model.borrow_mut(), response);
                self.touch();
                if let Some(message) = action.success_message() {
                    self.notifier.notify(Notification::success(message));
                }
                Ok(value)
            }
            Err(error) => {
                tracing::warn!("{} failed, rolling back: {}", action, error);
                undo.apply(&mut model.borrow_mut());
                self.touch();
                let error = BoardError::from(error);
                self.report(action, &error);
                Err(error)
            }
        }
    }

    fn report(&self, action: Action, error: &BoardError) {
        if matches!(error, BoardError::ViewClosed) {
            return;
        }
        if self.feedback == Feedback::Scoped && error.class() != ErrorClass::Authorization {
            return;
        }
        self.notifier
            .notify(Notification::error(failure_text(action, error)));
    }
}

fn merge_item(model: &mut BoardModel, item: BacklogItem) -> BacklogItem {
    model.upsert_item(item.clone());
    item
}

fn merge_sprint(model: &mut BoardModel, sprint: Sprint) -> Sprint {
    model.upsert_sprint(sprint.clone());
    sprint
}

fn merge_release(model: &mut BoardModel, release: Release) -> Release {
    model.upsert_release(release.clone());
    release
}

fn require_column(model: &BoardModel, status_key: &str) -> BoardResult<()> {
    match model.column_by_status(status_key) {
        Some(_) => Ok(()),
        None => Err(BoardError::Validation(format!(
            "No column has status {}",
            status_key
        ))),
    }
}

/// Provisional entities exist only locally until the store confirms them.
fn confirmed(id: u64, label: &str) -> BoardResult<()> {
    if BoardModel::is_provisional(id) {
        return Err(BoardError::Conflict(format!(
            "This {} is still being saved",
            label
        )));
    }
    Ok(())
}

fn gone(label: &str, id: u64) -> BoardError {
    BoardError::NotFound(format!("{} {}", label, id))
}
