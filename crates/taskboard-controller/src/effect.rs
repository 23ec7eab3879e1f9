//! Exact inverses of the optimistic changes the engine applies.

use taskboard_domain::{
    BacklogItem, BoardModel, Column, ColumnId, ItemId, Project, Release, ReleaseId, Sprint,
    SprintId, SubTask, SubTaskId,
};

/// What to do to the model when the store rejects an operation.
///
/// Each variant reverts only the delta of its own operation, so a failure
/// never disturbs changes made by other operations in the meantime.
#[derive(Debug, Clone)]
pub(crate) enum Undo {
    Nothing,
    RemoveItem(ItemId),
    RestoreItem { index: usize, item: BacklogItem },
    RestoreItemFields(BacklogItem),
    RestoreItemStatus { id: ItemId, status: String },
    RestoreItemSprint { id: ItemId, sprint_id: Option<SprintId> },
    RestoreItemRelease { id: ItemId, release_id: Option<ReleaseId> },
    RemoveSubTask(SubTaskId),
    RestoreSubTask { index: usize, sub_task: SubTask },
    RestoreSubTaskFields(SubTask),
    /// A failed fetch: release the claim, and put back what a refresh
    /// discarded.
    RestoreSubTasks { item_id: ItemId, previous: Option<Vec<SubTask>> },
    RemoveColumn(ColumnId),
    RestoreColumn(Column),
    RemoveSprint(SprintId),
    RestoreSprint { index: usize, sprint: Sprint, item_ids: Vec<ItemId> },
    RestoreSprintFields(Sprint),
    RemoveRelease(ReleaseId),
    RestoreRelease { index: usize, release: Release, item_ids: Vec<ItemId> },
    RestoreReleaseFields(Release),
    RestoreProject(Project),
}

impl Undo {
    pub(crate) fn apply(self, model: &mut BoardModel) {
        match self {
            Undo::Nothing => {}
            Undo::RemoveItem(id) => {
                model.remove_item(id);
            }
            Undo::RestoreItem { index, item } => model.insert_item_at(index, item),
            Undo::RestoreItemFields(snapshot) => {
                model.restore_item_fields(&snapshot);
            }
            Undo::RestoreItemStatus { id, status } => {
                model.set_item_status(id, &status);
            }
            Undo::RestoreItemSprint { id, sprint_id } => {
                model.set_item_sprint(id, sprint_id);
            }
            Undo::RestoreItemRelease { id, release_id } => {
                model.set_item_release(id, release_id);
            }
            Undo::RemoveSubTask(id) => {
                model.remove_sub_task(id);
            }
            Undo::RestoreSubTask { index, sub_task } => {
                model.insert_sub_task_at(index, sub_task);
            }
            Undo::RestoreSubTaskFields(sub_task) => model.replace_sub_task(sub_task.id, sub_task),
            Undo::RestoreSubTasks { item_id, previous } => {
                model.abandon_sub_task_fetch(item_id);
                if let Some(sub_tasks) = previous {
                    model.set_sub_tasks(item_id, sub_tasks);
                }
            }
            Undo::RemoveColumn(id) => {
                model.remove_column(id);
            }
            Undo::RestoreColumn(column) => {
                model.upsert_column(column);
            }
            Undo::RemoveSprint(id) => {
                model.remove_sprint(id);
            }
            Undo::RestoreSprint {
                index,
                sprint,
                item_ids,
            } => model.restore_sprint(index, sprint, &item_ids),
            Undo::RestoreSprintFields(sprint) => {
                model.upsert_sprint(sprint);
            }
            Undo::RemoveRelease(id) => {
                model.remove_release(id);
            }
            Undo::RestoreRelease {
                index,
                release,
                item_ids,
            } => model.restore_release(index, release, &item_ids),
            Undo::RestoreReleaseFields(release) => {
                model.upsert_release(release);
            }
            Undo::RestoreProject(project) => {
                model.set_project(project);
            }
        }
    }
}
