//! The in-memory board: one project with its columns, backlog items,
//! sprints and releases.
//!
//! Queries are pure. Mutations return whatever is needed to invert them
//! exactly, so a caller that applied an optimistic change can roll it back
//! without touching anything else.

use std::collections::{BTreeMap, BTreeSet};

use crate::backlog_item::{BacklogItem, BacklogItemDraft, ItemId};
use crate::column::{Column, ColumnId};
use crate::entity::{EntityId, RemoteEntity};
use crate::filter::{ItemFilter, ReleaseFilter, SprintFilter, StatusFilter};
use crate::project::Project;
use crate::release::{Release, ReleaseId};
use crate::sprint::{Sprint, SprintId};
use crate::sub_task::{SubTask, SubTaskDraft, SubTaskId};

/// Ids above this value are provisional: handed out locally for entities
/// the store has not confirmed yet. The store never assigns them.
pub const PROVISIONAL_FLOOR: EntityId = u64::MAX - u32::MAX as u64;

#[derive(Debug, Clone)]
pub struct BoardModel {
    project: Project,
    /// Kept sorted by board order.
    columns: Vec<Column>,
    items: Vec<BacklogItem>,
    sprints: Vec<Sprint>,
    releases: Vec<Release>,
    next_provisional_id: EntityId,
    loading_sub_tasks: BTreeSet<ItemId>,
}

/// Equality covers the board contents only, not bookkeeping such as the
/// provisional id counter or in-flight sub-task fetches.
impl PartialEq for BoardModel {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project
            && self.columns == other.columns
            && self.items == other.items
            && self.sprints == other.sprints
            && self.releases == other.releases
    }
}

impl BoardModel {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            columns: Vec::new(),
            items: Vec::new(),
            sprints: Vec::new(),
            releases: Vec::new(),
            next_provisional_id: u64::MAX,
            loading_sub_tasks: BTreeSet::new(),
        }
    }

    pub fn with_contents(
        project: Project,
        columns: Vec<Column>,
        items: Vec<BacklogItem>,
        sprints: Vec<Sprint>,
        releases: Vec<Release>,
    ) -> Self {
        let mut model = Self::new(project);
        for column in columns {
            model.upsert_column(column);
        }
        for item in items {
            model.upsert_item(item);
        }
        for sprint in sprints {
            model.upsert_sprint(sprint);
        }
        for release in releases {
            model.upsert_release(release);
        }

        let unplaced = model.unplaced_items().len();
        if unplaced > 0 {
            tracing::warn!(
                "{} backlog item(s) have a status with no matching column",
                unplaced
            );
        }
        model
    }

    pub fn allocate_provisional_id(&mut self) -> EntityId {
        let id = self.next_provisional_id;
        self.next_provisional_id -= 1;
        id
    }

    pub fn is_provisional(id: EntityId) -> bool {
        id > PROVISIONAL_FLOOR
    }

    // Project

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the project, returning the previous value.
    pub fn set_project(&mut self, project: Project) -> Project {
        std::mem::replace(&mut self.project, project)
    }

    // Columns

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_by_status(&self, status_key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.status_key == status_key)
    }

    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn upsert_column(&mut self, column: Column) -> Option<Column> {
        let previous = upsert_by_id(&mut self.columns, column);
        self.sort_columns();
        previous
    }

    pub fn replace_column(&mut self, old_id: ColumnId, column: Column) {
        replace_by_id(&mut self.columns, old_id, column);
        self.sort_columns();
    }

    pub fn remove_column(&mut self, id: ColumnId) -> Option<Column> {
        remove_by_id(&mut self.columns, id).map(|(_, column)| column)
    }

    /// Move a column within the strip and renumber orders to match. Local
    /// only; nothing here is persisted.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() {
            return false;
        }
        let to = to.min(self.columns.len() - 1);
        if from == to {
            return false;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        for (position, column) in self.columns.iter_mut().enumerate() {
            column.order = position as i32 + 1;
        }
        true
    }

    fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.board_order(b));
    }

    // Backlog items

    pub fn items(&self) -> &[BacklogItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&BacklogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut BacklogItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Insert or replace an item by id.
    ///
    /// A replacement keeps the existing `expanded` flag, and keeps the
    /// already-loaded sub-tasks when the incoming payload has none.
    pub fn upsert_item(&mut self, mut item: BacklogItem) -> Option<BacklogItem> {
        adopt_sub_tasks(&mut item);
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                carry_display_state(existing, &mut item);
                Some(std::mem::replace(existing, item))
            }
            None => {
                self.items.push(item);
                None
            }
        }
    }

    /// Swap a provisional item for its confirmed version in place.
    pub fn replace_item(&mut self, old_id: ItemId, mut item: BacklogItem) {
        adopt_sub_tasks(&mut item);
        match self.items.iter_mut().find(|i| i.id == old_id) {
            Some(existing) => {
                carry_display_state(existing, &mut item);
                *existing = item;
            }
            None => {
                self.upsert_item(item);
            }
        }
    }

    pub fn insert_item_at(&mut self, index: usize, item: BacklogItem) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Remove an item together with its loaded sub-tasks. Absent ids are
    /// not an error.
    pub fn remove_item(&mut self, id: ItemId) -> Option<(usize, BacklogItem)> {
        self.loading_sub_tasks.remove(&id);
        remove_by_id(&mut self.items, id)
    }

    /// Set an item's status, returning the previous one.
    pub fn set_item_status(&mut self, id: ItemId, status: &str) -> Option<String> {
        let item = self.item_mut(id)?;
        Some(std::mem::replace(&mut item.status, status.to_string()))
    }

    pub fn set_item_sprint(
        &mut self,
        id: ItemId,
        sprint_id: Option<SprintId>,
    ) -> Option<Option<SprintId>> {
        let item = self.item_mut(id)?;
        Some(std::mem::replace(&mut item.sprint_id, sprint_id))
    }

    pub fn set_item_release(
        &mut self,
        id: ItemId,
        release_id: Option<ReleaseId>,
    ) -> Option<Option<ReleaseId>> {
        let item = self.item_mut(id)?;
        Some(std::mem::replace(&mut item.release_id, release_id))
    }

    /// Apply an edit, returning the item as it was before.
    pub fn apply_item_draft(&mut self, id: ItemId, draft: &BacklogItemDraft) -> Option<BacklogItem> {
        let item = self.item_mut(id)?;
        let previous = item.clone();
        item.apply_draft(draft);
        Some(previous)
    }

    /// Put back the persisted fields of a snapshot taken earlier.
    pub fn restore_item_fields(&mut self, snapshot: &BacklogItem) -> bool {
        match self.item_mut(snapshot.id) {
            Some(item) => {
                item.restore_fields(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn set_expanded(&mut self, id: ItemId, expanded: bool) -> bool {
        match self.item_mut(id) {
            Some(item) => {
                item.expanded = expanded;
                true
            }
            None => false,
        }
    }

    pub fn toggle_expanded(&mut self, id: ItemId) -> Option<bool> {
        let item = self.item_mut(id)?;
        item.expanded = !item.expanded;
        Some(item.expanded)
    }

    // Derived views

    /// Items shown in the column with `status_key` under `filter`.
    pub fn items_by_column(&self, status_key: &str, filter: &impl ItemFilter) -> Vec<&BacklogItem> {
        let status = StatusFilter::new(status_key);
        self.items
            .iter()
            .filter(|item| status.matches(item) && filter.matches(item))
            .collect()
    }

    pub fn items_by_sprint(&self, filter: SprintFilter) -> Vec<&BacklogItem> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    /// Items not yet assigned to any release.
    pub fn available_items(&self) -> Vec<&BacklogItem> {
        self.items
            .iter()
            .filter(|item| ReleaseFilter::Unreleased.matches(item))
            .collect()
    }

    pub fn release_items(&self, release_id: ReleaseId) -> Vec<&BacklogItem> {
        self.items
            .iter()
            .filter(|item| ReleaseFilter::Release(release_id).matches(item))
            .collect()
    }

    /// Items not planned into any sprint.
    pub fn sprint_backlog(&self) -> Vec<&BacklogItem> {
        self.items_by_sprint(SprintFilter::Unscheduled)
    }

    /// Items whose status matches no column. Empty on a consistent board.
    pub fn unplaced_items(&self) -> Vec<&BacklogItem> {
        self.items
            .iter()
            .filter(|item| self.column_by_status(&item.status).is_none())
            .collect()
    }

    /// Position of an item within its own column grouping under `filter`.
    pub fn position_in_group(&self, id: ItemId, filter: &impl ItemFilter) -> Option<usize> {
        let item = self.item(id)?;
        self.items_by_column(&item.status, filter)
            .iter()
            .position(|i| i.id == id)
    }

    /// Reorder one grouping. Items outside the grouping keep their slots.
    pub fn reorder_in_group(
        &mut self,
        status_key: &str,
        filter: &impl ItemFilter,
        from: usize,
        to: usize,
    ) -> bool {
        let status = StatusFilter::new(status_key);
        let slots: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| status.matches(item) && filter.matches(item))
            .map(|(index, _)| index)
            .collect();
        if from >= slots.len() {
            return false;
        }
        let to = to.min(slots.len() - 1);
        if from == to {
            return false;
        }

        let mut cells: Vec<Option<BacklogItem>> = std::mem::take(&mut self.items)
            .into_iter()
            .map(Some)
            .collect();
        let mut members: Vec<BacklogItem> = slots
            .iter()
            .filter_map(|&slot| cells[slot].take())
            .collect();
        let moved = members.remove(from);
        members.insert(to, moved);
        for (&slot, member) in slots.iter().zip(members) {
            cells[slot] = Some(member);
        }
        self.items = cells.into_iter().flatten().collect();
        true
    }

    /// Move an item to `index` within its current grouping.
    pub fn place_in_group(&mut self, id: ItemId, filter: &impl ItemFilter, index: usize) -> bool {
        let Some(status) = self.item(id).map(|i| i.status.clone()) else {
            return false;
        };
        match self.position_in_group(id, filter) {
            Some(from) => self.reorder_in_group(&status, filter, from, index),
            None => false,
        }
    }

    /// Item ids in board order.
    pub fn item_order(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Put the items listed in `order` back into that relative order. They
    /// are shuffled among the slots they hold now; unlisted items stay put.
    pub fn restore_item_order(&mut self, order: &[ItemId]) -> bool {
        let rank: BTreeMap<ItemId, usize> = order
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();
        let slots: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| rank.contains_key(&item.id))
            .map(|(index, _)| index)
            .collect();

        let mut cells: Vec<Option<BacklogItem>> = std::mem::take(&mut self.items)
            .into_iter()
            .map(Some)
            .collect();
        let mut members: Vec<BacklogItem> = slots
            .iter()
            .filter_map(|&slot| cells[slot].take())
            .collect();
        let current: Vec<ItemId> = members.iter().map(|item| item.id).collect();
        members.sort_by_key(|item| rank.get(&item.id).copied().unwrap_or(usize::MAX));
        let changed = members.iter().map(|item| item.id).ne(current.iter().copied());
        for (&slot, member) in slots.iter().zip(members) {
            cells[slot] = Some(member);
        }
        self.items = cells.into_iter().flatten().collect();
        changed
    }

    // Sub-tasks

    pub fn sub_tasks(&self, item_id: ItemId) -> Option<&[SubTask]> {
        self.item(item_id)?.sub_tasks.as_deref()
    }

    pub fn find_sub_task(&self, id: SubTaskId) -> Option<&SubTask> {
        self.items
            .iter()
            .filter_map(|item| item.sub_tasks.as_ref())
            .flatten()
            .find(|t| t.id == id)
    }

    /// Number of loaded sub-tasks across the board.
    pub fn sub_task_count(&self) -> usize {
        self.items
            .iter()
            .filter_map(|item| item.sub_tasks.as_ref())
            .map(Vec::len)
            .sum()
    }

    /// True when the item's sub-tasks have never been fetched and no fetch
    /// is in flight.
    pub fn needs_sub_tasks(&self, item_id: ItemId) -> bool {
        !Self::is_provisional(item_id)
            && !self.loading_sub_tasks.contains(&item_id)
            && self.item(item_id).is_some_and(|i| !i.sub_tasks_loaded())
    }

    /// Claim the fetch of an item's sub-tasks. Returns false when it is
    /// not needed or already claimed.
    pub fn begin_sub_task_fetch(&mut self, item_id: ItemId) -> bool {
        if !self.needs_sub_tasks(item_id) {
            return false;
        }
        self.loading_sub_tasks.insert(item_id)
    }

    pub fn abandon_sub_task_fetch(&mut self, item_id: ItemId) {
        self.loading_sub_tasks.remove(&item_id);
    }

    pub fn set_sub_tasks(&mut self, item_id: ItemId, mut sub_tasks: Vec<SubTask>) -> bool {
        self.loading_sub_tasks.remove(&item_id);
        let Some(item) = self.item_mut(item_id) else {
            return false;
        };
        for sub_task in &mut sub_tasks {
            sub_task.item_id = item_id;
        }
        item.sub_tasks = Some(sub_tasks);
        true
    }

    /// Forget an item's loaded sub-tasks so the next expand fetches them.
    pub fn invalidate_sub_tasks(&mut self, item_id: ItemId) -> Option<Vec<SubTask>> {
        self.item_mut(item_id)?.sub_tasks.take()
    }

    fn loaded_sub_tasks_mut(&mut self, item_id: ItemId) -> Option<&mut Vec<SubTask>> {
        self.item_mut(item_id)?.sub_tasks.as_mut()
    }

    /// Insert or replace a sub-task in its owner's list. Does nothing when
    /// the owner's sub-tasks are not loaded; they arrive with the fetch.
    pub fn upsert_sub_task(&mut self, sub_task: SubTask) -> Option<SubTask> {
        let list = self.loaded_sub_tasks_mut(sub_task.item_id)?;
        upsert_by_id(list, sub_task)
    }

    pub fn replace_sub_task(&mut self, old_id: SubTaskId, sub_task: SubTask) {
        if let Some(list) = self.loaded_sub_tasks_mut(sub_task.item_id) {
            replace_by_id(list, old_id, sub_task);
        }
    }

    pub fn insert_sub_task_at(&mut self, index: usize, sub_task: SubTask) -> bool {
        match self.loaded_sub_tasks_mut(sub_task.item_id) {
            Some(list) => {
                let index = index.min(list.len());
                list.insert(index, sub_task);
                true
            }
            None => false,
        }
    }

    pub fn remove_sub_task(&mut self, id: SubTaskId) -> Option<(usize, SubTask)> {
        self.items
            .iter_mut()
            .filter_map(|item| item.sub_tasks.as_mut())
            .find_map(|list| remove_by_id(list, id))
    }

    /// Apply an edit, returning the sub-task as it was before.
    pub fn apply_sub_task_draft(&mut self, id: SubTaskId, draft: &SubTaskDraft) -> Option<SubTask> {
        let sub_task = self
            .items
            .iter_mut()
            .filter_map(|item| item.sub_tasks.as_mut())
            .flatten()
            .find(|t| t.id == id)?;
        let previous = sub_task.clone();
        sub_task.apply_draft(draft);
        Some(previous)
    }

    // Sprints

    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    pub fn sprint(&self, id: SprintId) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == id)
    }

    pub fn active_sprint(&self) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.is_active())
    }

    pub fn upsert_sprint(&mut self, sprint: Sprint) -> Option<Sprint> {
        upsert_by_id(&mut self.sprints, sprint)
    }

    pub fn replace_sprint(&mut self, old_id: SprintId, sprint: Sprint) {
        replace_by_id(&mut self.sprints, old_id, sprint);
    }

    /// Remove a sprint and clear it from every item that referenced it.
    /// Returns what `restore_sprint` needs to undo the removal.
    pub fn remove_sprint(&mut self, id: SprintId) -> Option<(usize, Sprint, Vec<ItemId>)> {
        let (index, sprint) = remove_by_id(&mut self.sprints, id)?;
        let mut cleared = Vec::new();
        for item in self.items.iter_mut().filter(|i| i.sprint_id == Some(id)) {
            item.sprint_id = None;
            cleared.push(item.id);
        }
        Some((index, sprint, cleared))
    }

    pub fn restore_sprint(&mut self, index: usize, sprint: Sprint, item_ids: &[ItemId]) {
        let id = sprint.id;
        let index = index.min(self.sprints.len());
        self.sprints.insert(index, sprint);
        for item in self.items.iter_mut().filter(|i| item_ids.contains(&i.id)) {
            item.sprint_id = Some(id);
        }
    }

    // Releases

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn release(&self, id: ReleaseId) -> Option<&Release> {
        self.releases.iter().find(|r| r.id == id)
    }

    pub fn upsert_release(&mut self, mut release: Release) -> Option<Release> {
        if release.project_id == 0 {
            release.project_id = self.project.id;
        }
        upsert_by_id(&mut self.releases, release)
    }

    pub fn replace_release(&mut self, old_id: ReleaseId, mut release: Release) {
        if release.project_id == 0 {
            release.project_id = self.project.id;
        }
        replace_by_id(&mut self.releases, old_id, release);
    }

    /// Remove a release and detach its items. Returns what
    /// `restore_release` needs to undo the removal.
    pub fn remove_release(&mut self, id: ReleaseId) -> Option<(usize, Release, Vec<ItemId>)> {
        let (index, release) = remove_by_id(&mut self.releases, id)?;
        let mut cleared = Vec::new();
        for item in self.items.iter_mut().filter(|i| i.release_id == Some(id)) {
            item.release_id = None;
            cleared.push(item.id);
        }
        Some((index, release, cleared))
    }

    pub fn restore_release(&mut self, index: usize, release: Release, item_ids: &[ItemId]) {
        let id = release.id;
        let index = index.min(self.releases.len());
        self.releases.insert(index, release);
        for item in self.items.iter_mut().filter(|i| item_ids.contains(&i.id)) {
            item.release_id = Some(id);
        }
    }
}

fn upsert_by_id<T: RemoteEntity>(list: &mut Vec<T>, entity: T) -> Option<T> {
    match list.iter_mut().find(|e| e.id() == entity.id()) {
        Some(existing) => Some(std::mem::replace(existing, entity)),
        None => {
            list.push(entity);
            None
        }
    }
}

fn replace_by_id<T: RemoteEntity>(list: &mut Vec<T>, old_id: EntityId, entity: T) {
    match list.iter_mut().find(|e| e.id() == old_id) {
        Some(existing) => *existing = entity,
        None => {
            upsert_by_id(list, entity);
        }
    }
}

fn remove_by_id<T: RemoteEntity>(list: &mut Vec<T>, id: EntityId) -> Option<(usize, T)> {
    let index = list.iter().position(|e| e.id() == id)?;
    Some((index, list.remove(index)))
}

fn adopt_sub_tasks(item: &mut BacklogItem) {
    let id = item.id;
    if let Some(sub_tasks) = item.sub_tasks.as_mut() {
        for sub_task in sub_tasks {
            sub_task.item_id = id;
        }
    }
}

fn carry_display_state(existing: &mut BacklogItem, incoming: &mut BacklogItem) {
    incoming.expanded = existing.expanded;
    if incoming.sub_tasks.is_none() {
        incoming.sub_tasks = existing.sub_tasks.take();
    }
}
