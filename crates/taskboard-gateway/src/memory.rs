//! In-memory stand-in for the remote store.
//!
//! Enforces the same rules the real store does (unique column keys,
//! protected default columns, cascading deletes) and records every call,
//! so tests can assert both on the resulting board and on what was sent.
//! Calls can be scripted to fail, and the whole store can be paused to
//! hold responses in flight.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use taskboard_core::{GatewayError, GatewayResult};
use taskboard_domain::{
    normalize_status_key, BacklogItem, BacklogItemDraft, Column, ColumnDraft, EntityId,
    EntityKind, ItemId, Project, ProjectDraft, ProjectId, Release, ReleaseDraft, ReleaseStatus,
    Sprint, SprintDraft, SprintStatus, SubTask, SubTaskDraft, UserRef,
};
use tokio::sync::Notify;

use crate::traits::{AssignmentGateway, Gateway, StatusGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    UpdateStatus,
    Assign,
    Unassign,
    Items,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: EntityKind,
    pub operation: Operation,
    pub id: Option<EntityId>,
}

#[derive(Debug, Clone)]
struct StoredItem {
    project_id: ProjectId,
    item: BacklogItem,
}

#[derive(Debug)]
struct StoreState {
    next_id: EntityId,
    projects: Vec<Project>,
    columns: Vec<Column>,
    items: Vec<StoredItem>,
    sub_tasks: Vec<SubTask>,
    sprints: Vec<Sprint>,
    releases: Vec<Release>,
    calls: Vec<Call>,
    failures: Vec<(EntityKind, Operation, GatewayError)>,
}

impl StoreState {
    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn column_exists(&self, project_id: ProjectId, status_key: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.project_id == project_id && c.status_key == status_key)
    }

    fn stored_item(&mut self, id: ItemId) -> GatewayResult<&mut StoredItem> {
        self.items
            .iter_mut()
            .find(|stored| stored.item.id == id)
            .ok_or_else(|| not_found(EntityKind::BacklogItem, id))
    }

    /// Items are served without sub-tasks; those load separately.
    fn item_response(item: &BacklogItem) -> BacklogItem {
        let mut item = item.clone();
        item.sub_tasks = None;
        item.expanded = false;
        item
    }
}

pub struct RemoteStore {
    state: RefCell<StoreState>,
    paused: Cell<bool>,
    resumed: Notify,
}

impl Default for RemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StoreState {
                next_id: 1,
                projects: Vec::new(),
                columns: Vec::new(),
                items: Vec::new(),
                sub_tasks: Vec::new(),
                sprints: Vec::new(),
                releases: Vec::new(),
                calls: Vec::new(),
                failures: Vec::new(),
            }),
            paused: Cell::new(false),
            resumed: Notify::new(),
        }
    }

    /// Id the store will assign to the next created entity.
    pub fn set_next_id(&self, id: EntityId) {
        self.state.borrow_mut().next_id = id;
    }

    pub fn seed_project(&self, project: Project) {
        self.state.borrow_mut().projects.push(project);
    }

    pub fn seed_column(&self, column: Column) {
        self.state.borrow_mut().columns.push(column);
    }

    pub fn seed_item(&self, project_id: ProjectId, item: BacklogItem) {
        let mut state = self.state.borrow_mut();
        if let Some(sub_tasks) = &item.sub_tasks {
            state.sub_tasks.extend(sub_tasks.iter().cloned().map(|mut t| {
                t.item_id = item.id;
                t
            }));
        }
        state.items.push(StoredItem { project_id, item });
    }

    pub fn seed_sub_task(&self, sub_task: SubTask) {
        self.state.borrow_mut().sub_tasks.push(sub_task);
    }

    pub fn seed_sprint(&self, sprint: Sprint) {
        self.state.borrow_mut().sprints.push(sprint);
    }

    pub fn seed_release(&self, release: Release) {
        self.state.borrow_mut().releases.push(release);
    }

    /// Make the next `operation` on `kind` fail with `error`.
    pub fn fail_next(&self, kind: EntityKind, operation: Operation, error: GatewayError) {
        self.state
            .borrow_mut()
            .failures
            .push((kind, operation, error));
    }

    /// Hold every call until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.set(true);
    }

    pub fn resume(&self) {
        self.paused.set(false);
        self.resumed.notify_waiters();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn count(&self, kind: EntityKind, operation: Operation) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.kind == kind && c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn stored_item(&self, id: ItemId) -> Option<BacklogItem> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|stored| stored.item.id == id)
            .map(|stored| stored.item.clone())
    }

    pub fn stored_column(&self, id: EntityId) -> Option<Column> {
        self.state
            .borrow()
            .columns
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn stored_sub_tasks(&self, item_id: ItemId) -> Vec<SubTask> {
        self.state
            .borrow()
            .sub_tasks
            .iter()
            .filter(|t| t.item_id == item_id)
            .cloned()
            .collect()
    }

    pub fn stored_release(&self, id: EntityId) -> Option<Release> {
        self.state
            .borrow()
            .releases
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Record the call, wait while paused, then apply any scripted failure.
    async fn enter(
        &self,
        kind: EntityKind,
        operation: Operation,
        id: Option<EntityId>,
    ) -> GatewayResult<()> {
        self.state.borrow_mut().calls.push(Call {
            kind,
            operation,
            id,
        });

        while self.paused.get() {
            self.resumed.notified().await;
        }

        let mut state = self.state.borrow_mut();
        if let Some(pos) = state
            .failures
            .iter()
            .position(|(k, o, _)| *k == kind && *o == operation)
        {
            let (_, _, error) = state.failures.remove(pos);
            return Err(error);
        }
        Ok(())
    }
}

fn not_found(kind: EntityKind, id: EntityId) -> GatewayError {
    GatewayError::NotFound(Some(format!("No {} with id {}", kind, id)))
}

fn find<'a, T>(
    entities: &'a mut [T],
    id: EntityId,
    kind: EntityKind,
    id_of: impl Fn(&T) -> EntityId,
) -> GatewayResult<&'a mut T> {
    entities
        .iter_mut()
        .find(|e| id_of(e) == id)
        .ok_or_else(|| not_found(kind, id))
}

// Projects

#[async_trait(?Send)]
impl Gateway<Project> for RemoteStore {
    async fn list(&self, parent_id: EntityId) -> GatewayResult<Vec<Project>> {
        self.enter(EntityKind::Project, Operation::List, Some(parent_id))
            .await?;
        Ok(self.state.borrow().projects.clone())
    }

    async fn get(&self, id: EntityId) -> GatewayResult<Project> {
        self.enter(EntityKind::Project, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.projects, id, EntityKind::Project, |p| p.id).map(|p| p.clone())
    }

    async fn create(&self, draft: &ProjectDraft) -> GatewayResult<Project> {
        self.enter(EntityKind::Project, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        let project = Project {
            id: state.allocate_id(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            owner: UserRef::new("owner"),
            members: Default::default(),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: EntityId, draft: &ProjectDraft) -> GatewayResult<Project> {
        self.enter(EntityKind::Project, Operation::Update, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let project = find(&mut state.projects, id, EntityKind::Project, |p| p.id)?;
        project.apply_draft(draft);
        Ok(project.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::Project, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.projects, id, EntityKind::Project, |p| p.id)?;
        state.projects.retain(|p| p.id != id);
        Ok(())
    }
}

// Columns

#[async_trait(?Send)]
impl Gateway<Column> for RemoteStore {
    async fn list(&self, parent_id: ProjectId) -> GatewayResult<Vec<Column>> {
        self.enter(EntityKind::Column, Operation::List, Some(parent_id))
            .await?;
        let mut columns: Vec<Column> = self
            .state
            .borrow()
            .columns
            .iter()
            .filter(|c| c.project_id == parent_id)
            .cloned()
            .collect();
        columns.sort_by(|a, b| a.board_order(b));
        Ok(columns)
    }

    async fn get(&self, id: EntityId) -> GatewayResult<Column> {
        self.enter(EntityKind::Column, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.columns, id, EntityKind::Column, |c| c.id).map(|c| c.clone())
    }

    async fn create(&self, draft: &ColumnDraft) -> GatewayResult<Column> {
        self.enter(EntityKind::Column, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        let status_key = normalize_status_key(&draft.status_key);
        if state.column_exists(draft.project_id, &status_key) {
            return Err(GatewayError::validation(
                "A column with this status already exists for this project",
            ));
        }
        let column = Column::from_draft(state.allocate_id(), draft);
        state.columns.push(column.clone());
        Ok(column)
    }

    async fn update(&self, id: EntityId, draft: &ColumnDraft) -> GatewayResult<Column> {
        self.enter(EntityKind::Column, Operation::Update, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let column = find(&mut state.columns, id, EntityKind::Column, |c| c.id)?;
        column.apply_draft(draft);
        Ok(column.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::Column, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let column = find(&mut state.columns, id, EntityKind::Column, |c| c.id)?.clone();
        if column.is_default {
            return Err(GatewayError::validation("Default columns cannot be deleted"));
        }
        let occupied = state.items.iter().any(|stored| {
            stored.project_id == column.project_id && stored.item.status == column.status_key
        });
        if occupied {
            return Err(GatewayError::validation(
                "Move the backlog items out of this column before deleting it",
            ));
        }
        state.columns.retain(|c| c.id != id);
        Ok(())
    }
}

// Backlog items

#[async_trait(?Send)]
impl Gateway<BacklogItem> for RemoteStore {
    async fn list(&self, parent_id: ProjectId) -> GatewayResult<Vec<BacklogItem>> {
        self.enter(EntityKind::BacklogItem, Operation::List, Some(parent_id))
            .await?;
        Ok(self
            .state
            .borrow()
            .items
            .iter()
            .filter(|stored| stored.project_id == parent_id)
            .map(|stored| StoreState::item_response(&stored.item))
            .collect())
    }

    async fn get(&self, id: EntityId) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::BacklogItem, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        state
            .stored_item(id)
            .map(|stored| StoreState::item_response(&stored.item))
    }

    async fn create(&self, draft: &BacklogItemDraft) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::BacklogItem, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        if !state.column_exists(draft.project_id, &draft.status) {
            return Err(GatewayError::validation(format!(
                "Unknown status {}",
                draft.status
            )));
        }
        let item = BacklogItem::from_draft(state.allocate_id(), draft);
        let response = StoreState::item_response(&item);
        state.items.push(StoredItem {
            project_id: draft.project_id,
            item,
        });
        Ok(response)
    }

    async fn update(&self, id: EntityId, draft: &BacklogItemDraft) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::BacklogItem, Operation::Update, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let project_id = state.stored_item(id)?.project_id;
        if !state.column_exists(project_id, &draft.status) {
            return Err(GatewayError::validation(format!(
                "Unknown status {}",
                draft.status
            )));
        }
        let stored = state.stored_item(id)?;
        stored.item.apply_draft(draft);
        Ok(StoreState::item_response(&stored.item))
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::BacklogItem, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        state.stored_item(id)?;
        state.items.retain(|stored| stored.item.id != id);
        state.sub_tasks.retain(|t| t.item_id != id);
        Ok(())
    }
}

#[async_trait(?Send)]
impl StatusGateway<BacklogItem> for RemoteStore {
    async fn update_status(&self, id: EntityId, status: String) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::BacklogItem, Operation::UpdateStatus, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let project_id = state.stored_item(id)?.project_id;
        if !state.column_exists(project_id, &status) {
            return Err(GatewayError::validation(format!("Unknown status {}", status)));
        }
        let stored = state.stored_item(id)?;
        stored.item.status = status;
        Ok(StoreState::item_response(&stored.item))
    }
}

// Sub-tasks

#[async_trait(?Send)]
impl Gateway<SubTask> for RemoteStore {
    async fn list(&self, parent_id: ItemId) -> GatewayResult<Vec<SubTask>> {
        self.enter(EntityKind::SubTask, Operation::List, Some(parent_id))
            .await?;
        let mut state = self.state.borrow_mut();
        state.stored_item(parent_id)?;
        Ok(state
            .sub_tasks
            .iter()
            .filter(|t| t.item_id == parent_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: EntityId) -> GatewayResult<SubTask> {
        self.enter(EntityKind::SubTask, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.sub_tasks, id, EntityKind::SubTask, |t| t.id).map(|t| t.clone())
    }

    async fn create(&self, draft: &SubTaskDraft) -> GatewayResult<SubTask> {
        self.enter(EntityKind::SubTask, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        state.stored_item(draft.item_id)?;
        let sub_task = SubTask::from_draft(state.allocate_id(), draft);
        state.sub_tasks.push(sub_task.clone());
        Ok(sub_task)
    }

    async fn update(&self, id: EntityId, draft: &SubTaskDraft) -> GatewayResult<SubTask> {
        self.enter(EntityKind::SubTask, Operation::Update, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let sub_task = find(&mut state.sub_tasks, id, EntityKind::SubTask, |t| t.id)?;
        sub_task.apply_draft(draft);
        Ok(sub_task.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::SubTask, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.sub_tasks, id, EntityKind::SubTask, |t| t.id)?;
        state.sub_tasks.retain(|t| t.id != id);
        Ok(())
    }
}

// Sprints

#[async_trait(?Send)]
impl Gateway<Sprint> for RemoteStore {
    async fn list(&self, parent_id: ProjectId) -> GatewayResult<Vec<Sprint>> {
        self.enter(EntityKind::Sprint, Operation::List, Some(parent_id))
            .await?;
        Ok(self
            .state
            .borrow()
            .sprints
            .iter()
            .filter(|s| s.project_id == parent_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: EntityId) -> GatewayResult<Sprint> {
        self.enter(EntityKind::Sprint, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.sprints, id, EntityKind::Sprint, |s| s.id).map(|s| s.clone())
    }

    async fn create(&self, draft: &SprintDraft) -> GatewayResult<Sprint> {
        self.enter(EntityKind::Sprint, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        if draft.end_date <= draft.start_date {
            return Err(GatewayError::validation("End date must be after start date"));
        }
        let taken = state
            .sprints
            .iter()
            .any(|s| s.project_id == draft.project_id && s.name == draft.name);
        if taken {
            return Err(GatewayError::validation(
                "A sprint with this name already exists in this project",
            ));
        }
        let sprint = Sprint::from_draft(state.allocate_id(), draft);
        state.sprints.push(sprint.clone());
        Ok(sprint)
    }

    async fn update(&self, id: EntityId, draft: &SprintDraft) -> GatewayResult<Sprint> {
        self.enter(EntityKind::Sprint, Operation::Update, Some(id))
            .await?;
        if draft.end_date <= draft.start_date {
            return Err(GatewayError::validation("End date must be after start date"));
        }
        let mut state = self.state.borrow_mut();
        let sprint = find(&mut state.sprints, id, EntityKind::Sprint, |s| s.id)?;
        sprint.apply_draft(draft);
        Ok(sprint.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::Sprint, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.sprints, id, EntityKind::Sprint, |s| s.id)?;
        state.sprints.retain(|s| s.id != id);
        for stored in state.items.iter_mut() {
            if stored.item.sprint_id == Some(id) {
                stored.item.sprint_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl StatusGateway<Sprint> for RemoteStore {
    async fn update_status(&self, id: EntityId, status: SprintStatus) -> GatewayResult<Sprint> {
        self.enter(EntityKind::Sprint, Operation::UpdateStatus, Some(id))
            .await?;
        if status == SprintStatus::Planned {
            return Err(GatewayError::validation(
                "A sprint cannot be moved back to planning",
            ));
        }
        let mut state = self.state.borrow_mut();
        let sprint = find(&mut state.sprints, id, EntityKind::Sprint, |s| s.id)?;
        sprint.status = status;
        Ok(sprint.clone())
    }
}

#[async_trait(?Send)]
impl AssignmentGateway<Sprint> for RemoteStore {
    async fn assign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::Sprint, Operation::Assign, Some(parent_id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.sprints, parent_id, EntityKind::Sprint, |s| s.id)?;
        let stored = state.stored_item(item_id)?;
        stored.item.sprint_id = Some(parent_id);
        Ok(StoreState::item_response(&stored.item))
    }

    async fn unassign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::Sprint, Operation::Unassign, Some(parent_id))
            .await?;
        let mut state = self.state.borrow_mut();
        let stored = state.stored_item(item_id)?;
        if stored.item.sprint_id == Some(parent_id) {
            stored.item.sprint_id = None;
        }
        Ok(StoreState::item_response(&stored.item))
    }

    async fn items(&self, parent_id: EntityId) -> GatewayResult<Vec<BacklogItem>> {
        self.enter(EntityKind::Sprint, Operation::Items, Some(parent_id))
            .await?;
        Ok(self
            .state
            .borrow()
            .items
            .iter()
            .filter(|stored| stored.item.sprint_id == Some(parent_id))
            .map(|stored| StoreState::item_response(&stored.item))
            .collect())
    }
}

// Releases

#[async_trait(?Send)]
impl Gateway<Release> for RemoteStore {
    async fn list(&self, parent_id: ProjectId) -> GatewayResult<Vec<Release>> {
        self.enter(EntityKind::Release, Operation::List, Some(parent_id))
            .await?;
        Ok(self
            .state
            .borrow()
            .releases
            .iter()
            .filter(|r| r.project_id == parent_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: EntityId) -> GatewayResult<Release> {
        self.enter(EntityKind::Release, Operation::Get, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.releases, id, EntityKind::Release, |r| r.id).map(|r| r.clone())
    }

    async fn create(&self, draft: &ReleaseDraft) -> GatewayResult<Release> {
        self.enter(EntityKind::Release, Operation::Create, None)
            .await?;
        let mut state = self.state.borrow_mut();
        let taken = state.releases.iter().any(|r| {
            r.project_id == draft.project_id && r.version_number == draft.version_number
        });
        if taken {
            return Err(GatewayError::validation(
                "A release with this version number already exists",
            ));
        }
        let release = Release::from_draft(state.allocate_id(), draft);
        state.releases.push(release.clone());
        Ok(release)
    }

    async fn update(&self, id: EntityId, draft: &ReleaseDraft) -> GatewayResult<Release> {
        self.enter(EntityKind::Release, Operation::Update, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let release = find(&mut state.releases, id, EntityKind::Release, |r| r.id)?;
        release.apply_draft(draft);
        Ok(release.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.enter(EntityKind::Release, Operation::Delete, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.releases, id, EntityKind::Release, |r| r.id)?;
        state.releases.retain(|r| r.id != id);
        for stored in state.items.iter_mut() {
            if stored.item.release_id == Some(id) {
                stored.item.release_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl StatusGateway<Release> for RemoteStore {
    async fn update_status(&self, id: EntityId, status: ReleaseStatus) -> GatewayResult<Release> {
        self.enter(EntityKind::Release, Operation::UpdateStatus, Some(id))
            .await?;
        let mut state = self.state.borrow_mut();
        let release = find(&mut state.releases, id, EntityKind::Release, |r| r.id)?;
        release.status = status;
        if status == ReleaseStatus::Released && release.release_date.is_none() {
            release.release_date = Some(chrono::Local::now().date_naive());
        }
        Ok(release.clone())
    }
}

#[async_trait(?Send)]
impl AssignmentGateway<Release> for RemoteStore {
    async fn assign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::Release, Operation::Assign, Some(parent_id))
            .await?;
        let mut state = self.state.borrow_mut();
        find(&mut state.releases, parent_id, EntityKind::Release, |r| r.id)?;
        let stored = state.stored_item(item_id)?;
        stored.item.release_id = Some(parent_id);
        Ok(StoreState::item_response(&stored.item))
    }

    async fn unassign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        self.enter(EntityKind::Release, Operation::Unassign, Some(parent_id))
            .await?;
        let mut state = self.state.borrow_mut();
        let stored = state.stored_item(item_id)?;
        if stored.item.release_id == Some(parent_id) {
            stored.item.release_id = None;
        }
        Ok(StoreState::item_response(&stored.item))
    }

    async fn items(&self, parent_id: EntityId) -> GatewayResult<Vec<BacklogItem>> {
        self.enter(EntityKind::Release, Operation::Items, Some(parent_id))
            .await?;
        Ok(self
            .state
            .borrow()
            .items
            .iter()
            .filter(|stored| stored.item.release_id == Some(parent_id))
            .map(|stored| StoreState::item_response(&stored.item))
            .collect())
    }
}
