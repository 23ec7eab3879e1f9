use futures::future::join_all;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use taskboard_core::{AppConfig, BoardResult};
use taskboard_domain::{
    BacklogItem, BoardFilter, BoardModel, Column, ColumnId, ItemId, ProjectId, ReleaseId,
    SprintFilter,
};
use taskboard_gateway::GatewaySet;
use tokio::sync::watch;

use crate::drag::{DropOutcome, DropTarget, MoveCoordinator};
use crate::engine::ReconciliationEngine;
use crate::modal::ModalOrchestrator;
use crate::notification::{NotificationQueue, NotificationSink};
use crate::pending::Pending;

/// An open project board: the model plus everything that changes it.
///
/// Owns the only strong reference to the model. Dropping the view
/// discards the board; responses arriving afterwards are ignored.
pub struct BoardView {
    model: Rc<RefCell<BoardModel>>,
    engine: ReconciliationEngine,
    notifications: Rc<NotificationQueue>,
    modal: ModalOrchestrator,
    drag: MoveCoordinator,
    filter: Cell<BoardFilter>,
}

impl BoardView {
    /// Load a project board: project, columns, items, sprints and
    /// releases in that order, then every item's sub-tasks concurrently.
    ///
    /// Must be awaited inside a `LocalSet`.
    pub async fn open(
        project_id: ProjectId,
        gateways: GatewaySet,
        config: &AppConfig,
    ) -> BoardResult<Self> {
        tracing::info!("Opening board for project {}", project_id);
        let project = gateways.projects.get(project_id).await?;
        let columns = gateways.columns.list(project_id).await?;
        let items = gateways.items.list(project_id).await?;
        let sprints = gateways.sprints.list(project_id).await?;
        let releases = gateways.releases.list(project_id).await?;
        tracing::info!(
            "Loaded {} column(s), {} backlog item(s), {} sprint(s), {} release(s)",
            columns.len(),
            items.len(),
            sprints.len(),
            releases.len()
        );

        let model = Rc::new(RefCell::new(BoardModel::with_contents(
            project, columns, items, sprints, releases,
        )));
        let notifications = Rc::new(NotificationQueue::from_config(config));
        let sink: Rc<dyn NotificationSink> = notifications.clone();
        let engine = ReconciliationEngine::new(
            Rc::downgrade(&model),
            gateways,
            sink,
            config.request_timeout(),
        );

        let view = Self {
            modal: ModalOrchestrator::new(&engine),
            drag: MoveCoordinator::new(engine.clone()),
            model,
            engine,
            notifications,
            filter: Cell::new(BoardFilter::default()),
        };
        view.load_all_sub_tasks().await;
        Ok(view)
    }

    async fn load_all_sub_tasks(&self) {
        let item_ids: Vec<ItemId> = self.model.borrow().items().iter().map(|i| i.id).collect();
        let fetches: Vec<Pending<()>> = item_ids
            .into_iter()
            .map(|id| self.engine.load_sub_tasks(id))
            .collect();
        let failed = join_all(fetches)
            .await
            .into_iter()
            .filter(Result::is_err)
            .count();
        if failed > 0 {
            tracing::warn!("{} sub-task fetch(es) failed while opening the board", failed);
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn modal(&self) -> &ModalOrchestrator {
        &self.modal
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn drag(&self) -> &MoveCoordinator {
        &self.drag
    }

    /// Changes on every model update.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.engine.subscribe()
    }

    pub fn filter(&self) -> BoardFilter {
        self.filter.get()
    }

    pub fn set_filter(&self, filter: BoardFilter) {
        self.filter.set(filter);
        self.engine.touch();
    }

    /// Read the model directly.
    pub fn read<R>(&self, f: impl FnOnce(&BoardModel) -> R) -> R {
        f(&self.model.borrow())
    }

    /// A copy of the model, e.g. to compare before and after.
    pub fn snapshot(&self) -> BoardModel {
        self.model.borrow().clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.model.borrow().columns().to_vec()
    }

    /// Items of a column under the active filter, in board order.
    pub fn items_by_column(&self, status_key: &str) -> Vec<BacklogItem> {
        let filter = self.filter.get();
        cloned(self.model.borrow().items_by_column(status_key, &filter))
    }

    pub fn items_by_sprint(&self, filter: SprintFilter) -> Vec<BacklogItem> {
        cloned(self.model.borrow().items_by_sprint(filter))
    }

    pub fn available_items(&self) -> Vec<BacklogItem> {
        cloned(self.model.borrow().available_items())
    }

    pub fn release_items(&self, release_id: ReleaseId) -> Vec<BacklogItem> {
        cloned(self.model.borrow().release_items(release_id))
    }

    pub fn sprint_backlog(&self) -> Vec<BacklogItem> {
        cloned(self.model.borrow().sprint_backlog())
    }

    /// Expand or collapse an item. The first expand fetches its
    /// sub-tasks if they are not loaded yet.
    pub fn toggle_expanded(&self, item_id: ItemId) -> Option<bool> {
        let expanded = self.model.borrow_mut().toggle_expanded(item_id)?;
        self.engine.touch();
        if expanded {
            let _ = self.engine.load_sub_tasks(item_id);
        }
        Some(expanded)
    }

    pub fn begin_item_drag(&self, item_id: ItemId) -> bool {
        self.drag.begin_item(item_id, self.filter.get())
    }

    pub fn begin_column_drag(&self, column_id: ColumnId) -> bool {
        self.drag.begin_column(column_id)
    }

    pub fn drop_on(&self, target: DropTarget) -> DropOutcome {
        self.drag.drop_on(target)
    }

    pub fn cancel_drag(&self) -> DropOutcome {
        self.drag.cancel()
    }
}

fn cloned(items: Vec<&BacklogItem>) -> Vec<BacklogItem> {
    items.into_iter().cloned().collect()
}
