//! Drag-and-drop gestures over the board.
//!
//! A drop inside the container it started from is a local reorder. A drop
//! onto another column becomes a status change through the engine; if the
//! store refuses it, the item goes back to where it was picked up.

use std::cell::RefCell;
use taskboard_core::BoardError;
use taskboard_domain::{BacklogItem, BoardFilter, BoardModel, ColumnId, ItemId};

use crate::engine::ReconciliationEngine;
use crate::pending::Pending;

/// Where a drag started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    Item {
        item_id: ItemId,
        status_key: String,
        index: usize,
        filter: BoardFilter,
    },
    /// A column header; the column is being reordered.
    Column { column_id: ColumnId, index: usize },
}

/// Where the gesture layer reports the drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Position `index` inside the column with `status_key`.
    Column { status_key: String, index: usize },
    /// Position `index` in the strip of column headers.
    ColumnStrip { index: usize },
    Outside,
}

pub enum DropOutcome {
    /// Local reorder; nothing was sent.
    Reordered,
    /// Status change in flight. Resolves after the store answers and, on
    /// failure, after the item is back in place.
    Moved(Pending<BacklogItem>),
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSource),
}

pub struct MoveCoordinator {
    engine: ReconciliationEngine,
    state: RefCell<DragState>,
}

impl MoveCoordinator {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self {
            engine,
            state: RefCell::new(DragState::Idle),
        }
    }

    pub fn is_dragging(&self) -> bool {
        *self.state.borrow() != DragState::Idle
    }

    pub fn source(&self) -> Option<DragSource> {
        match &*self.state.borrow() {
            DragState::Dragging(source) => Some(source.clone()),
            DragState::Idle => None,
        }
    }

    /// The column whose header is being dragged.
    pub fn reordering_column(&self) -> Option<ColumnId> {
        match &*self.state.borrow() {
            DragState::Dragging(DragSource::Column { column_id, .. }) => Some(*column_id),
            _ => None,
        }
    }

    /// Pick up an item as it is shown under `filter`. Items the store has
    /// not confirmed yet cannot be dragged.
    pub fn begin_item(&self, item_id: ItemId, filter: BoardFilter) -> bool {
        if self.is_dragging() || BoardModel::is_provisional(item_id) {
            return false;
        }
        let Some(model) = self.engine.model() else {
            return false;
        };
        let model = model.borrow();
        let Some(item) = model.item(item_id) else {
            return false;
        };
        let Some(index) = model.position_in_group(item_id, &filter) else {
            return false;
        };

        tracing::debug!("Dragging backlog item {} from {}[{}]", item_id, item.status, index);
        *self.state.borrow_mut() = DragState::Dragging(DragSource::Item {
            item_id,
            status_key: item.status.clone(),
            index,
            filter,
        });
        true
    }

    pub fn begin_column(&self, column_id: ColumnId) -> bool {
        if self.is_dragging() || BoardModel::is_provisional(column_id) {
            return false;
        }
        let Some(model) = self.engine.model() else {
            return false;
        };
        let index = model.borrow().column_index(column_id);
        let Some(index) = index else {
            return false;
        };

        tracing::debug!("Dragging column {} from position {}", column_id, index);
        *self.state.borrow_mut() = DragState::Dragging(DragSource::Column { column_id, index });
        true
    }

    pub fn cancel(&self) -> DropOutcome {
        *self.state.borrow_mut() = DragState::Idle;
        DropOutcome::Cancelled
    }

    pub fn drop_on(&self, target: DropTarget) -> DropOutcome {
        let state = std::mem::take(&mut *self.state.borrow_mut());
        let DragState::Dragging(source) = state else {
            return DropOutcome::Cancelled;
        };

        match (source, target) {
            (
                DragSource::Item {
                    item_id,
                    status_key,
                    index,
                    filter,
                },
                DropTarget::Column {
                    status_key: target_key,
                    index: target_index,
                },
            ) => {
                if target_key == status_key {
                    self.reorder_item(&status_key, filter, index, target_index)
                } else {
                    self.move_item(item_id, status_key, filter, target_key, target_index)
                }
            }
            (DragSource::Column { index, .. }, DropTarget::ColumnStrip { index: target }) => {
                self.reorder_column(index, target)
            }
            _ => DropOutcome::Cancelled,
        }
    }

    fn reorder_item(
        &self,
        status_key: &str,
        filter: BoardFilter,
        from: usize,
        to: usize,
    ) -> DropOutcome {
        let Some(model) = self.engine.model() else {
            return DropOutcome::Cancelled;
        };
        let moved = model
            .borrow_mut()
            .reorder_in_group(status_key, &filter, from, to);
        if !moved {
            return DropOutcome::Cancelled;
        }
        self.engine.touch();
        DropOutcome::Reordered
    }

    fn reorder_column(&self, from: usize, to: usize) -> DropOutcome {
        let Some(model) = self.engine.model() else {
            return DropOutcome::Cancelled;
        };
        if !model.borrow_mut().move_column(from, to) {
            return DropOutcome::Cancelled;
        }
        self.engine.touch();
        DropOutcome::Reordered
    }

    fn move_item(
        &self,
        item_id: ItemId,
        origin_key: String,
        filter: BoardFilter,
        target_key: String,
        target_index: usize,
    ) -> DropOutcome {
        let pending = self.engine.move_item(item_id, &target_key);
        if pending.is_ready() {
            return DropOutcome::Moved(pending);
        }

        let Some(model) = self.engine.model() else {
            return DropOutcome::Moved(pending);
        };
        let order = {
            let mut model = model.borrow_mut();
            let order = model.item_order();
            model.place_in_group(item_id, &filter, target_index);
            order
        };
        self.engine.touch();

        let engine = self.engine.clone();
        DropOutcome::Moved(Pending::spawn(async move {
            let result = pending.await;
            if let Err(error) = &result {
                if !matches!(error, BoardError::ViewClosed) {
                    restore_origin(&engine, item_id, &origin_key, &order);
                }
            }
            result
        }))
    }
}

/// Undo the drop placement of a rejected item, after checking the engine
/// already restored its status. Every item the placement shifted goes
/// back to its slot, not only the dragged one.
fn restore_origin(
    engine: &ReconciliationEngine,
    item_id: ItemId,
    origin_key: &str,
    order: &[ItemId],
) {
    let Some(model) = engine.model() else {
        return;
    };
    let mut model = model.borrow_mut();
    match model.item(item_id).map(|item| item.status.clone()) {
        Some(status) if status == origin_key => {
            model.restore_item_order(order);
        }
        Some(status) => {
            tracing::warn!(
                "Backlog item {} is in {} after a failed move, expected {}",
                item_id,
                status,
                origin_key
            );
            return;
        }
        None => return,
    }
    drop(model);
    engine.touch();
}
