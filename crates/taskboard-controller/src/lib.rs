//! Keeps an in-memory board consistent with the remote store.
//!
//! Everything here runs on one thread: operations must be issued from
//! inside a [`tokio::task::LocalSet`], because their remote halves are
//! spawned with `spawn_local`.

pub mod drag;
mod effect;
pub mod engine;
pub mod messages;
pub mod modal;
pub mod notification;
pub mod pending;
pub mod view;

pub use drag::{DragSource, DropOutcome, DropTarget, MoveCoordinator};
pub use engine::ReconciliationEngine;
pub use messages::Action;
pub use modal::{AssignmentTarget, DeleteTarget, DialogKind, ModalOrchestrator, Submission};
pub use notification::{Notification, NotificationKind, NotificationQueue, NotificationSink};
pub use pending::Pending;
pub use view::BoardView;
