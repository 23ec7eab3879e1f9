pub mod backlog_item;
pub mod board;
pub mod column;
pub mod entity;
pub mod filter;
pub mod project;
pub mod reference;
pub mod release;
pub mod sprint;
pub mod sub_task;
pub mod user;

pub use backlog_item::{BacklogItem, BacklogItemDraft, ItemId, Priority};
pub use board::BoardModel;
pub use column::{normalize_status_key, Column, ColumnDraft, ColumnId};
pub use entity::{EntityId, EntityKind, RemoteEntity, Tracked, Validate};
pub use filter::{BoardFilter, ItemFilter, ReleaseFilter, SprintFilter, StatusFilter};
pub use project::{Project, ProjectDraft, ProjectId};
pub use release::{Release, ReleaseDraft, ReleaseId, ReleaseStatus};
pub use sprint::{Sprint, SprintDraft, SprintId, SprintStatus};
pub use sub_task::{SubTask, SubTaskDraft, SubTaskId, SubTaskStatus};
pub use user::UserRef;
