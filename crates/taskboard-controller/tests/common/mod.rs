#![allow(dead_code)]

use chrono::NaiveDate;
use std::rc::Rc;
use taskboard_controller::BoardView;
use taskboard_core::AppConfig;
use taskboard_domain::{
    BacklogItem, BacklogItemDraft, Column, ItemId, Project, Release, ReleaseDraft, Sprint,
    SprintStatus, SubTask, SubTaskDraft, UserRef,
};
use taskboard_gateway::{GatewaySet, RemoteStore};

pub const PROJECT: u64 = 1;
pub const SPRINT: u64 = 5;
pub const RELEASE: u64 = 7;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn column(id: u64, key: &str, order: i32, is_default: bool) -> Column {
    Column {
        id,
        name: key.replace('_', " ").to_lowercase(),
        status_key: key.to_string(),
        order,
        project_id: PROJECT,
        is_default,
    }
}

fn item(id: ItemId, title: &str, status: &str, sprint: Option<u64>, release: Option<u64>) -> BacklogItem {
    let mut item = BacklogItem::from_draft(id, &BacklogItemDraft::new(PROJECT, title, status));
    item.sprint_id = sprint;
    item.release_id = release;
    item.sub_tasks = None;
    item
}

/// Project 1 with four columns:
///
/// | column      | default | items             |
/// |-------------|---------|-------------------|
/// | TODO        | yes     | 10 (sprint), 11   |
/// | IN_PROGRESS | no      | 12 (sprint, 1.0)  |
/// | DONE        | yes     | 13 (1.0)          |
/// | REVIEW      | no      |                   |
///
/// Item 10 has sub-tasks 100 and 101. The store hands out id 42 next.
pub fn seeded_store() -> Rc<RemoteStore> {
    let store = RemoteStore::new();
    store.seed_project(Project {
        id: PROJECT,
        name: "Apollo".into(),
        description: "Launch tracker".into(),
        owner: UserRef::new("ana"),
        members: [UserRef::new("bo")].into_iter().collect(),
    });
    store.seed_column(column(1, "TODO", 0, true));
    store.seed_column(column(2, "IN_PROGRESS", 1, false));
    store.seed_column(column(3, "DONE", 2, true));
    store.seed_column(column(4, "REVIEW", 3, false));

    store.seed_item(PROJECT, item(10, "Login", "TODO", Some(SPRINT), None));
    store.seed_item(PROJECT, item(11, "Signup", "TODO", None, None));
    store.seed_item(PROJECT, item(12, "Search", "IN_PROGRESS", Some(SPRINT), Some(RELEASE)));
    store.seed_item(PROJECT, item(13, "Billing", "DONE", None, Some(RELEASE)));
    store.seed_sub_task(SubTask::from_draft(100, &SubTaskDraft::new(10, "Form")));
    store.seed_sub_task(SubTask::from_draft(101, &SubTaskDraft::new(10, "Validation")));

    store.seed_sprint(Sprint {
        id: SPRINT,
        name: "Sprint 1".into(),
        start_date: date(2024, 3, 1),
        end_date: date(2024, 3, 15),
        status: SprintStatus::Active,
        project_id: PROJECT,
    });
    store.seed_release(Release::from_draft(
        RELEASE,
        &ReleaseDraft {
            project_id: PROJECT,
            title: "First cut".into(),
            description: String::new(),
            version_number: "1.0".into(),
        },
    ));
    store.set_next_id(42);
    Rc::new(store)
}

/// Open the seeded board and forget the calls made while loading.
pub async fn open_board(store: &Rc<RemoteStore>) -> BoardView {
    let view = BoardView::open(
        PROJECT,
        GatewaySet::in_memory(store.clone()),
        &AppConfig::default(),
    )
    .await
    .expect("board should open");
    store.clear_calls();
    view
}

pub fn ids(items: &[BacklogItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}
