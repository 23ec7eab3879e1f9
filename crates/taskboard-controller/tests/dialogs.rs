mod common;

use common::*;
use taskboard_controller::{DeleteTarget, DialogKind, NotificationKind, Submission};
use taskboard_core::GatewayError;
use taskboard_domain::{BacklogItemDraft, EntityKind, SprintDraft, SprintStatus};
use taskboard_gateway::Operation;
use tokio::task::LocalSet;

#[tokio::test]
async fn test_only_one_dialog_at_a_time() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();

            assert!(modal.open(DialogKind::EditItem(10)));
            assert!(!modal.open(DialogKind::CreateColumn));
            assert_eq!(modal.current(), Some(DialogKind::EditItem(10)));

            modal.close();
            assert!(modal.open(DialogKind::CreateColumn));
        })
        .await;
}

#[tokio::test]
async fn test_invalid_input_never_reaches_store() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();
            modal.open(DialogKind::CreateItem);

            let result = modal
                .submit(Submission::Item(BacklogItemDraft::new(PROJECT, "  ", "TODO")))
                .await;

            assert!(result.is_err());
            assert_eq!(modal.error().as_deref(), Some("Title is required"));
            assert!(modal.is_open());
            assert_eq!(store.call_count(), 0);
            assert!(view.notifications().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_store_rejection_stays_in_dialog() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();
            let modal = view.modal();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::Update,
                GatewayError::validation("This title is already used"),
            );

            modal.open(DialogKind::EditItem(11));
            let mut draft = view.read(|m| m.item(11).unwrap().to_draft(PROJECT));
            draft.title = "Login".into();
            let pending = modal.submit(Submission::Item(draft));
            assert!(modal.is_submitting());

            assert!(pending.await.is_err());
            assert_eq!(modal.error().as_deref(), Some("This title is already used"));
            assert!(!modal.is_submitting());
            assert!(view.notifications().is_empty());
            assert_eq!(view.snapshot(), before);
        })
        .await;
}

#[tokio::test]
async fn test_success_closes_dialog_and_notifies() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();
            modal.open(DialogKind::CreateSprint);

            let draft = SprintDraft {
                project_id: PROJECT,
                name: "Sprint 2".into(),
                start_date: date(2024, 4, 1),
                end_date: date(2024, 4, 14),
                status: SprintStatus::Planned,
            };
            modal.submit(Submission::Sprint(draft)).await.unwrap();

            assert!(!modal.is_open());
            assert!(view.read(|m| m.sprint(42).is_some()));
            let shown = view.notifications().current().unwrap();
            assert_eq!(shown.kind, NotificationKind::Success);
            assert_eq!(shown.message, "Sprint created");
        })
        .await;
}

#[tokio::test]
async fn test_authorization_failure_is_notified() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::Update,
                GatewayError::Unauthorized(None),
            );

            modal.open(DialogKind::EditItem(11));
            let draft = view.read(|m| m.item(11).unwrap().to_draft(PROJECT));
            assert!(modal.submit(Submission::Item(draft)).await.is_err());

            assert!(modal.is_open());
            assert!(modal.error().is_none());
            assert_eq!(
                view.notifications().current().unwrap().message,
                "Failed to update backlog item: you are not allowed to do this"
            );
        })
        .await;
}

#[tokio::test]
async fn test_late_failure_does_not_reach_next_dialog() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::Update,
                GatewayError::Server(None),
            );

            store.pause();
            modal.open(DialogKind::EditItem(11));
            let draft = view.read(|m| m.item(11).unwrap().to_draft(PROJECT));
            let pending = modal.submit(Submission::Item(draft));
            modal.close();
            assert!(modal.open(DialogKind::ConfirmDelete(DeleteTarget::Item(13))));
            settle().await;
            store.resume();

            assert!(pending.await.is_err());
            assert_eq!(
                modal.current(),
                Some(DialogKind::ConfirmDelete(DeleteTarget::Item(13)))
            );
            assert!(modal.error().is_none());
            assert!(!modal.is_submitting());
        })
        .await;
}

#[tokio::test]
async fn test_confirmed_delete_removes_sub_task() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();

            modal.open(DialogKind::ConfirmDelete(DeleteTarget::SubTask(100)));
            modal.submit(Submission::ConfirmDelete).await.unwrap();

            assert!(!modal.is_open());
            assert!(view.read(|m| m.find_sub_task(100).is_none()));
            assert_eq!(store.stored_sub_tasks(10).len(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_submit_without_dialog_is_refused() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            assert!(view.modal().submit(Submission::ConfirmDelete).await.is_err());
            assert_eq!(store.call_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_project_edit_through_dialog() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();

            modal.open(DialogKind::EditProject);
            let draft = taskboard_domain::ProjectDraft {
                name: "Apollo 11".into(),
                description: "Landing tracker".into(),
            };
            let pending = modal.submit(Submission::Project(draft));
            assert_eq!(view.read(|m| m.project().name.clone()), "Apollo 11");

            pending.await.unwrap();
            assert!(!modal.is_open());
            assert_eq!(store.count(EntityKind::Project, Operation::Update), 1);
            view.read(|m| {
                assert_eq!(m.project().description, "Landing tracker");
                assert_eq!(m.project().owner.username, "ana");
            });
        })
        .await;
}

#[tokio::test]
async fn test_wrong_submission_for_dialog_is_refused() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let modal = view.modal();

            modal.open(DialogKind::CreateColumn);
            let result = modal.submit(Submission::Assign(10)).await;
            assert!(result.is_err());
            assert!(modal.is_open());
            assert_eq!(store.call_count(), 0);
        })
        .await;
}
