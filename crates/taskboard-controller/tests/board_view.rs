mod common;

use common::*;
use taskboard_controller::NotificationKind;
use taskboard_core::{BoardError, GatewayError};
use taskboard_domain::{
    BacklogItem, BacklogItemDraft, BoardFilter, BoardModel, EntityKind, ItemFilter, ReleaseFilter,
    Release, ReleaseStatus, SprintFilter, SprintStatus, SubTask, SubTaskDraft,
};
use taskboard_gateway::{AssignmentGateway, Operation, StatusGateway};
use tokio::task::LocalSet;

#[tokio::test]
async fn test_open_loads_board_and_sub_tasks() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let keys: Vec<String> = view.columns().into_iter().map(|c| c.status_key).collect();
            assert_eq!(keys, ["TODO", "IN_PROGRESS", "DONE", "REVIEW"]);
            view.read(|model| {
                assert_eq!(model.project().name, "Apollo");
                assert_eq!(model.items().len(), 4);
                assert_eq!(model.sprints().len(), 1);
                assert_eq!(model.releases().len(), 1);
                assert_eq!(model.sub_tasks(10).map(<[SubTask]>::len), Some(2));
                assert!(model.items().iter().all(|i| i.sub_tasks_loaded()));
                assert!(model.unplaced_items().is_empty());
            });
        })
        .await;
}

#[tokio::test]
async fn test_open_fails_when_project_is_missing() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            store.fail_next(
                EntityKind::Project,
                Operation::Get,
                GatewayError::NotFound(None),
            );
            let result = taskboard_controller::BoardView::open(
                PROJECT,
                taskboard_gateway::GatewaySet::in_memory(store.clone()),
                &taskboard_core::AppConfig::default(),
            )
            .await;
            assert!(matches!(
                result,
                Err(BoardError::Gateway(GatewayError::NotFound(None)))
            ));
        })
        .await;
}

#[tokio::test]
async fn test_columns_partition_items_under_every_filter() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let filters = [
                BoardFilter::default(),
                BoardFilter::sprint(SprintFilter::Sprint(SPRINT)),
                BoardFilter::sprint(SprintFilter::Unscheduled),
                BoardFilter::release(ReleaseFilter::Release(RELEASE)),
                BoardFilter::release(ReleaseFilter::Unreleased),
            ];

            for filter in filters {
                view.set_filter(filter);
                let mut shown: Vec<u64> = view
                    .columns()
                    .iter()
                    .flat_map(|c| ids(&view.items_by_column(&c.status_key)))
                    .collect();
                let total = shown.len();
                shown.sort_unstable();
                shown.dedup();
                assert_eq!(shown.len(), total, "an item appeared twice under {:?}", filter);

                let mut expected: Vec<u64> = view.read(|m| {
                    m.items()
                        .iter()
                        .filter(|i| filter.matches(i))
                        .map(|i| i.id)
                        .collect()
                });
                expected.sort_unstable();
                assert_eq!(shown, expected, "grouping under {:?}", filter);
            }
        })
        .await;
}

#[tokio::test]
async fn test_moving_to_current_status_is_a_no_op() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();

            let pending = view.engine().move_item(10, "TODO");
            assert!(pending.is_ready());
            pending.await.unwrap();
            settle().await;

            assert_eq!(store.call_count(), 0);
            assert_eq!(view.snapshot(), before);
            assert!(view.notifications().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_failed_move_restores_board_and_reports_once() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::UpdateStatus,
                GatewayError::Server(None),
            );

            let pending = view.engine().move_item(10, "DONE");
            assert_eq!(ids(&view.items_by_column("DONE")), [10, 13]);

            assert!(pending.await.is_err());
            assert_eq!(view.snapshot(), before);
            let shown = view.notifications().current().unwrap();
            assert_eq!(shown.kind, NotificationKind::Error);
            assert_eq!(shown.message, "Failed to move backlog item. Please try again.");
        })
        .await;
}

#[tokio::test]
async fn test_move_to_unknown_status_is_rejected_locally() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();

            let result = view.engine().move_item(10, "ARCHIVED").await;
            assert!(matches!(result, Err(BoardError::Validation(_))));
            assert_eq!(store.call_count(), 0);
            assert_eq!(view.snapshot(), before);
        })
        .await;
}

#[tokio::test]
async fn test_deleting_item_removes_its_sub_tasks() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            assert_eq!(view.read(BoardModel::sub_task_count), 2);

            let pending = view.engine().delete_item(10);
            view.read(|m| {
                assert!(m.item(10).is_none());
                assert!(m.find_sub_task(100).is_none());
                assert_eq!(m.sub_task_count(), 0);
            });

            pending.await.unwrap();
            assert!(store.stored_item(10).is_none());
            assert!(store.stored_sub_tasks(10).is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_failed_delete_puts_item_back_in_place() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::Delete,
                GatewayError::Forbidden(Some("Only the owner can delete".into())),
            );

            assert!(view.engine().delete_item(10).await.is_err());
            assert_eq!(view.snapshot(), before);
            assert_eq!(
                view.notifications().current().unwrap().message,
                "Only the owner can delete"
            );
        })
        .await;
}

#[tokio::test]
async fn test_default_column_is_never_deleted() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let result = view.engine().delete_column(1).await;
            assert!(result.is_err());
            assert_eq!(store.call_count(), 0);
            assert!(view.read(|m| m.column(1).is_some()));
        })
        .await;
}

#[tokio::test]
async fn test_store_refuses_non_empty_column_verbatim() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let pending = view.engine().delete_column(2);
            assert!(view.read(|m| m.column(2).is_some()));

            assert!(pending.await.is_err());
            let columns: Vec<u64> = view.columns().iter().map(|c| c.id).collect();
            assert_eq!(columns, [1, 2, 3, 4]);
            assert_eq!(
                view.notifications().current().unwrap().message,
                "Move the backlog items out of this column before deleting it"
            );
        })
        .await;
}

#[tokio::test]
async fn test_items_stay_grouped_while_column_delete_is_in_flight() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let grouped = |view: &taskboard_controller::BoardView| -> usize {
                view.columns()
                    .iter()
                    .map(|c| view.items_by_column(&c.status_key).len())
                    .sum()
            };

            store.pause();
            let pending = view.engine().delete_column(2);
            settle().await;
            assert_eq!(grouped(&view), 4);
            assert!(view.read(|m| m.unplaced_items().is_empty()));
            assert_eq!(ids(&view.items_by_column("IN_PROGRESS")), [12]);

            store.resume();
            assert!(pending.await.is_err());
            assert_eq!(grouped(&view), 4);
        })
        .await;
}

#[tokio::test]
async fn test_occupied_column_leaves_once_store_agrees() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            // Someone else emptied the column; this board has not heard yet.
            StatusGateway::<BacklogItem>::update_status(store.as_ref(), 12, "DONE".into())
                .await
                .unwrap();

            let pending = view.engine().delete_column(2);
            assert!(view.read(|m| m.column(2).is_some()));

            pending.await.unwrap();
            assert!(view.read(|m| m.column(2).is_none()));
            assert!(store.stored_column(2).is_none());
        })
        .await;
}

#[tokio::test]
async fn test_empty_column_is_deleted() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            view.engine().delete_column(4).await.unwrap();
            assert!(store.stored_column(4).is_none());
            assert_eq!(view.columns().len(), 3);
        })
        .await;
}

#[tokio::test]
async fn test_duplicate_column_status_is_rejected_locally() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let draft = taskboard_domain::ColumnDraft {
                project_id: PROJECT,
                name: "Doing".into(),
                status_key: "in progress".into(),
                order: 9,
            };

            assert!(view.engine().create_column(draft).await.is_err());
            assert_eq!(store.call_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_created_item_appears_with_store_id() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let pending = view
                .engine()
                .create_item(BacklogItemDraft::new(PROJECT, "Logout", "TODO"));
            let todo = view.items_by_column("TODO");
            assert_eq!(todo.len(), 3);
            assert!(BoardModel::is_provisional(todo[2].id));
            assert_eq!(todo[2].title, "Logout");

            let created = pending.await.unwrap();
            assert_eq!(created.id, 42);
            assert_eq!(ids(&view.items_by_column("TODO")), [10, 11, 42]);
            let shown = view.notifications().current().unwrap();
            assert_eq!(shown.kind, NotificationKind::Success);
        })
        .await;
}

#[tokio::test]
async fn test_failed_create_leaves_no_trace() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::Create,
                GatewayError::Network(None),
            );

            let result = view
                .engine()
                .create_item(BacklogItemDraft::new(PROJECT, "Logout", "TODO"))
                .await;
            assert!(result.is_err());
            assert_eq!(view.snapshot(), before);
        })
        .await;
}

#[tokio::test]
async fn test_concurrent_operations_settle_independently() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            store.fail_next(
                EntityKind::BacklogItem,
                Operation::UpdateStatus,
                GatewayError::Server(None),
            );

            store.pause();
            let mut draft = view.read(|m| m.item(11).unwrap().to_draft(PROJECT));
            draft.title = "Sign up".into();
            let edit = view.engine().edit_item(11, draft);
            let moved = view.engine().move_item(13, "TODO");
            settle().await;
            store.resume();

            let (edit, moved) = tokio::join!(edit, moved);
            assert!(edit.is_ok());
            assert!(moved.is_err());
            view.read(|m| {
                assert_eq!(m.item(11).unwrap().title, "Sign up");
                assert_eq!(m.item(13).unwrap().status, "DONE");
            });
        })
        .await;
}

#[tokio::test]
async fn test_late_response_after_close_is_ignored() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            store.pause();
            let pending = view.engine().delete_item(11);
            settle().await;
            drop(view);
            store.resume();

            assert!(matches!(pending.await, Err(BoardError::ViewClosed)));
        })
        .await;
}

#[tokio::test]
async fn test_refresh_picks_up_new_sub_tasks() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            store.seed_sub_task(SubTask::from_draft(102, &SubTaskDraft::new(10, "Styling")));

            // Loaded once; a plain load does not refetch.
            view.engine().load_sub_tasks(10).await.unwrap();
            assert_eq!(store.count(EntityKind::SubTask, Operation::List), 0);

            view.engine().refresh_sub_tasks(10).await.unwrap();
            assert_eq!(view.read(|m| m.sub_tasks(10).map(<[SubTask]>::len)), Some(3));
        })
        .await;
}

#[tokio::test]
async fn test_sub_task_lifecycle() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let created = view
                .engine()
                .create_sub_task(SubTaskDraft::new(11, "Email check"))
                .await
                .unwrap();
            assert_eq!(created.id, 42);
            assert_eq!(view.read(|m| m.sub_tasks(11).map(<[SubTask]>::len)), Some(1));

            let mut draft = SubTaskDraft::new(11, "Email verification");
            draft.assignee = Some("bo".into());
            view.engine().edit_sub_task(42, draft).await.unwrap();
            view.read(|m| {
                let task = m.find_sub_task(42).unwrap();
                assert_eq!(task.title, "Email verification");
                assert_eq!(task.item_id, 11);
            });

            view.engine().delete_sub_task(42).await.unwrap();
            assert!(view.read(|m| m.find_sub_task(42).is_none()));
            assert!(store.stored_sub_tasks(11).is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_deleting_sprint_unschedules_its_items() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let pending = view.engine().delete_sprint(SPRINT);
            assert_eq!(ids(&view.sprint_backlog()), [10, 11, 12, 13]);
            pending.await.unwrap();
            assert!(store.stored_item(12).unwrap().sprint_id.is_none());
        })
        .await;
}

#[tokio::test]
async fn test_sprint_cannot_return_to_planning() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            let result = view
                .engine()
                .change_sprint_status(SPRINT, SprintStatus::Planned)
                .await;
            assert!(result.is_err());
            assert_eq!(store.call_count(), 0);

            let sprint = view
                .engine()
                .change_sprint_status(SPRINT, SprintStatus::Completed)
                .await
                .unwrap();
            assert_eq!(sprint.status, SprintStatus::Completed);
            assert!(view.read(|m| m.active_sprint().is_none()));
        })
        .await;
}

#[tokio::test]
async fn test_release_assignment_round_trip() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            assert_eq!(ids(&view.available_items()), [10, 11]);

            view.engine().assign_to_release(RELEASE, 11).await.unwrap();
            assert_eq!(ids(&view.release_items(RELEASE)), [11, 12, 13]);
            assert_eq!(ids(&view.available_items()), [10]);

            view.engine().remove_from_release(11).await.unwrap();
            assert_eq!(ids(&view.available_items()), [10, 11]);
            assert_eq!(store.count(EntityKind::Release, Operation::Unassign), 1);
        })
        .await;
}

#[tokio::test]
async fn test_failed_sprint_assignment_is_undone() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            store.fail_next(
                EntityKind::Sprint,
                Operation::Assign,
                GatewayError::NotFound(None),
            );

            let pending = view.engine().assign_to_sprint(SPRINT, 11);
            assert_eq!(
                ids(&view.items_by_sprint(SprintFilter::Sprint(SPRINT))),
                [10, 11, 12]
            );
            assert!(pending.await.is_err());
            assert_eq!(ids(&view.items_by_sprint(SprintFilter::Sprint(SPRINT))), [10, 12]);
            assert_eq!(
                view.notifications().current().unwrap().message,
                "This sprint no longer exists"
            );
        })
        .await;
}

#[tokio::test]
async fn test_shipping_a_release_records_its_date() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;

            view.engine()
                .change_release_status(RELEASE, ReleaseStatus::Released)
                .await
                .unwrap();
            view.read(|m| {
                let release = m.release(RELEASE).unwrap();
                assert!(release.is_shipped());
                assert!(release.release_date.is_some());
                assert_eq!(release.project_id, PROJECT);
            });
        })
        .await;
}

#[tokio::test]
async fn test_expanding_fetches_sub_tasks_once() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            view.read(|m| assert!(!m.needs_sub_tasks(11)));

            assert_eq!(view.toggle_expanded(11), Some(true));
            assert_eq!(view.toggle_expanded(11), Some(false));
            settle().await;
            assert_eq!(store.count(EntityKind::SubTask, Operation::List), 0);
        })
        .await;
}

#[tokio::test]
async fn test_every_change_bumps_the_revision() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let mut revisions = view.subscribe();
            revisions.borrow_and_update();

            view.engine().remove_from_sprint(10).await.unwrap();
            assert!(revisions.has_changed().unwrap());
        })
        .await;
}

#[tokio::test]
async fn test_default_column_keeps_key_and_position_on_edit() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let draft = taskboard_domain::ColumnDraft {
                project_id: PROJECT,
                name: "Backlog".into(),
                status_key: "BACKLOG".into(),
                order: 10,
            };

            let column = view.engine().edit_column(1, draft).await.unwrap();
            assert_eq!(column.name, "Backlog");
            assert_eq!(column.status_key, "TODO");
            assert_eq!(column.order, 0);
            assert_eq!(view.columns()[0].id, 1);
            assert_eq!(ids(&view.items_by_column("TODO")), [10, 11]);
        })
        .await;
}

#[tokio::test]
async fn test_column_edit_reorders_board() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let draft = taskboard_domain::ColumnDraft {
                project_id: PROJECT,
                name: "Review".into(),
                status_key: "REVIEW".into(),
                order: -1,
            };

            let pending = view.engine().edit_column(4, draft);
            assert_eq!(view.columns()[0].id, 4);
            pending.await.unwrap();
            assert_eq!(store.stored_column(4).unwrap().order, -1);
        })
        .await;
}

#[tokio::test]
async fn test_release_refresh_follows_store_membership() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            AssignmentGateway::<Release>::assign(store.as_ref(), RELEASE, 11)
                .await
                .unwrap();
            AssignmentGateway::<Release>::unassign(store.as_ref(), RELEASE, 12)
                .await
                .unwrap();
            store.clear_calls();

            view.engine().refresh_release_items(RELEASE).await.unwrap();

            assert_eq!(ids(&view.release_items(RELEASE)), [11, 13]);
            assert_eq!(ids(&view.available_items()), [10, 12]);
            assert_eq!(store.count(EntityKind::Release, Operation::Items), 1);
            assert!(view.notifications().is_empty());
            assert!(view.read(|m| m.item(13).unwrap().sub_tasks_loaded()));
        })
        .await;
}

#[tokio::test]
async fn test_sprint_refresh_failure_changes_nothing() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            let before = view.snapshot();
            store.fail_next(
                EntityKind::Sprint,
                Operation::Items,
                GatewayError::Server(None),
            );

            assert!(view.engine().refresh_sprint_items(SPRINT).await.is_err());
            assert_eq!(view.snapshot(), before);
            assert_eq!(
                view.notifications().current().unwrap().message,
                "Failed to load sprint items. Please try again."
            );
        })
        .await;
}

#[tokio::test]
async fn test_sprint_refresh_picks_up_remote_planning() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let view = open_board(&store).await;
            AssignmentGateway::<taskboard_domain::Sprint>::assign(store.as_ref(), SPRINT, 13)
                .await
                .unwrap();

            view.engine().refresh_sprint_items(SPRINT).await.unwrap();
            assert_eq!(
                ids(&view.items_by_sprint(SprintFilter::Sprint(SPRINT))),
                [10, 12, 13]
            );
        })
        .await;
}
