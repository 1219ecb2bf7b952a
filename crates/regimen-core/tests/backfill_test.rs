//! Integration tests for rest-day backfill against PostgreSQL.
//!
//! Each test creates an isolated temporary database via
//! `regimen_test_utils::create_test_db`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use regimen_core::progress::backfill::plan_backfill;
use regimen_core::progress::service::{apply_backfill, reconcile_rest_days};
use regimen_core::progress::{BackfillWrite, Cursor};
use regimen_core::workout::{WorkoutActionError, complete_workout, start_workout};
use regimen_db::models::{CompletionStatus, PlanType, PlanWorkout};
use regimen_db::queries::assignments::{self, Assignee};
use regimen_db::queries::completions;
use regimen_test_utils::{SlotSpec, create_test_db, drop_test_db, seed_plan, seed_user, slot_at};

fn cursor(phase: i32, week: i32, day: i32) -> Cursor {
    Cursor {
        phase,
        week_in_phase: week,
        day_of_week: day,
        ..Cursor::origin()
    }
}

async fn status_of(
    pool: &PgPool,
    user_id: Uuid,
    slot: &PlanWorkout,
) -> Option<CompletionStatus> {
    completions::get_completion(pool, user_id, slot.plan_id, slot.id)
        .await
        .expect("get_completion should succeed")
        .map(|c| c.status)
}

/// A seven-day first week: rest days 1, 3, 5-7, an active-rest day 2 and a
/// training day 4.
fn first_week() -> Vec<SlotSpec> {
    vec![
        SlotSpec::rest(1, 1, 1),
        SlotSpec::active_rest(1, 1, 2),
        SlotSpec::rest(1, 1, 3),
        SlotSpec::training(1, 1, 4),
        SlotSpec::rest(1, 1, 5),
        SlotSpec::rest(1, 1, 6),
        SlotSpec::rest(1, 1, 7),
    ]
}

#[tokio::test]
async fn no_history_backfills_elapsed_rest_days() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;

    let report = reconcile_rest_days(&pool, user.id, plan.id, &slots, &cursor(1, 1, 4))
        .await
        .expect("reconcile should succeed");

    assert_eq!(report.inserted, 3);
    assert_eq!(
        status_of(&pool, user.id, slot_at(&slots, 1, 1, 1)).await,
        Some(CompletionStatus::Completed)
    );
    assert_eq!(
        status_of(&pool, user.id, slot_at(&slots, 1, 1, 2)).await,
        Some(CompletionStatus::NotStarted)
    );
    assert_eq!(
        status_of(&pool, user.id, slot_at(&slots, 1, 1, 3)).await,
        Some(CompletionStatus::Completed)
    );
    // Training days and future days are left alone.
    assert_eq!(status_of(&pool, user.id, slot_at(&slots, 1, 1, 4)).await, None);
    assert_eq!(status_of(&pool, user.id, slot_at(&slots, 1, 1, 5)).await, None);

    let rows = completions::list_completions(&pool, user.id, plan.id)
        .await
        .unwrap();
    assert!(rows.iter().all(|r| r.backfilled));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn second_run_writes_nothing() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;
    let c = cursor(1, 1, 4);

    let first = reconcile_rest_days(&pool, user.id, plan.id, &slots, &c)
        .await
        .unwrap();
    let before = completions::list_completions(&pool, user.id, plan.id)
        .await
        .unwrap();

    let second = reconcile_rest_days(&pool, user.id, plan.id, &slots, &c)
        .await
        .unwrap();
    let after = completions::list_completions(&pool, user.id, plan.id)
        .await
        .unwrap();

    assert_eq!(first.writes(), 3);
    assert_eq!(second.writes(), 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.id, a.id);
        assert_eq!(b.status, a.status);
        assert_eq!(b.updated_at, a.updated_at);
    }

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_runs_never_duplicate_rows() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;
    let c = cursor(1, 1, 7);

    let (a, b) = futures::join!(
        reconcile_rest_days(&pool, user.id, plan.id, &slots, &c),
        reconcile_rest_days(&pool, user.id, plan.id, &slots, &c),
    );
    let a = a.expect("first run should succeed");
    let b = b.expect("second run should succeed");

    // Days 1, 2, 3, 5, 6 and 7 are due; each row is inserted exactly once.
    assert_eq!(a.inserted + b.inserted, 6);
    let rows = completions::list_completions(&pool, user.id, plan.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 6);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn user_rows_are_never_overwritten() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;
    let active_rest = slot_at(&slots, 1, 1, 2);

    // The user started the active-rest session themselves.
    completions::record_user_status(
        &pool,
        user.id,
        plan.id,
        active_rest.id,
        CompletionStatus::InProgress,
        &[CompletionStatus::NotStarted],
        Some(Utc::now()),
        None,
    )
    .await
    .unwrap()
    .expect("row should be written");

    // Direct write of a conflicting backfill status.
    let mut conn = pool.acquire().await.unwrap();
    let outcome = completions::upsert_backfill(
        &mut conn,
        user.id,
        plan.id,
        active_rest.id,
        CompletionStatus::NotStarted,
    )
    .await
    .unwrap();
    drop(conn);

    assert_eq!(outcome, completions::UpsertOutcome::Unchanged);
    let row = completions::get_completion(&pool, user.id, plan.id, active_rest.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, CompletionStatus::InProgress);
    assert!(!row.backfilled);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn completed_rows_never_regress() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;
    let rest = slot_at(&slots, 1, 1, 1);
    let active_rest = slot_at(&slots, 1, 1, 2);

    let writes = vec![
        BackfillWrite {
            plan_workout_id: rest.id,
            position: rest.position(),
            status: CompletionStatus::Completed,
        },
        BackfillWrite {
            plan_workout_id: active_rest.id,
            position: active_rest.position(),
            status: CompletionStatus::NotStarted,
        },
    ];
    apply_backfill(&pool, user.id, plan.id, &writes).await.unwrap();

    // A later pass with the statuses flipped: the not-started row may move
    // forward, the completed one stays completed.
    let flipped: Vec<_> = writes
        .iter()
        .map(|w| BackfillWrite {
            status: match w.status {
                CompletionStatus::Completed => CompletionStatus::NotStarted,
                _ => CompletionStatus::Completed,
            },
            ..*w
        })
        .collect();
    let report = apply_backfill(&pool, user.id, plan.id, &flipped).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(
        status_of(&pool, user.id, rest).await,
        Some(CompletionStatus::Completed)
    );
    assert_eq!(
        status_of(&pool, user.id, active_rest).await,
        Some(CompletionStatus::Completed)
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn backfill_rows_do_not_count_as_history() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;

    reconcile_rest_days(&pool, user.id, plan.id, &slots, &cursor(1, 1, 4))
        .await
        .unwrap();

    let last = completions::last_touched_plan_workout(&pool, user.id, plan.id)
        .await
        .unwrap();
    assert!(last.is_none());

    // Once the user acts, that slot becomes the reference point.
    let training = slot_at(&slots, 1, 1, 4);
    completions::record_user_status(
        &pool,
        user.id,
        plan.id,
        training.id,
        CompletionStatus::Completed,
        &[CompletionStatus::NotStarted, CompletionStatus::InProgress],
        Some(Utc::now()),
        Some(Utc::now()),
    )
    .await
    .unwrap();
    let last = completions::last_touched_plan_workout(&pool, user.id, plan.id)
        .await
        .unwrap();
    assert_eq!(last.as_ref().map(|s| s.id), Some(training.id));

    // With history, a later pass only fills elapsed days of the current week.
    // The active-rest day before the user's last action counts as done.
    let writes = plan_backfill(&slots, &cursor(1, 1, 7), last.as_ref());
    let days: Vec<i32> = writes.iter().map(|w| w.position.2).collect();
    assert_eq!(days, vec![1, 2, 3, 5, 6]);
    let report = apply_backfill(&pool, user.id, plan.id, &writes).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(
        status_of(&pool, user.id, slot_at(&slots, 1, 1, 2)).await,
        Some(CompletionStatus::Completed)
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn empty_write_set_is_a_no_op() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, _) = seed_plan(&pool, PlanType::Program, &[]).await;

    let report = apply_backfill(&pool, user.id, plan.id, &[]).await.unwrap();
    assert_eq!(report, Default::default());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn pure_rest_day_cannot_be_started_and_is_completed_once_elapsed() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &first_week()).await;
    let now = Utc::now();
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), now.date_naive(), None)
        .await
        .unwrap();
    let rest = slot_at(&slots, 1, 1, 3);

    let err = start_workout(&pool, user.id, plan.id, rest.id, now)
        .await
        .unwrap_err();
    assert!(
        matches!(err, WorkoutActionError::RestDay { plan_workout_id } if plan_workout_id == rest.id),
        "expected RestDay, got: {err}"
    );
    let err = complete_workout(&pool, user.id, plan.id, rest.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkoutActionError::RestDay { .. }));
    assert_eq!(status_of(&pool, user.id, rest).await, None);

    reconcile_rest_days(&pool, user.id, plan.id, &slots, &cursor(1, 1, 5))
        .await
        .unwrap();
    let row = completions::get_completion(&pool, user.id, plan.id, rest.id)
        .await
        .unwrap()
        .expect("elapsed rest day should have a row");
    assert_eq!(row.status, CompletionStatus::Completed);
    assert!(row.backfilled);

    drop_test_db(&db_name).await;
}
