//! Integration tests for the my-plan service.
//!
//! Exercises assignment resolution, cursor placement, backfill and slot
//! listing end to end against PostgreSQL.

use chrono::{Duration, NaiveDate};

use regimen_core::progress::{MyPlan, MyPlanView, SlotRequest, SlotSelection, resolve_my_plan};
use regimen_db::models::{CompletionStatus, PlanType};
use regimen_db::queries::assignments::{self, Assignee};
use regimen_db::queries::{completions, directory, plans};
use regimen_test_utils::{SlotSpec, create_test_db, drop_test_db, seed_plan, seed_user, slot_at};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expect_view(result: MyPlan) -> MyPlanView {
    match result {
        MyPlan::Assigned(view) => *view,
        MyPlan::NoPlanAssigned => panic!("expected an assigned plan"),
    }
}

/// Two phases: three weeks then four, each week with a training day 1, a
/// rest day 2 and an active-rest day 3.
fn two_phase_program() -> Vec<SlotSpec> {
    let mut slots = Vec::new();
    for (phase, weeks) in [(1, 3), (2, 4)] {
        for week in 1..=weeks {
            slots.push(SlotSpec::training(phase, week, 1));
            slots.push(SlotSpec::rest(phase, week, 2));
            slots.push(SlotSpec::active_rest(phase, week, 3));
        }
    }
    slots
}

#[tokio::test]
async fn reports_no_plan_assigned() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;

    let result = resolve_my_plan(&pool, user.id, date(2024, 1, 10), SlotRequest::default())
        .await
        .expect("resolve should succeed");
    assert!(matches!(result, MyPlan::NoPlanAssigned));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn resolves_cursor_and_lists_todays_workouts() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    let start = date(2024, 1, 1);
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), start, None)
        .await
        .unwrap();

    // 29 days in: absolute week 5, phase 2 week 2, day 2.
    let today = start + Duration::days(29);
    let view = expect_view(
        resolve_my_plan(&pool, user.id, today, SlotRequest::default())
            .await
            .unwrap(),
    );

    let cursor = view.cursor.expect("program has a cursor");
    assert_eq!(cursor.absolute_week, 5);
    assert_eq!(cursor.position(), (2, 2, 2));
    assert_eq!(view.selected, Some(SlotSelection { phase: 2, week: 2, day: 2 }));
    assert_eq!(view.totals.phases, 2);
    assert_eq!(view.totals.weeks, 7);
    assert_eq!(view.totals.days, 21);

    assert_eq!(view.workouts.len(), 1);
    let today_slot = &view.workouts[0];
    assert_eq!(today_slot.plan_workout_id, slot_at(&slots, 2, 2, 2).id);
    // No history: everything up to and including today was reconciled.
    assert_eq!(today_slot.status, Some(CompletionStatus::Completed));
    assert!(view.backfill.inserted > 0);

    let missed = completions::get_completion(&pool, user.id, plan.id, slot_at(&slots, 1, 2, 3).id)
        .await
        .unwrap()
        .expect("elapsed active-rest day should be reconciled");
    assert_eq!(missed.status, CompletionStatus::NotStarted);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn request_overrides_browse_other_days_without_moving_cursor() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, slots) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    let start = date(2024, 1, 1);
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), start, None)
        .await
        .unwrap();

    let request = SlotRequest {
        phase: Some(1),
        week: Some(3),
        day: Some(1),
    };
    let view = expect_view(
        resolve_my_plan(&pool, user.id, start + Duration::days(9), request)
            .await
            .unwrap(),
    );

    assert_eq!(view.cursor.unwrap().position(), (1, 2, 3));
    assert_eq!(view.selected, Some(SlotSelection { phase: 1, week: 3, day: 1 }));
    assert_eq!(view.workouts.len(), 1);
    assert_eq!(view.workouts[0].plan_workout_id, slot_at(&slots, 1, 3, 1).id);
    assert!(view.workouts[0].workout_name.is_some());
    assert_eq!(view.workouts[0].status, None);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn start_date_resolves_to_origin() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, _) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    let start = date(2024, 3, 4);
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), start, None)
        .await
        .unwrap();

    let view = expect_view(
        resolve_my_plan(&pool, user.id, start, SlotRequest::default())
            .await
            .unwrap(),
    );
    assert_eq!(view.cursor.unwrap().position(), (1, 1, 1));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn organization_assignment_applies_to_members() {
    let (pool, db_name) = create_test_db().await;
    let org = directory::insert_organization(&pool, "North Gym").await.unwrap();
    let member = seed_user(&pool, Some(org.id)).await;
    let outsider = seed_user(&pool, None).await;
    let (plan, _) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    assignments::insert_assignment(
        &pool,
        plan.id,
        Assignee::Organization(org.id),
        date(2024, 1, 1),
        Some(date(2024, 6, 30)),
    )
    .await
    .unwrap();

    let today = date(2024, 2, 1);
    let view = expect_view(
        resolve_my_plan(&pool, member.id, today, SlotRequest::default())
            .await
            .unwrap(),
    );
    assert_eq!(view.plan.id, plan.id);

    let other = resolve_my_plan(&pool, outsider.id, today, SlotRequest::default())
        .await
        .unwrap();
    assert!(matches!(other, MyPlan::NoPlanAssigned));

    // Past the end of the window the assignment no longer applies.
    let expired = resolve_my_plan(&pool, member.id, date(2024, 7, 1), SlotRequest::default())
        .await
        .unwrap();
    assert!(matches!(expired, MyPlan::NoPlanAssigned));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn direct_assignment_wins_over_organization() {
    let (pool, db_name) = create_test_db().await;
    let org = directory::insert_organization(&pool, "South Gym").await.unwrap();
    let user = seed_user(&pool, Some(org.id)).await;
    let (org_plan, _) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    let (own_plan, _) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;

    assignments::insert_assignment(
        &pool,
        org_plan.id,
        Assignee::Organization(org.id),
        date(2024, 1, 15),
        None,
    )
    .await
    .unwrap();
    assignments::insert_assignment(
        &pool,
        own_plan.id,
        Assignee::User(user.id),
        date(2024, 1, 1),
        None,
    )
    .await
    .unwrap();

    let view = expect_view(
        resolve_my_plan(&pool, user.id, date(2024, 2, 1), SlotRequest::default())
            .await
            .unwrap(),
    );
    assert_eq!(view.plan.id, own_plan.id);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn inactive_plans_are_ignored() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, _) = seed_plan(&pool, PlanType::Program, &two_phase_program()).await;
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), date(2024, 1, 1), None)
        .await
        .unwrap();
    plans::set_plan_active(&pool, plan.id, false).await.unwrap();

    let result = resolve_my_plan(&pool, user.id, date(2024, 1, 5), SlotRequest::default())
        .await
        .unwrap();
    assert!(matches!(result, MyPlan::NoPlanAssigned));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn on_demand_plan_lists_everything_without_backfill() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let specs = [
        SlotSpec::training(1, 1, 1),
        SlotSpec::training(1, 1, 2),
        SlotSpec::rest(1, 1, 3),
    ];
    let (plan, _) = seed_plan(&pool, PlanType::OnDemand, &specs).await;
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), date(2024, 1, 1), None)
        .await
        .unwrap();

    let view = expect_view(
        resolve_my_plan(&pool, user.id, date(2024, 3, 1), SlotRequest::default())
            .await
            .unwrap(),
    );
    assert!(view.cursor.is_none());
    assert!(view.selected.is_none());
    assert_eq!(view.workouts.len(), 3);
    assert_eq!(view.backfill.writes(), 0);
    assert!(
        completions::list_completions(&pool, user.id, plan.id)
            .await
            .unwrap()
            .is_empty()
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn program_without_slots_falls_back_to_origin() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, None).await;
    let (plan, _) = seed_plan(&pool, PlanType::Program, &[]).await;
    assignments::insert_assignment(&pool, plan.id, Assignee::User(user.id), date(2024, 1, 1), None)
        .await
        .unwrap();

    let view = expect_view(
        resolve_my_plan(&pool, user.id, date(2024, 2, 20), SlotRequest::default())
            .await
            .unwrap(),
    );
    let cursor = view.cursor.unwrap();
    assert_eq!((cursor.phase, cursor.week_in_phase), (1, 1));
    assert!(view.workouts.is_empty());
    assert_eq!(view.totals.weeks, 0);

    drop_test_db(&db_name).await;
}
