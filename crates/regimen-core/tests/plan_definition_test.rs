//! Integration tests for creating plans from definitions.

use regimen_core::definition::{
    create_plan_from_definition, get_plan_with_slots, parse_plan_definition,
};
use regimen_db::models::PlanType;
use regimen_db::queries::{directory, plans};
use regimen_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn creates_plan_with_slots_and_catalogue() {
    let (pool, db_name) = create_test_db().await;

    let def = parse_plan_definition(
        r#"
[plan]
name = "Base block"

[[workouts]]
name = "Lower A"
description = "Squat focus"

[[workouts]]
name = "Mobility"

[[phases]]
[[phases.weeks]]
days = [
  { workout = "Lower A" },
  { rest = true },
  { workout = "Mobility", rest = true },
]
[[phases.weeks]]
days = []

[[phases]]
[[phases.weeks]]
days = [{ workout = "Lower A" }]
"#,
    )
    .expect("definition should parse");

    let plan = create_plan_from_definition(&pool, &def)
        .await
        .expect("create should succeed");
    assert_eq!(plan.name, "Base block");
    assert_eq!(plan.plan_type, PlanType::Program);
    assert!(plan.is_active);

    let (fetched, slots) = get_plan_with_slots(&pool, plan.id).await.unwrap();
    assert_eq!(fetched.id, plan.id);
    let positions: Vec<_> = slots.iter().map(|s| s.position()).collect();
    assert_eq!(positions, vec![(1, 1, 1), (1, 1, 2), (1, 1, 3), (2, 1, 1)]);

    let rest = &slots[1];
    assert!(rest.is_rest);
    assert!(rest.workout_id.is_none());
    let active_rest = &slots[2];
    assert!(active_rest.is_rest);
    assert!(active_rest.workout_id.is_some());

    let workouts = directory::list_workouts(&pool).await.unwrap();
    let names: Vec<_> = workouts.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Lower A", "Mobility"]);
    assert_eq!(slots[0].workout_id, slots[3].workout_id);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn reuses_existing_catalogue_workouts() {
    let (pool, db_name) = create_test_db().await;

    let mut conn = pool.acquire().await.unwrap();
    let existing = directory::upsert_workout(&mut conn, "Row intervals", Some("8 x 500m"))
        .await
        .unwrap();
    drop(conn);

    let def = parse_plan_definition(
        r#"
[plan]
name = "Engine"

[[phases]]
[[phases.weeks]]
days = [{ workout = "Row intervals" }]
"#,
    )
    .unwrap();

    let plan = create_plan_from_definition(&pool, &def).await.unwrap();
    let (_, slots) = get_plan_with_slots(&pool, plan.id).await.unwrap();
    assert_eq!(slots[0].workout_id, Some(existing.id));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_workout_rolls_back_everything() {
    let (pool, db_name) = create_test_db().await;

    let def = parse_plan_definition(
        r#"
[plan]
name = "Broken"

[[workouts]]
name = "Known"

[[phases]]
[[phases.weeks]]
days = [{ workout = "Known" }, { workout = "Ghost" }]
"#,
    )
    .unwrap();

    let err = create_plan_from_definition(&pool, &def).await.unwrap_err();
    assert!(
        err.to_string().contains("Ghost"),
        "error should name the unknown workout: {err}"
    );

    assert!(plans::list_plans(&pool).await.unwrap().is_empty());
    assert!(directory::list_workouts(&pool).await.unwrap().is_empty());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn creates_on_demand_plan() {
    let (pool, db_name) = create_test_db().await;

    let def = parse_plan_definition(
        r#"
[plan]
name = "Library"
type = "on_demand"

[[workouts]]
name = "Hip opener"

[[phases]]
[[phases.weeks]]
days = [{ workout = "Hip opener" }]
"#,
    )
    .unwrap();

    let plan = create_plan_from_definition(&pool, &def).await.unwrap();
    assert_eq!(plan.plan_type, PlanType::OnDemand);

    drop_test_db(&db_name).await;
}
