//! Shared test utilities for regimen integration tests.
//!
//! Provides a PostgreSQL instance shared across tests. Each test gets its
//! own database within the instance.
//!
//! Two modes:
//! - **`REGIMEN_TEST_PG_URL`** set: use the external server directly.
//! - **No env var** (`cargo test`): spin up a container via testcontainers,
//!   shared per binary through a `OnceCell`.
//!
//! Also carries small fixture builders for users and plans.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use regimen_db::models::{Plan, PlanType, PlanWorkout, User};
use regimen_db::pool;
use regimen_db::queries::plan_workouts::{NewPlanWorkout, insert_plan_workout};
use regimen_db::queries::{directory, plans};

/// Shared container state: base URL and optional container handle (kept alive).
struct SharedPg {
    base_url: String,
    /// Held to keep the container alive. `None` when using an external URL.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

async fn init_shared_pg() -> SharedPg {
    if let Ok(url) = std::env::var("REGIMEN_TEST_PG_URL") {
        return SharedPg {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedPg {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Base URL for the shared PostgreSQL (no database name appended).
pub async fn pg_url() -> &'static str {
    let shared = SHARED_PG.get_or_init(init_shared_pg).await;
    &shared.base_url
}

/// Create a temporary database with migrations applied.
///
/// Returns `(pool, db_name)`. Call [`drop_test_db`] with the returned
/// `db_name` when the test is done.
pub async fn create_test_db() -> (PgPool, String) {
    let base_url = pg_url().await;

    let maint_url = format!("{base_url}/postgres");
    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&maint_url)
        .await
        .expect("failed to connect to maintenance database");

    let db_name = format!("regimen_test_{}", Uuid::new_v4().simple());
    let stmt = format!("CREATE DATABASE {db_name}");
    maint_pool
        .execute(stmt.as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create temp database {db_name}: {e}"));
    maint_pool.close().await;

    let temp_url = format!("{base_url}/{db_name}");
    let temp_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&temp_url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to temp database {db_name}: {e}"));

    pool::run_migrations(&temp_pool)
        .await
        .expect("migrations should succeed");

    (temp_pool, db_name)
}

/// Drop a temporary database, terminating its connections first.
pub async fn drop_test_db(db_name: &str) {
    let base_url = pg_url().await;
    let maint_url = format!("{base_url}/postgres");

    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&maint_url)
        .await
        .expect("failed to connect to maintenance database for cleanup");

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint_pool.execute(terminate.as_str()).await;

    let stmt = format!("DROP DATABASE IF EXISTS {db_name}");
    let _ = maint_pool.execute(stmt.as_str()).await;
    maint_pool.close().await;
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with a unique email.
pub async fn seed_user(pool: &PgPool, organization_id: Option<Uuid>) -> User {
    let email = format!("user-{}@example.test", Uuid::new_v4().simple());
    directory::insert_user(pool, "Test User", &email, organization_id)
        .await
        .expect("insert_user should succeed")
}

/// Shape of one seeded day slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub phase: i32,
    pub week: i32,
    pub day: i32,
    pub is_rest: bool,
    /// When true the slot points at a catalogue workout.
    pub has_workout: bool,
}

impl SlotSpec {
    /// A training day with a workout.
    pub fn training(phase: i32, week: i32, day: i32) -> Self {
        Self {
            phase,
            week,
            day,
            is_rest: false,
            has_workout: true,
        }
    }

    /// A pure rest day: no workout.
    pub fn rest(phase: i32, week: i32, day: i32) -> Self {
        Self {
            phase,
            week,
            day,
            is_rest: true,
            has_workout: false,
        }
    }

    /// A rest-flagged day that still carries light content.
    pub fn active_rest(phase: i32, week: i32, day: i32) -> Self {
        Self {
            phase,
            week,
            day,
            is_rest: true,
            has_workout: true,
        }
    }
}

/// Insert a plan and its slots. Slot workouts share one catalogue entry.
pub async fn seed_plan(
    pool: &PgPool,
    plan_type: PlanType,
    slots: &[SlotSpec],
) -> (Plan, Vec<PlanWorkout>) {
    let mut conn = pool.acquire().await.expect("acquire connection");
    let plan = plans::insert_plan(&mut conn, "Seeded plan", plan_type)
        .await
        .expect("insert_plan should succeed");
    let workout_name = format!("workout-{}", Uuid::new_v4().simple());
    let workout = directory::upsert_workout(&mut conn, &workout_name, None)
        .await
        .expect("upsert_workout should succeed");

    let mut rows = Vec::with_capacity(slots.len());
    for s in slots {
        let new = NewPlanWorkout {
            plan_id: plan.id,
            phase: s.phase,
            week: s.week,
            day: s.day,
            is_rest: s.is_rest,
            workout_id: s.has_workout.then_some(workout.id),
        };
        let row = insert_plan_workout(&mut conn, &new)
            .await
            .expect("insert_plan_workout should succeed");
        rows.push(row);
    }
    (plan, rows)
}

/// Find the seeded slot at a position.
pub fn slot_at(slots: &[PlanWorkout], phase: i32, week: i32, day: i32) -> &PlanWorkout {
    slots
        .iter()
        .find(|s| s.position() == (phase, week, day))
        .unwrap_or_else(|| panic!("no seeded slot at phase {phase} week {week} day {day}"))
}
