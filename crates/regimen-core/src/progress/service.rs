//! My-plan service: resolves the caller's plan assignment, places today on
//! the program grid, reconciles elapsed rest days and returns the workouts
//! for the requested (or current) day.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use regimen_db::models::{Plan, PlanAssignment, PlanType, PlanWorkout};
use regimen_db::queries::completions::{self, UpsertOutcome};
use regimen_db::queries::plan_workouts::{self, SlotWorkout};
use regimen_db::queries::{assignments, plans};

use super::backfill::{BackfillReport, BackfillWrite, plan_backfill};
use super::cursor::Cursor;
use super::structure::PlanStructure;

/// Optional caller overrides for which day to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SlotRequest {
    pub phase: Option<i32>,
    pub week: Option<i32>,
    pub day: Option<i32>,
}

/// The (phase, week, day) whose workouts a view lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotSelection {
    pub phase: i32,
    pub week: i32,
    pub day: i32,
}

impl SlotSelection {
    /// Fill each unset field of `request` from the cursor.
    pub fn from_request(request: SlotRequest, cursor: &Cursor) -> Self {
        Self {
            phase: request.phase.unwrap_or(cursor.phase),
            week: request.week.unwrap_or(cursor.week_in_phase),
            day: request.day.unwrap_or(cursor.day_of_week),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanTotals {
    pub phases: i32,
    pub weeks: i32,
    pub days: i32,
}

impl PlanTotals {
    /// Totals of the structure described by `slots`. A malformed structure
    /// is logged and reports as empty.
    pub fn from_slots(plan_id: Uuid, slots: &[PlanWorkout]) -> Self {
        match PlanStructure::from_slots(slots) {
            Ok(structure) => Self::from(&structure),
            Err(e) => {
                warn!(plan_id = %plan_id, error = %e, "inconsistent plan structure; reporting empty totals");
                Self::default()
            }
        }
    }
}

impl From<&PlanStructure> for PlanTotals {
    fn from(s: &PlanStructure) -> Self {
        Self {
            phases: s.total_phases(),
            weeks: s.total_weeks(),
            days: s.total_days(),
        }
    }
}

/// Everything the my-plan endpoint returns for an assigned user.
#[derive(Debug, Clone, Serialize)]
pub struct MyPlanView {
    pub plan: Plan,
    pub assignment: PlanAssignment,
    pub totals: PlanTotals,
    /// `None` for on-demand plans, which have no calendar position.
    pub cursor: Option<Cursor>,
    pub selected: Option<SlotSelection>,
    pub workouts: Vec<SlotWorkout>,
    pub backfill: BackfillReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MyPlan {
    NoPlanAssigned,
    Assigned(Box<MyPlanView>),
}

/// Derive the plan structure and today's cursor.
///
/// A structure that fails integrity checks is logged and replaced by an
/// empty one, which puts the cursor at the origin.
pub fn locate(
    plan_id: Uuid,
    slots: &[PlanWorkout],
    start: NaiveDate,
    today: NaiveDate,
) -> (PlanStructure, Cursor) {
    match PlanStructure::from_slots(slots) {
        Ok(structure) => {
            if structure.is_empty() {
                warn!(plan_id = %plan_id, "program has no scheduled weeks; using day 1 of week 1");
            }
            let cursor = Cursor::resolve(&structure, start, today);
            if cursor.overrun {
                debug!(
                    plan_id = %plan_id,
                    absolute_week = cursor.absolute_week,
                    "date is past the end of the program; clamped to last week"
                );
            }
            (structure, cursor)
        }
        Err(e) => {
            warn!(plan_id = %plan_id, error = %e, "inconsistent plan structure; using day 1 of week 1");
            (PlanStructure::default(), Cursor::origin())
        }
    }
}

/// Apply backfill writes in a single transaction.
///
/// Each write is an atomic upsert on the completion key, so a concurrent
/// request reconciling the same slots cannot create duplicates.
pub async fn apply_backfill(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    writes: &[BackfillWrite],
) -> Result<BackfillReport> {
    let mut report = BackfillReport::default();
    if writes.is_empty() {
        return Ok(report);
    }

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    for write in writes {
        let outcome = completions::upsert_backfill(
            &mut *tx,
            user_id,
            plan_id,
            write.plan_workout_id,
            write.status,
        )
        .await?;
        match outcome {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::Updated => report.updated += 1,
            UpsertOutcome::Unchanged => report.unchanged += 1,
        }
    }

    tx.commit().await.context("failed to commit backfill")?;

    debug!(
        user_id = %user_id,
        plan_id = %plan_id,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        "rest-day backfill applied"
    );
    Ok(report)
}

/// Reconcile a user's elapsed rest days for a program at `cursor`.
pub async fn reconcile_rest_days(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    slots: &[PlanWorkout],
    cursor: &Cursor,
) -> Result<BackfillReport> {
    let last_touched = completions::last_touched_plan_workout(pool, user_id, plan_id).await?;
    let writes = plan_backfill(slots, cursor, last_touched.as_ref());
    apply_backfill(pool, user_id, plan_id, &writes).await
}

/// Resolve the my-plan view for `user_id` on `today`.
pub async fn resolve_my_plan(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    request: SlotRequest,
) -> Result<MyPlan> {
    let Some(assignment) = assignments::find_active_assignment(pool, user_id, today).await? else {
        info!(user_id = %user_id, %today, "no plan assigned");
        return Ok(MyPlan::NoPlanAssigned);
    };

    let plan = plans::get_plan(pool, assignment.plan_id)
        .await?
        .with_context(|| format!("plan {} not found", assignment.plan_id))?;

    let slots = plan_workouts::list_plan_workouts(pool, plan.id).await?;

    let view = match plan.plan_type {
        PlanType::OnDemand => {
            let workouts =
                plan_workouts::list_slot_workouts(pool, user_id, plan.id, None, None, None)
                    .await?;
            let totals = PlanTotals::from_slots(plan.id, &slots);
            MyPlanView {
                plan,
                assignment,
                totals,
                cursor: None,
                selected: None,
                workouts,
                backfill: BackfillReport::default(),
            }
        }
        PlanType::Program => {
            let (structure, cursor) = locate(plan.id, &slots, assignment.start_date, today);
            let backfill = reconcile_rest_days(pool, user_id, plan.id, &slots, &cursor).await?;

            let selected = SlotSelection::from_request(request, &cursor);
            let workouts = plan_workouts::list_slot_workouts(
                pool,
                user_id,
                plan.id,
                Some(selected.phase),
                Some(selected.week),
                Some(selected.day),
            )
            .await?;

            MyPlanView {
                plan,
                assignment,
                totals: PlanTotals::from(&structure),
                cursor: Some(cursor),
                selected: Some(selected),
                workouts,
                backfill,
            }
        }
    };

    Ok(MyPlan::Assigned(Box::new(view)))
}
