//! Database query functions for the `user_completed_workouts` table.
//!
//! Every write is a single `INSERT ... ON CONFLICT` on the natural key
//! `(user_id, plan_id, plan_workout_id)`, so concurrent requests for the
//! same slot never produce duplicate rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{CompletionStatus, PlanWorkout, UserCompletedWorkout};

/// Result of a backfill upsert for a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The row already existed and was left alone.
    Unchanged,
}

pub async fn get_completion(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
) -> Result<Option<UserCompletedWorkout>> {
    let row = sqlx::query_as::<_, UserCompletedWorkout>(
        "SELECT * FROM user_completed_workouts \
         WHERE user_id = $1 AND plan_id = $2 AND plan_workout_id = $3",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(plan_workout_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch completion")?;

    Ok(row)
}

/// List all completion rows of a user for a plan, in slot order.
pub async fn list_completions(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Vec<UserCompletedWorkout>> {
    let rows = sqlx::query_as::<_, UserCompletedWorkout>(
        "SELECT ucw.* FROM user_completed_workouts ucw \
         JOIN plan_workouts pw ON pw.id = ucw.plan_workout_id \
         WHERE ucw.user_id = $1 AND ucw.plan_id = $2 \
         ORDER BY pw.phase, pw.week, pw.day",
    )
    .bind(user_id)
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list completions")?;

    Ok(rows)
}

/// The slot of the user's most recently updated completion row for a plan.
///
/// Rows synthesised by the backfill are skipped: only slots the user acted
/// on count as history.
pub async fn last_touched_plan_workout(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Option<PlanWorkout>> {
    let slot = sqlx::query_as::<_, PlanWorkout>(
        "SELECT pw.* \
         FROM user_completed_workouts ucw \
         JOIN plan_workouts pw ON pw.id = ucw.plan_workout_id \
         WHERE ucw.user_id = $1 AND ucw.plan_id = $2 AND NOT ucw.backfilled \
         ORDER BY ucw.updated_at DESC, ucw.id DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch last touched plan workout")?;

    Ok(slot)
}

/// Upsert a synthetic completion row.
///
/// Existing rows are only updated when they were themselves backfilled, are
/// not already `completed`, and hold a different status. User-authored rows
/// and completed rows are never touched, and re-running with the same
/// status writes nothing.
pub async fn upsert_backfill(
    conn: &mut PgConnection,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
    status: CompletionStatus,
) -> Result<UpsertOutcome> {
    let inserted: Option<bool> = sqlx::query_scalar(
        "INSERT INTO user_completed_workouts \
             (user_id, plan_id, plan_workout_id, status, backfilled) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT (user_id, plan_id, plan_workout_id) DO UPDATE \
         SET status = EXCLUDED.status, updated_at = now() \
         WHERE user_completed_workouts.backfilled \
           AND user_completed_workouts.status <> 'completed' \
           AND user_completed_workouts.status <> EXCLUDED.status \
         RETURNING (xmax = 0)",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(plan_workout_id)
    .bind(status)
    .fetch_optional(conn)
    .await
    .with_context(|| format!("failed to backfill plan workout {plan_workout_id}"))?;

    Ok(match inserted {
        Some(true) => UpsertOutcome::Inserted,
        Some(false) => UpsertOutcome::Updated,
        None => UpsertOutcome::Unchanged,
    })
}

/// Record a user action on a slot.
///
/// Inserts the row (a missing row counts as `not_started`) or moves an
/// existing one to `status`, but only when its current status is in
/// `allowed_from`. The row becomes user-authored (`backfilled = FALSE`).
///
/// `start_time` replaces the stored start when moving to `in_progress`;
/// otherwise the earliest known start is kept. `end_time` always replaces
/// the stored end.
///
/// Returns `None` when the row exists with a status outside `allowed_from`.
#[allow(clippy::too_many_arguments)]
pub async fn record_user_status(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
    status: CompletionStatus,
    allowed_from: &[CompletionStatus],
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) -> Result<Option<UserCompletedWorkout>> {
    let allowed: Vec<String> = allowed_from.iter().map(ToString::to_string).collect();

    let row = sqlx::query_as::<_, UserCompletedWorkout>(
        "INSERT INTO user_completed_workouts \
             (user_id, plan_id, plan_workout_id, status, start_time, end_time, backfilled) \
         VALUES ($1, $2, $3, $4, $5, $6, FALSE) \
         ON CONFLICT (user_id, plan_id, plan_workout_id) DO UPDATE \
         SET status = EXCLUDED.status, \
             start_time = CASE WHEN EXCLUDED.status = 'in_progress' \
                               THEN EXCLUDED.start_time \
                               ELSE COALESCE(user_completed_workouts.start_time, EXCLUDED.start_time) \
                          END, \
             end_time = EXCLUDED.end_time, \
             backfilled = FALSE, \
             updated_at = now() \
         WHERE user_completed_workouts.status = ANY($7) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(plan_workout_id)
    .bind(status)
    .bind(start_time)
    .bind(end_time)
    .bind(&allowed)
    .fetch_optional(pool)
    .await
    .with_context(|| {
        format!("failed to record status {status} for plan workout {plan_workout_id}")
    })?;

    Ok(row)
}
