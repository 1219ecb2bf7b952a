//! Database query functions for the `plan_workouts` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{CompletionStatus, PlanWorkout};

/// Parameters for inserting a day slot.
#[derive(Debug, Clone)]
pub struct NewPlanWorkout {
    pub plan_id: Uuid,
    pub phase: i32,
    pub week: i32,
    pub day: i32,
    pub is_rest: bool,
    pub workout_id: Option<Uuid>,
}

pub async fn insert_plan_workout(
    conn: &mut PgConnection,
    new: &NewPlanWorkout,
) -> Result<PlanWorkout> {
    let slot = sqlx::query_as::<_, PlanWorkout>(
        "INSERT INTO plan_workouts (plan_id, phase, week, day, is_rest, workout_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(new.phase)
    .bind(new.week)
    .bind(new.day)
    .bind(new.is_rest)
    .bind(new.workout_id)
    .fetch_one(conn)
    .await
    .with_context(|| {
        format!(
            "failed to insert plan workout phase {} week {} day {} for plan {}",
            new.phase, new.week, new.day, new.plan_id
        )
    })?;

    Ok(slot)
}

pub async fn get_plan_workout(pool: &PgPool, id: Uuid) -> Result<Option<PlanWorkout>> {
    let slot = sqlx::query_as::<_, PlanWorkout>("SELECT * FROM plan_workouts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan workout")?;

    Ok(slot)
}

/// List every slot of a plan in (phase, week, day) order.
pub async fn list_plan_workouts(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlanWorkout>> {
    let slots = sqlx::query_as::<_, PlanWorkout>(
        "SELECT * FROM plan_workouts \
         WHERE plan_id = $1 \
         ORDER BY phase, week, day",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list plan workouts")?;

    Ok(slots)
}

/// A plan slot joined with its catalogue workout and one user's status.
/// Slots of every plan in `plan_ids` in one round trip, ordered by plan
/// then position.
pub async fn list_workouts_for_plans(
    pool: &PgPool,
    plan_ids: &[Uuid],
) -> Result<Vec<PlanWorkout>> {
    if plan_ids.is_empty() {
        return Ok(Vec::new());
    }

    let slots = sqlx::query_as::<_, PlanWorkout>(
        "SELECT * FROM plan_workouts \
         WHERE plan_id = ANY($1) \
         ORDER BY plan_id, phase, week, day",
    )
    .bind(plan_ids)
    .fetch_all(pool)
    .await
    .context("failed to list plan workouts for plans")?;

    Ok(slots)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SlotWorkout {
    pub plan_workout_id: Uuid,
    pub phase: i32,
    pub week: i32,
    pub day: i32,
    pub is_rest: bool,
    pub workout_id: Option<Uuid>,
    pub workout_name: Option<String>,
    pub workout_description: Option<String>,
    /// `None` when the user has no completion row for the slot yet.
    pub status: Option<CompletionStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// List a plan's slots for a user, optionally narrowed to a phase, week
/// and/or day. Each filter left as `None` matches everything.
pub async fn list_slot_workouts(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    phase: Option<i32>,
    week: Option<i32>,
    day: Option<i32>,
) -> Result<Vec<SlotWorkout>> {
    let rows = sqlx::query_as::<_, SlotWorkout>(
        "SELECT pw.id AS plan_workout_id, pw.phase, pw.week, pw.day, pw.is_rest, \
                pw.workout_id, w.name AS workout_name, w.description AS workout_description, \
                ucw.status, ucw.start_time, ucw.end_time \
         FROM plan_workouts pw \
         LEFT JOIN workouts w ON w.id = pw.workout_id \
         LEFT JOIN user_completed_workouts ucw \
                ON ucw.plan_workout_id = pw.id \
               AND ucw.plan_id = pw.plan_id \
               AND ucw.user_id = $1 \
         WHERE pw.plan_id = $2 \
           AND ($3::int IS NULL OR pw.phase = $3) \
           AND ($4::int IS NULL OR pw.week = $4) \
           AND ($5::int IS NULL OR pw.day = $5) \
         ORDER BY pw.phase, pw.week, pw.day",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(phase)
    .bind(week)
    .bind(day)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list slot workouts for plan {plan_id}"))?;

    Ok(rows)
}
