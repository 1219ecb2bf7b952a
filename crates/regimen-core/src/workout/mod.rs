//! User workout actions: starting and completing a plan workout.
//!
//! A user's progress on a slot lives in one completion row, created lazily
//! on the first action. A missing row counts as `not_started`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use regimen_db::models::{CompletionStatus, UserCompletedWorkout};
use regimen_db::queries::{assignments, completions, plan_workouts};

/// The completion state machine.
///
/// Enforces the valid transition graph:
///
/// ```text
/// not_started -> in_progress
/// not_started -> completed
/// in_progress -> completed
/// completed   -> in_progress  (restart)
/// ```
pub struct WorkoutStateMachine;

impl WorkoutStateMachine {
    /// Check whether a transition from `from` to `to` is a valid edge
    /// in the state graph.
    pub fn is_valid_transition(from: CompletionStatus, to: CompletionStatus) -> bool {
        matches!(
            (from, to),
            (CompletionStatus::NotStarted, CompletionStatus::InProgress)
                | (CompletionStatus::NotStarted, CompletionStatus::Completed)
                | (CompletionStatus::InProgress, CompletionStatus::Completed)
                | (CompletionStatus::Completed, CompletionStatus::InProgress)
        )
    }

    /// Every status that may move to `to`.
    pub fn allowed_from(to: CompletionStatus) -> Vec<CompletionStatus> {
        [
            CompletionStatus::NotStarted,
            CompletionStatus::InProgress,
            CompletionStatus::Completed,
        ]
        .into_iter()
        .filter(|from| Self::is_valid_transition(*from, to))
        .collect()
    }
}

/// Errors a workout action can fail with.
#[derive(Debug, Error)]
pub enum WorkoutActionError {
    #[error("plan workout {plan_workout_id} not found in plan {plan_id}")]
    SlotNotFound { plan_id: Uuid, plan_workout_id: Uuid },

    #[error("user {user_id} is not currently assigned to plan {plan_id}")]
    NotAssigned { user_id: Uuid, plan_id: Uuid },

    #[error("plan workout {plan_workout_id} is a rest day with no workout")]
    RestDay { plan_workout_id: Uuid },

    #[error("invalid workout transition: {from} -> {to}")]
    InvalidTransition {
        from: CompletionStatus,
        to: CompletionStatus,
    },

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Mark a plan workout as started at `now`.
pub async fn start_workout(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
    now: DateTime<Utc>,
) -> Result<UserCompletedWorkout, WorkoutActionError> {
    apply(
        pool,
        user_id,
        plan_id,
        plan_workout_id,
        CompletionStatus::InProgress,
        now,
    )
    .await
}

/// Mark a plan workout as completed at `now`.
pub async fn complete_workout(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
    now: DateTime<Utc>,
) -> Result<UserCompletedWorkout, WorkoutActionError> {
    apply(
        pool,
        user_id,
        plan_id,
        plan_workout_id,
        CompletionStatus::Completed,
        now,
    )
    .await
}

async fn apply(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan_workout_id: Uuid,
    to: CompletionStatus,
    now: DateTime<Utc>,
) -> Result<UserCompletedWorkout, WorkoutActionError> {
    let slot = plan_workouts::get_plan_workout(pool, plan_workout_id)
        .await?
        .filter(|s| s.plan_id == plan_id)
        .ok_or(WorkoutActionError::SlotNotFound {
            plan_id,
            plan_workout_id,
        })?;
    // Pure rest days are only ever completed by the backfill.
    if slot.workout_id.is_none() {
        return Err(WorkoutActionError::RestDay { plan_workout_id });
    }

    let assignment = assignments::find_active_assignment(pool, user_id, now.date_naive()).await?;
    if assignment.is_none_or(|a| a.plan_id != plan_id) {
        return Err(WorkoutActionError::NotAssigned { user_id, plan_id });
    }

    // Starting always restamps the start; completing keeps any earlier one.
    let start_time = Some(now);
    let end_time = (to == CompletionStatus::Completed).then_some(now);

    let row = completions::record_user_status(
        pool,
        user_id,
        plan_id,
        plan_workout_id,
        to,
        &WorkoutStateMachine::allowed_from(to),
        start_time,
        end_time,
    )
    .await?;

    match row {
        Some(row) => {
            info!(
                user_id = %user_id,
                plan_workout_id = %plan_workout_id,
                status = %to,
                "workout status recorded"
            );
            Ok(row)
        }
        None => {
            let from = completions::get_completion(pool, user_id, plan_id, plan_workout_id)
                .await?
                .map_or(CompletionStatus::NotStarted, |c| c.status);
            Err(WorkoutActionError::InvalidTransition { from, to })
        }
    }
}
