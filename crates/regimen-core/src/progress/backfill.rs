//! Rest-day backfill planning.
//!
//! Decides which rest-type slots get a synthetic completion row, and with
//! which status, so elapsed days are never left without a record. Only
//! slots that are pure rest days (no workout) or flagged `is_rest` take
//! part. The writes themselves are applied by
//! [`super::service::apply_backfill`].

use serde::Serialize;
use uuid::Uuid;

use regimen_db::models::{CompletionStatus, PlanWorkout};

use super::cursor::Cursor;

/// One synthetic completion row to upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillWrite {
    pub plan_workout_id: Uuid,
    pub position: (i32, i32, i32),
    pub status: CompletionStatus,
}

/// Counts of what applying a backfill plan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
}

impl BackfillReport {
    pub fn writes(&self) -> u32 {
        self.inserted + self.updated
    }
}

/// Slots taking part in the backfill.
pub fn is_rest_candidate(slot: &PlanWorkout) -> bool {
    slot.workout_id.is_none() || slot.is_rest
}

/// Pure rest days complete themselves; a day with content that nobody did
/// is left as not started.
fn status_by_content(slot: &PlanWorkout) -> CompletionStatus {
    if slot.workout_id.is_none() {
        CompletionStatus::Completed
    } else {
        CompletionStatus::NotStarted
    }
}

/// Status a candidate gets relative to the user's last touched slot.
///
/// Slots at or before the last touched slot count as done. Slots after it,
/// or any slot when the user has no history, fall back to their content.
pub fn target_status(slot: &PlanWorkout, last_touched: Option<&PlanWorkout>) -> CompletionStatus {
    match last_touched {
        Some(last) if slot.position() <= last.position() => CompletionStatus::Completed,
        _ => status_by_content(slot),
    }
}

/// Whether a candidate is due for a write at `cursor`.
///
/// With history, only days already past in the cursor's own week are
/// written. Without history, every slot up to and including today is.
pub fn is_due(slot: &PlanWorkout, cursor: &Cursor, last_touched: Option<&PlanWorkout>) -> bool {
    match last_touched {
        Some(_) => cursor.is_current_week(slot.phase, slot.week) && slot.day < cursor.day_of_week,
        None => slot.position() <= cursor.position(),
    }
}

/// Compute the backfill writes for a plan's slots, in slot order.
pub fn plan_backfill(
    slots: &[PlanWorkout],
    cursor: &Cursor,
    last_touched: Option<&PlanWorkout>,
) -> Vec<BackfillWrite> {
    let mut writes: Vec<BackfillWrite> = slots
        .iter()
        .filter(|slot| is_rest_candidate(slot))
        .filter(|slot| is_due(slot, cursor, last_touched))
        .map(|slot| BackfillWrite {
            plan_workout_id: slot.id,
            position: slot.position(),
            status: target_status(slot, last_touched),
        })
        .collect();
    writes.sort_by_key(|w| w.position);
    writes
}
