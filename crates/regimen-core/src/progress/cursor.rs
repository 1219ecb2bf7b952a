//! Resolve where "today" falls in a program.
//!
//! The cursor is derived purely from calendar time: every week of the
//! program is seven days long regardless of how many day slots it
//! schedules, and weeks are laid end to end across phases in order.

use chrono::NaiveDate;
use serde::Serialize;

use super::structure::PlanStructure;

/// Calendar days per program week.
pub const DAYS_PER_WEEK: i64 = 7;

/// Resolved (phase, week, day) position of a date within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub phase: i32,
    /// Week number within `phase` (1-based).
    pub week_in_phase: i32,
    /// Day of the current week (1..=7).
    pub day_of_week: i32,
    /// Week number counted from the start of the program (1-based).
    pub absolute_week: i32,
    pub days_elapsed: i64,
    /// The date lies past the last week of the program; the cursor was
    /// clamped to the last week of the last phase that has weeks.
    pub overrun: bool,
}

impl Cursor {
    /// Phase 1, week 1, day 1.
    pub fn origin() -> Self {
        Self {
            phase: 1,
            week_in_phase: 1,
            day_of_week: 1,
            absolute_week: 1,
            days_elapsed: 0,
            overrun: false,
        }
    }

    /// Resolve the cursor for `current` in a program started on `start`.
    ///
    /// A `current` date before `start` resolves like the start date itself.
    pub fn resolve(structure: &PlanStructure, start: NaiveDate, current: NaiveDate) -> Self {
        let days_elapsed = (current - start).num_days().max(0);
        if days_elapsed == 0 {
            return Self::origin();
        }

        let absolute_week =
            i32::try_from(days_elapsed / DAYS_PER_WEEK + 1).unwrap_or(i32::MAX);
        let day_of_week = (days_elapsed % DAYS_PER_WEEK + 1) as i32;

        let mut weeks_before = 0i32;
        for phase in structure.phases() {
            let weeks = phase.week_count();
            if weeks_before + weeks >= absolute_week {
                return Self {
                    phase: phase.phase,
                    week_in_phase: absolute_week - weeks_before,
                    day_of_week,
                    absolute_week,
                    days_elapsed,
                    overrun: false,
                };
            }
            weeks_before += weeks;
        }

        // Past the end of the program.
        match structure.phases().iter().rev().find(|p| p.week_count() > 0) {
            Some(last) => Self {
                phase: last.phase,
                week_in_phase: last.week_count(),
                day_of_week,
                absolute_week,
                days_elapsed,
                overrun: true,
            },
            None => Self {
                day_of_week,
                absolute_week,
                days_elapsed,
                ..Self::origin()
            },
        }
    }

    pub fn position(&self) -> (i32, i32, i32) {
        (self.phase, self.week_in_phase, self.day_of_week)
    }

    /// True when (`phase`, `week`) is the cursor's own week.
    pub fn is_current_week(&self, phase: i32, week: i32) -> bool {
        self.phase == phase && self.week_in_phase == week
    }
}
