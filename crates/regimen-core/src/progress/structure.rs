//! Phase/week/day shape of a program, derived from its day slots.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use regimen_db::models::PlanWorkout;

/// Data-integrity problems found while deriving a [`PlanStructure`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("plan workout {id} has invalid position phase {phase} week {week} day {day}")]
    InvalidPosition {
        id: Uuid,
        phase: i32,
        week: i32,
        day: i32,
    },
}

/// One week of a phase. `day_count` is the highest day number scheduled in
/// the week, or zero for a week with no slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekShape {
    pub week: i32,
    pub day_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseShape {
    pub phase: i32,
    pub weeks: Vec<WeekShape>,
}

/// Grid counts are bounded by `MAX_GRID_INDEX`; saturate rather than wrap.
fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl PhaseShape {
    pub fn week_count(&self) -> i32 {
        count(self.weeks.len())
    }
}

/// Largest phase, week or day number accepted in a slot position.
pub const MAX_GRID_INDEX: i32 = 1_000;

/// Ordered phase -> week -> day-count hierarchy of a program.
///
/// Phases are numbered `1..=max(phase)` and each phase's weeks
/// `1..=max(week)`. Numbers that no slot uses are still present, as a phase
/// with no weeks or a week with zero days, so gaps in the grid never shift
/// the numbering of what follows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanStructure {
    phases: Vec<PhaseShape>,
}

impl PlanStructure {
    /// Derive the structure from a plan's slots (any order).
    pub fn from_slots(slots: &[PlanWorkout]) -> Result<Self, StructureError> {
        let mut phases: Vec<PhaseShape> = Vec::new();

        for slot in slots {
            let in_range = |n: i32| (1..=MAX_GRID_INDEX).contains(&n);
            if !(in_range(slot.phase) && in_range(slot.week) && in_range(slot.day)) {
                return Err(StructureError::InvalidPosition {
                    id: slot.id,
                    phase: slot.phase,
                    week: slot.week,
                    day: slot.day,
                });
            }

            let phase_idx = (slot.phase - 1) as usize;
            while phases.len() <= phase_idx {
                let phase = count(phases.len() + 1);
                phases.push(PhaseShape {
                    phase,
                    weeks: Vec::new(),
                });
            }

            let weeks = &mut phases[phase_idx].weeks;
            let week_idx = (slot.week - 1) as usize;
            while weeks.len() <= week_idx {
                let week = count(weeks.len() + 1);
                weeks.push(WeekShape { week, day_count: 0 });
            }

            let shape = &mut weeks[week_idx];
            shape.day_count = shape.day_count.max(slot.day);
        }

        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[PhaseShape] {
        &self.phases
    }

    pub fn phase(&self, phase: i32) -> Option<&PhaseShape> {
        usize::try_from(phase)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|idx| self.phases.get(idx))
    }

    pub fn total_phases(&self) -> i32 {
        count(self.phases.len())
    }

    pub fn total_weeks(&self) -> i32 {
        self.phases.iter().map(PhaseShape::week_count).sum()
    }

    /// Sum of every week's day count.
    pub fn total_days(&self) -> i32 {
        self.phases
            .iter()
            .flat_map(|p| p.weeks.iter())
            .map(|w| w.day_count)
            .sum()
    }

    /// True when no phase contributes any week.
    pub fn is_empty(&self) -> bool {
        self.total_weeks() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(phase: i32, week: i32, day: i32) -> PlanWorkout {
        PlanWorkout {
            id: Uuid::new_v4(),
            plan_id: Uuid::nil(),
            phase,
            week,
            day,
            is_rest: false,
            workout_id: None,
        }
    }

    #[test]
    fn derives_week_lengths_from_max_day() {
        let slots = vec![slot(1, 1, 1), slot(1, 1, 5), slot(1, 2, 3), slot(2, 1, 7)];
        let s = PlanStructure::from_slots(&slots).unwrap();

        assert_eq!(s.total_phases(), 2);
        assert_eq!(s.total_weeks(), 3);
        assert_eq!(s.phase(1).unwrap().weeks[0].day_count, 5);
        assert_eq!(s.phase(1).unwrap().weeks[1].day_count, 3);
        assert_eq!(s.phase(2).unwrap().weeks[0].day_count, 7);
        assert_eq!(s.total_days(), 15);
    }

    #[test]
    fn slot_order_does_not_matter() {
        let forward = vec![slot(1, 1, 1), slot(1, 2, 2), slot(2, 1, 3)];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            PlanStructure::from_slots(&forward).unwrap(),
            PlanStructure::from_slots(&backward).unwrap()
        );
    }

    #[test]
    fn gaps_become_empty_weeks_and_phases() {
        // Phase 2 has no slots; phase 1 skips week 2.
        let slots = vec![slot(1, 1, 1), slot(1, 3, 1), slot(3, 1, 2)];
        let s = PlanStructure::from_slots(&slots).unwrap();

        assert_eq!(s.total_phases(), 3);
        assert_eq!(s.phase(1).unwrap().week_count(), 3);
        assert_eq!(s.phase(1).unwrap().weeks[1].day_count, 0);
        assert_eq!(s.phase(2).unwrap().week_count(), 0);
        assert_eq!(s.total_weeks(), 4);
    }

    #[test]
    fn empty_slots_yield_empty_structure() {
        let s = PlanStructure::from_slots(&[]).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.total_phases(), 0);
        assert_eq!(s.total_days(), 0);
        assert!(s.phase(1).is_none());
    }

    #[test]
    fn rejects_non_positive_positions() {
        let bad = slot(1, 0, 3);
        let err = PlanStructure::from_slots(&[slot(1, 1, 1), bad.clone()]).unwrap_err();
        assert_eq!(
            err,
            StructureError::InvalidPosition {
                id: bad.id,
                phase: 1,
                week: 0,
                day: 3,
            }
        );
    }

    #[test]
    fn rejects_positions_past_grid_limit() {
        let err = PlanStructure::from_slots(&[slot(MAX_GRID_INDEX + 1, 1, 1)]);
        assert!(matches!(err, Err(StructureError::InvalidPosition { .. })));
    }

    #[test]
    fn phase_lookup_out_of_range() {
        let s = PlanStructure::from_slots(&[slot(1, 1, 1)]).unwrap();
        assert!(s.phase(0).is_none());
        assert!(s.phase(2).is_none());
    }

    #[test]
    fn counts_saturate() {
        assert_eq!(count(3), 3);
        assert_eq!(count(usize::MAX), i32::MAX);
    }
}
