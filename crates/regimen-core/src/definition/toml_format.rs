//! TOML format types for plan definition files.
//!
//! Phase, week and day numbers are implied by position in the file
//! (1-based), so a definition can never describe overlapping slots.

use serde::{Deserialize, Serialize};

/// Top-level structure of a plan definition file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanDefinition {
    pub plan: PlanMeta,
    /// Catalogue entries to upsert by name before slots are inserted.
    #[serde(default)]
    pub workouts: Vec<WorkoutDef>,
    #[serde(default)]
    pub phases: Vec<PhaseDef>,
}

/// Plan-level metadata in `[plan]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeta {
    pub name: String,
    /// "program" or "on_demand".
    #[serde(rename = "type", default = "default_plan_type")]
    pub plan_type: String,
}

/// A `[[workouts]]` catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    #[serde(default)]
    pub weeks: Vec<WeekDef>,
}

/// One week. An empty `days` list is a week with nothing scheduled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeekDef {
    #[serde(default)]
    pub days: Vec<DayDef>,
}

/// One day slot: a workout, a pure rest day, or a rest-flagged day that
/// still carries a workout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DayDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout: Option<String>,
    #[serde(default)]
    pub rest: bool,
}

/// A day together with its implied position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedDay<'a> {
    pub phase: i32,
    pub week: i32,
    pub day: i32,
    pub def: &'a DayDef,
}

impl PlanDefinition {
    /// Every day in (phase, week, day) order with its 1-based position.
    pub fn days(&self) -> impl Iterator<Item = PositionedDay<'_>> {
        self.phases.iter().zip(1..).flat_map(|(phase, p)| {
            phase.weeks.iter().zip(1..).flat_map(move |(week, w)| {
                week.days.iter().zip(1..).map(move |(def, d)| PositionedDay {
                    phase: p,
                    week: w,
                    day: d,
                    def,
                })
            })
        })
    }
}

fn default_plan_type() -> String {
    "program".to_string()
}
