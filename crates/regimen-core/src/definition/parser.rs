//! Plan definition parser with validation.
//!
//! Parses a definition string into a [`PlanDefinition`] and validates:
//! - The plan type is a valid enum variant.
//! - Workout names in `[[workouts]]` are non-empty and unique.
//! - Every day names a workout or is marked as rest.
//! - The plan schedules at least one day.
//! - Phase, week and day counts fit the slot grid.

use std::collections::HashSet;
use std::path::Path;

use regimen_db::models::PlanType;
use thiserror::Error;

use super::toml_format::PlanDefinition;
use crate::progress::structure::MAX_GRID_INDEX;

/// Errors that can occur while loading and validating a plan definition.
#[derive(Debug, Error)]
pub enum PlanDefinitionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("plan name must not be empty")]
    EmptyPlanName,

    #[error("invalid plan type {0:?} (expected program or on_demand)")]
    InvalidPlanType(String),

    #[error("workout names must not be empty")]
    EmptyWorkoutName,

    #[error("duplicate workout name: {0:?}")]
    DuplicateWorkoutName(String),

    #[error("phase {phase} week {week} day {day} has neither a workout nor rest = true")]
    EmptyDay { phase: i32, week: i32, day: i32 },

    #[error("plan must contain at least one phase")]
    NoPhases,

    #[error("plan must schedule at least one day")]
    NoDays,

    #[error("too many {what}: {count} (limit {limit})")]
    GridTooLarge {
        what: &'static str,
        count: usize,
        limit: i32,
    },
}

/// Parse and validate a plan definition string.
pub fn parse_plan_definition(content: &str) -> Result<PlanDefinition, PlanDefinitionError> {
    let def: PlanDefinition = toml::from_str(content)?;
    validate(&def)?;
    Ok(def)
}

/// Read, parse and validate a plan definition file.
pub fn load_definition_file(path: &Path) -> Result<PlanDefinition, PlanDefinitionError> {
    let content = std::fs::read_to_string(path).map_err(|source| PlanDefinitionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_plan_definition(&content)
}

impl PlanDefinition {
    /// The declared plan type. Only valid after validation.
    pub fn plan_type(&self) -> Result<PlanType, PlanDefinitionError> {
        self.plan
            .plan_type
            .parse()
            .map_err(|_| PlanDefinitionError::InvalidPlanType(self.plan.plan_type.clone()))
    }
}

fn validate(def: &PlanDefinition) -> Result<(), PlanDefinitionError> {
    if def.plan.name.trim().is_empty() {
        return Err(PlanDefinitionError::EmptyPlanName);
    }

    def.plan_type()?;

    let mut seen = HashSet::new();
    for workout in &def.workouts {
        if workout.name.trim().is_empty() {
            return Err(PlanDefinitionError::EmptyWorkoutName);
        }
        if !seen.insert(workout.name.as_str()) {
            return Err(PlanDefinitionError::DuplicateWorkoutName(
                workout.name.clone(),
            ));
        }
    }

    check_grid("phases", def.phases.len())?;
    for phase in &def.phases {
        check_grid("weeks in a phase", phase.weeks.len())?;
        for week in &phase.weeks {
            check_grid("days in a week", week.days.len())?;
        }
    }

    for day in def.days() {
        let names_workout = day
            .def
            .workout
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if !names_workout && !day.def.rest {
            return Err(PlanDefinitionError::EmptyDay {
                phase: day.phase,
                week: day.week,
                day: day.day,
            });
        }
    }

    if def.phases.is_empty() {
        return Err(PlanDefinitionError::NoPhases);
    }
    if def.days().next().is_none() {
        return Err(PlanDefinitionError::NoDays);
    }

    Ok(())
}

fn check_grid(what: &'static str, count: usize) -> Result<(), PlanDefinitionError> {
    if count > MAX_GRID_INDEX as usize {
        return Err(PlanDefinitionError::GridTooLarge {
            what,
            count,
            limit: MAX_GRID_INDEX,
        });
    }
    Ok(())
}
