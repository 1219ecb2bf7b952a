//! Plan definition service layer.
//!
//! Creates a plan from a validated [`PlanDefinition`], inserting the plan
//! row, catalogue workouts and day slots within a single database
//! transaction.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use regimen_db::models::{Plan, PlanWorkout};
use regimen_db::queries::plan_workouts::{self, NewPlanWorkout};
use regimen_db::queries::{directory, plans};

use super::toml_format::PlanDefinition;

/// Create a plan and all its day slots from a validated [`PlanDefinition`].
///
/// Workouts declared in `[[workouts]]` are upserted into the catalogue by
/// name. Days may also reference workouts that already exist in the
/// catalogue. If any referenced workout is unknown, the whole operation
/// fails and the transaction is rolled back.
pub async fn create_plan_from_definition(pool: &PgPool, def: &PlanDefinition) -> Result<Plan> {
    let plan_type = def.plan_type()?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let plan = plans::insert_plan(&mut *tx, &def.plan.name, plan_type).await?;

    let mut workout_ids: HashMap<&str, Uuid> = HashMap::new();
    for workout in &def.workouts {
        let row =
            directory::upsert_workout(&mut *tx, &workout.name, workout.description.as_deref())
                .await?;
        workout_ids.insert(workout.name.as_str(), row.id);
    }

    let mut missing: Vec<String> = Vec::new();
    let mut inserted = 0usize;

    for day in def.days() {
        let workout_id = match day.def.workout.as_deref().filter(|n| !n.trim().is_empty()) {
            None => None,
            Some(name) => match workout_ids.get(name) {
                Some(id) => Some(*id),
                None => match directory::get_workout_by_name(&mut *tx, name).await? {
                    Some(existing) => {
                        workout_ids.insert(name, existing.id);
                        Some(existing.id)
                    }
                    None => {
                        missing.push(format!(
                            "workout {name:?} referenced by phase {} week {} day {} does not exist",
                            day.phase, day.week, day.day
                        ));
                        continue;
                    }
                },
            },
        };

        let new = NewPlanWorkout {
            plan_id: plan.id,
            phase: day.phase,
            week: day.week,
            day: day.day,
            is_rest: day.def.rest,
            workout_id,
        };
        plan_workouts::insert_plan_workout(&mut *tx, &new).await?;
        inserted += 1;
    }

    if !missing.is_empty() {
        // Transaction rolls back on drop (no commit).
        bail!(
            "plan references unknown workouts:\n  {}",
            missing.join("\n  ")
        );
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        plan_id = %plan.id,
        name = %plan.name,
        plan_type = %plan.plan_type,
        slots = inserted,
        "plan created"
    );
    Ok(plan)
}

/// Fetch a plan and all its day slots.
pub async fn get_plan_with_slots(pool: &PgPool, plan_id: Uuid) -> Result<(Plan, Vec<PlanWorkout>)> {
    let plan = plans::get_plan(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;

    let slots = plan_workouts::list_plan_workouts(pool, plan_id).await?;

    Ok((plan, slots))
}
