//! CLI handlers for `regimen plan` subcommands.
//!
//! Implements:
//! - `regimen plan create <file>` -- create a plan from a TOML definition
//! - `regimen plan show <plan-id>` -- show structure and day slots
//! - `regimen plan list`          -- list all plans
//! - `regimen plan activate|deactivate <plan-id>`

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use regimen_core::definition::{
    create_plan_from_definition, get_plan_with_slots, load_definition_file,
};
use regimen_core::progress::PlanTotals;
use regimen_db::queries::{assignments, directory, plans as plan_queries};

use crate::PlanCommands;
use crate::resolve::parse_uuid;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::Create { file } => cmd_create(pool, &file).await,
        PlanCommands::Show { plan_id } => cmd_show(pool, &plan_id).await,
        PlanCommands::List => cmd_list(pool).await,
        PlanCommands::Activate { plan_id } => cmd_set_active(pool, &plan_id, true).await,
        PlanCommands::Deactivate { plan_id } => cmd_set_active(pool, &plan_id, false).await,
    }
}

// -----------------------------------------------------------------------
// regimen plan create <file>
// -----------------------------------------------------------------------

async fn cmd_create(pool: &PgPool, file_path: &str) -> Result<()> {
    let def = load_definition_file(Path::new(file_path))?;
    let plan = create_plan_from_definition(pool, &def).await?;
    let (_, slots) = get_plan_with_slots(pool, plan.id).await?;
    let totals = PlanTotals::from_slots(plan.id, &slots);

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:  {}", plan.id);
    println!("  Name:     {}", plan.name);
    println!("  Type:     {}", plan.plan_type);
    println!("  Phases:   {}", totals.phases);
    println!("  Weeks:    {}", totals.weeks);
    println!("  Days:     {}", totals.days);
    println!(
        "  Rest:     {}",
        slots.iter().filter(|s| s.is_rest).count()
    );

    Ok(())
}

// -----------------------------------------------------------------------
// regimen plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_uuid("plan", plan_id_str)?;
    let (plan, slots) = get_plan_with_slots(pool, plan_id).await?;
    let totals = PlanTotals::from_slots(plan.id, &slots);
    let assigned = assignments::list_assignments_for_plan(pool, plan.id).await?;

    println!("Plan: {}", plan.name);
    println!("  ID:          {}", plan.id);
    println!("  Type:        {}", plan.plan_type);
    println!("  Active:      {}", if plan.is_active { "yes" } else { "no" });
    println!(
        "  Created:     {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Structure:   {} phases, {} weeks, {} days",
        totals.phases, totals.weeks, totals.days
    );
    println!("  Assignments: {}", assigned.len());

    if slots.is_empty() {
        return Ok(());
    }

    let names: HashMap<Uuid, String> = directory::list_workouts(pool)
        .await?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect();

    println!();
    println!("{:>5}  {:>4}  {:>3}  {:<4}  {:<36}  WORKOUT", "PHASE", "WEEK", "DAY", "REST", "SLOT ID");
    for slot in &slots {
        let workout = slot
            .workout_id
            .and_then(|id| names.get(&id))
            .map_or("-", String::as_str);
        println!(
            "{:>5}  {:>4}  {:>3}  {:<4}  {:<36}  {}",
            slot.phase,
            slot.week,
            slot.day,
            if slot.is_rest { "yes" } else { "" },
            slot.id,
            workout,
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// regimen plan list
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let plans = plan_queries::list_plans(pool).await?;

    if plans.is_empty() {
        println!("No plans found. Use `regimen plan create <file>` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let name_w = plans.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let type_w = 9;

    println!(
        "{:<id_w$}  {:<name_w$}  {:<type_w$}  {:<6}  CREATED",
        "ID", "NAME", "TYPE", "ACTIVE",
    );
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<name_w$}  {:<type_w$}  {:<6}  {}",
            plan.id,
            plan.name,
            plan.plan_type.to_string(),
            if plan.is_active { "yes" } else { "no" },
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

async fn cmd_set_active(pool: &PgPool, plan_id_str: &str, active: bool) -> Result<()> {
    let plan_id = parse_uuid("plan", plan_id_str)?;
    plan_queries::set_plan_active(pool, plan_id, active).await?;
    tracing::info!(%plan_id, active, "plan activity changed");
    println!(
        "Plan {plan_id} {}.",
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}
