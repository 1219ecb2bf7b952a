//! CLI handler for `regimen my-plan`.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use regimen_core::progress::{MyPlan, MyPlanView, SlotRequest, resolve_my_plan};

use crate::resolve::{parse_date_or, resolve_user_id};

pub struct MyPlanArgs {
    pub user: String,
    pub date: Option<String>,
    pub request: SlotRequest,
    pub json: bool,
}

pub async fn run_my_plan(pool: &PgPool, args: &MyPlanArgs) -> Result<()> {
    let user_id = resolve_user_id(pool, &args.user).await?;
    let today = parse_date_or(args.date.as_deref(), Utc::now().date_naive())?;

    let result = resolve_my_plan(pool, user_id, today, args.request).await?;

    if args.json {
        let out = serde_json::to_string_pretty(&result).context("failed to serialize view")?;
        println!("{out}");
        return Ok(());
    }

    match result {
        MyPlan::NoPlanAssigned => println!("No plan assigned for {today}."),
        MyPlan::Assigned(view) => print_view(&view),
    }
    Ok(())
}

fn print_view(view: &MyPlanView) {
    println!("Plan: {} ({})", view.plan.name, view.plan.plan_type);
    println!("  ID:        {}", view.plan.id);
    println!("  Started:   {}", view.assignment.start_date);
    println!(
        "  Structure: {} phases, {} weeks, {} days",
        view.totals.phases, view.totals.weeks, view.totals.days
    );

    if let Some(cursor) = &view.cursor {
        println!(
            "  Today:     phase {} week {} day {} (week {} overall, day {} since start)",
            cursor.phase,
            cursor.week_in_phase,
            cursor.day_of_week,
            cursor.absolute_week,
            cursor.days_elapsed + 1,
        );
        if cursor.overrun {
            println!("             program finished; showing its last week");
        }
    }
    if let Some(sel) = &view.selected {
        println!("  Showing:   phase {} week {} day {}", sel.phase, sel.week, sel.day);
    }
    let report = &view.backfill;
    if report.writes() > 0 {
        println!(
            "  Backfill:  {} rest days recorded, {} updated",
            report.inserted, report.updated
        );
    }

    println!();
    if view.workouts.is_empty() {
        println!("No workouts scheduled.");
        return;
    }

    println!(
        "{:<11}  {:<4}  {:<12}  {:<36}  WORKOUT",
        "SLOT", "REST", "STATUS", "PLAN WORKOUT ID"
    );
    for w in &view.workouts {
        let slot = format!("{}/{}/{}", w.phase, w.week, w.day);
        let status = w.status.map_or_else(|| "-".to_string(), |s| s.to_string());
        println!(
            "{:<11}  {:<4}  {:<12}  {:<36}  {}",
            slot,
            if w.is_rest { "yes" } else { "" },
            status,
            w.plan_workout_id,
            w.workout_name.as_deref().unwrap_or("-"),
        );
    }
}
