//! CLI handler for `regimen assign`.

use anyhow::{Result, bail};
use chrono::Utc;
use sqlx::PgPool;

use regimen_db::queries::assignments::{self, Assignee};
use regimen_db::queries::plans;

use crate::resolve::{parse_date, parse_date_or, parse_uuid, resolve_organization_id, resolve_user_id};

pub struct AssignArgs {
    pub plan: String,
    pub user: Option<String>,
    pub organization: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn run_assign(pool: &PgPool, args: &AssignArgs) -> Result<()> {
    let plan_id = parse_uuid("plan", &args.plan)?;
    let Some(plan) = plans::get_plan(pool, plan_id).await? else {
        bail!("plan {plan_id} not found");
    };

    let assignee = match (args.user.as_deref(), args.organization.as_deref()) {
        (Some(user), None) => Assignee::User(resolve_user_id(pool, user).await?),
        (None, Some(org)) => Assignee::Organization(resolve_organization_id(pool, org).await?),
        _ => bail!("specify exactly one of --user or --organization"),
    };

    let start = parse_date_or(args.start.as_deref(), Utc::now().date_naive())?;
    let end = args.end.as_deref().map(parse_date).transpose()?;
    if let Some(end) = end.filter(|end| *end < start) {
        bail!("end date {end} is before start date {start}");
    }

    let assignment = assignments::insert_assignment(pool, plan.id, assignee, start, end).await?;
    tracing::info!(assignment_id = %assignment.id, plan_id = %plan.id, "plan assigned");

    println!("Plan assigned.");
    println!("  Assignment ID: {}", assignment.id);
    println!("  Plan:          {} ({})", plan.name, plan.id);
    match assignee {
        Assignee::User(id) => println!("  User:          {id}"),
        Assignee::Organization(id) => println!("  Organization:  {id}"),
    }
    println!("  Start:         {}", assignment.start_date);
    match assignment.end_date {
        Some(end) => println!("  End:           {end}"),
        None => println!("  End:           (open-ended)"),
    }
    if !plan.is_active {
        println!();
        println!("Warning: plan is inactive and will not be resolved until reactivated.");
    }

    Ok(())
}
