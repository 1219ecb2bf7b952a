//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Plan, PlanType};

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at, is_active).
pub async fn insert_plan(conn: &mut PgConnection, name: &str, plan_type: PlanType) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (name, plan_type) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(name)
    .bind(plan_type)
    .fetch_one(conn)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List all plans, ordered by creation time (newest first).
pub async fn list_plans(pool: &PgPool) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>("SELECT * FROM plans ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .context("failed to list plans")?;

    Ok(plans)
}

/// Activate or retire a plan. Inactive plans are ignored by assignment
/// resolution.
pub async fn set_plan_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE plans SET is_active = $1 WHERE id = $2")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update plan activity")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}
