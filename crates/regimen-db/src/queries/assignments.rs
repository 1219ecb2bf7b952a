//! Database query functions for the `plan_assignments` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlanAssignment;

/// Who an assignment binds the plan to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    User(Uuid),
    Organization(Uuid),
}

/// Insert an assignment for a user or an organization.
pub async fn insert_assignment(
    pool: &PgPool,
    plan_id: Uuid,
    assignee: Assignee,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<PlanAssignment> {
    let (user_id, organization_id) = match assignee {
        Assignee::User(id) => (Some(id), None),
        Assignee::Organization(id) => (None, Some(id)),
    };

    let assignment = sqlx::query_as::<_, PlanAssignment>(
        "INSERT INTO plan_assignments (plan_id, user_id, organization_id, start_date, end_date) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(user_id)
    .bind(organization_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to assign plan {plan_id}"))?;

    Ok(assignment)
}

/// Find the assignment that applies to `user_id` on `date`.
///
/// Considers assignments made to the user directly and to the user's
/// organization, restricted to active plans whose window contains `date`.
/// Direct assignments win over organization ones; within each group the
/// latest start date wins.
pub async fn find_active_assignment(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<PlanAssignment>> {
    let assignment = sqlx::query_as::<_, PlanAssignment>(
        "SELECT pa.* \
         FROM plan_assignments pa \
         JOIN plans p ON p.id = pa.plan_id \
         WHERE p.is_active \
           AND pa.start_date <= $2 \
           AND (pa.end_date IS NULL OR pa.end_date >= $2) \
           AND ( \
               pa.user_id = $1 \
               OR pa.organization_id = (SELECT organization_id FROM users WHERE id = $1) \
           ) \
         ORDER BY (pa.user_id IS NOT NULL) DESC, pa.start_date DESC, pa.created_at DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to find active assignment for user {user_id}"))?;

    Ok(assignment)
}

/// List every assignment of a plan, newest start first.
pub async fn list_assignments_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlanAssignment>> {
    let rows = sqlx::query_as::<_, PlanAssignment>(
        "SELECT * FROM plan_assignments WHERE plan_id = $1 ORDER BY start_date DESC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list plan assignments")?;

    Ok(rows)
}
