//! Database query functions for the `organizations`, `users`, and
//! `workouts` tables.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Organization, User, Workout};

/// Insert a new organization. Names are unique.
pub async fn insert_organization(pool: &PgPool, name: &str) -> Result<Organization> {
    let org = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name) VALUES ($1) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert organization {name:?}"))?;

    Ok(org)
}

pub async fn get_organization_by_name(pool: &PgPool, name: &str) -> Result<Option<Organization>> {
    let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("failed to fetch organization")?;

    Ok(org)
}

/// Insert a new user, optionally as an employee of an organization.
pub async fn insert_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    organization_id: Option<Uuid>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, organization_id) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(organization_id)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert user {email:?}"))?;

    Ok(user)
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Insert or refresh a catalogue workout by name.
///
/// Takes a connection so plan creation can run it inside its transaction.
/// A `None` description keeps whatever description is already stored.
pub async fn upsert_workout(
    conn: &mut PgConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Workout> {
    let workout = sqlx::query_as::<_, Workout>(
        "INSERT INTO workouts (name, description) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE \
         SET description = COALESCE(EXCLUDED.description, workouts.description) \
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to upsert workout {name:?}"))?;

    Ok(workout)
}

pub async fn get_workout_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await
        .with_context(|| format!("failed to look up workout {name:?}"))?;

    Ok(workout)
}

/// List the workout catalogue ordered by name.
pub async fn list_workouts(pool: &PgPool) -> Result<Vec<Workout>> {
    let workouts = sqlx::query_as::<_, Workout>("SELECT * FROM workouts ORDER BY name")
        .fetch_all(pool)
        .await
        .context("failed to list workouts")?;

    Ok(workouts)
}
