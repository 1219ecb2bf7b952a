//! Argument resolution for CLI commands.
//!
//! Users can be named by UUID or email, organizations by UUID or name.
//! Dates are `YYYY-MM-DD`.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use regimen_db::queries::directory;

/// Parse a UUID argument, naming the argument in the error.
pub fn parse_uuid(what: &str, input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).with_context(|| format!("invalid {what} ID: {input:?}"))
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date {input:?} (expected YYYY-MM-DD)"))
}

/// Parse an optional date argument, falling back to `default`.
pub fn parse_date_or(input: Option<&str>, default: NaiveDate) -> Result<NaiveDate> {
    input.map_or(Ok(default), parse_date)
}

/// Returns true if the input should be treated as an email address.
fn looks_like_email(input: &str) -> bool {
    input.contains('@')
}

/// Resolve a user given either a UUID or an email address.
pub async fn resolve_user_id(pool: &PgPool, input: &str) -> Result<Uuid> {
    if looks_like_email(input) {
        return match directory::get_user_by_email(pool, input).await? {
            Some(user) => Ok(user.id),
            None => bail!("no user with email {input:?}"),
        };
    }

    let id = parse_uuid("user", input)?;
    match directory::get_user(pool, id).await? {
        Some(user) => Ok(user.id),
        None => bail!("user {id} not found"),
    }
}

/// Resolve an organization given either a UUID or its unique name.
pub async fn resolve_organization_id(pool: &PgPool, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    match directory::get_organization_by_name(pool, input).await? {
        Some(org) => Ok(org.id),
        None => bail!("no organization named {input:?}"),
    }
}
