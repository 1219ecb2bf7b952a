use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of plan: a structured multi-phase program or an unstructured
/// on-demand collection of workouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Program,
    OnDemand,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Program => "program",
            Self::OnDemand => "on_demand",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanType {
    type Err = PlanTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "program" => Ok(Self::Program),
            "on_demand" => Ok(Self::OnDemand),
            other => Err(PlanTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanType`] string.
#[derive(Debug, Clone)]
pub struct PlanTypeParseError(pub String);

impl fmt::Display for PlanTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan type: {:?}", self.0)
    }
}

impl std::error::Error for PlanTypeParseError {}

// ---------------------------------------------------------------------------

/// Completion status of a plan workout for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for CompletionStatus {
    type Err = CompletionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(CompletionStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`CompletionStatus`] string.
#[derive(Debug, Clone)]
pub struct CompletionStatusParseError(pub String);

impl fmt::Display for CompletionStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid completion status: {:?}", self.0)
    }
}

impl std::error::Error for CompletionStatusParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A catalogue workout that plan day slots point at.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A training plan template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub plan_type: PlanType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One scheduled day slot within a plan's phase/week/day grid.
///
/// A slot with no `workout_id` is a pure rest day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlanWorkout {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub phase: i32,
    pub week: i32,
    pub day: i32,
    pub is_rest: bool,
    pub workout_id: Option<Uuid>,
}

impl PlanWorkout {
    /// Lexicographic (phase, week, day) position.
    pub fn position(&self) -> (i32, i32, i32) {
        (self.phase, self.week, self.day)
    }
}

/// Binds a user, or every user of an organization, to a plan for a date
/// window. An open `end_date` never expires.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanAssignment {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl PlanAssignment {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Completion fact for (user, plan, plan workout).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCompletedWorkout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub plan_workout_id: Uuid,
    pub status: CompletionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Set when the row was synthesised by the rest-day backfill rather
    /// than written by a user action.
    pub backfilled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
