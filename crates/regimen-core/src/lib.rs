//! Training plan domain logic: plan definitions, plan-day resolution with
//! rest-day backfill, and user workout actions.

pub mod definition;
pub mod progress;
pub mod workout;
