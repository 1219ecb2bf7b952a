//! PostgreSQL persistence for regimen: configuration, pool, row models and
//! query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
