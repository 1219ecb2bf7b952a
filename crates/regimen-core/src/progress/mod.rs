//! Plan-day resolution: where a user is in a program today, and
//! reconciliation of the rest days they have already passed.

pub mod backfill;
pub mod cursor;
pub mod service;
pub mod structure;

pub use backfill::{BackfillReport, BackfillWrite, plan_backfill};
pub use cursor::Cursor;
pub use service::{MyPlan, MyPlanView, PlanTotals, SlotRequest, SlotSelection, resolve_my_plan};
pub use structure::{PlanStructure, StructureError};
