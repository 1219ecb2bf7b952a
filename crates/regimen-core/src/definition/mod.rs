//! Plan definitions: the TOML authoring format, validation, and creation of
//! plans from a definition.

pub mod parser;
pub mod service;
pub mod toml_format;

pub use parser::{PlanDefinitionError, load_definition_file, parse_plan_definition};
pub use service::{create_plan_from_definition, get_plan_with_slots};
pub use toml_format::{DayDef, PhaseDef, PlanDefinition, PlanMeta, WeekDef, WorkoutDef};
