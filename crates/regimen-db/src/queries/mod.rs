pub mod assignments;
pub mod completions;
pub mod directory;
pub mod plan_workouts;
pub mod plans;
