//! CLI handlers for `regimen workout start|complete`.

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;

use regimen_core::workout::{complete_workout, start_workout};
use regimen_db::models::UserCompletedWorkout;

use crate::WorkoutCommands;
use crate::resolve::{parse_uuid, resolve_user_id};

pub async fn run_workout_command(command: WorkoutCommands, pool: &PgPool) -> Result<()> {
    let (user, plan, slot, starting) = match command {
        WorkoutCommands::Start {
            user,
            plan,
            plan_workout_id,
        } => (user, plan, plan_workout_id, true),
        WorkoutCommands::Complete {
            user,
            plan,
            plan_workout_id,
        } => (user, plan, plan_workout_id, false),
    };

    let user_id = resolve_user_id(pool, &user).await?;
    let plan_id = parse_uuid("plan", &plan)?;
    let plan_workout_id = parse_uuid("plan workout", &slot)?;
    let now = Utc::now();

    let row = if starting {
        start_workout(pool, user_id, plan_id, plan_workout_id, now).await?
    } else {
        complete_workout(pool, user_id, plan_id, plan_workout_id, now).await?
    };

    print_row(&row);
    Ok(())
}

fn print_row(row: &UserCompletedWorkout) {
    println!("Workout {}.", row.status);
    println!("  Plan workout: {}", row.plan_workout_id);
    if let Some(start) = row.start_time {
        println!("  Started:      {}", start.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(end) = row.end_time {
        println!("  Ended:        {}", end.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
