mod assign_cmd;
mod config;
mod directory_cmds;
mod plan_cmds;
mod progress_cmd;
mod resolve;
mod serve_cmd;
#[cfg(test)]
mod test_util;
mod workout_cmds;

use clap::{Parser, Subcommand};

use regimen_db::pool;

use config::RegimenConfig;

#[derive(Parser)]
#[command(name = "regimen", about = "Training plan progress service")]
struct Cli {
    /// Database URL (overrides REGIMEN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a regimen config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/regimen")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the regimen database (requires config file or env vars)
    DbInit,
    /// Organization management
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },
    /// User management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Assign a plan to a user or an organization
    Assign {
        /// Plan ID
        #[arg(long)]
        plan: String,
        /// User ID or email
        #[arg(long, conflicts_with = "organization", required_unless_present = "organization")]
        user: Option<String>,
        /// Organization ID or name
        #[arg(long)]
        organization: Option<String>,
        /// First day of the plan (YYYY-MM-DD, default: today)
        #[arg(long)]
        start: Option<String>,
        /// Last day of the assignment (YYYY-MM-DD, default: open-ended)
        #[arg(long)]
        end: Option<String>,
    },
    /// Show a user's plan for today (or another date)
    MyPlan {
        /// User ID or email
        #[arg(long)]
        user: String,
        /// Date to resolve (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Browse a specific phase instead of the current one
        #[arg(long)]
        phase: Option<i32>,
        /// Browse a specific week instead of the current one
        #[arg(long)]
        week: Option<i32>,
        /// Browse a specific day instead of the current one
        #[arg(long)]
        day: Option<i32>,
        /// Print the full view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record workout progress for a user
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides REGIMEN_BIND and the config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides REGIMEN_PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
pub enum OrgCommands {
    /// Add an organization
    Add {
        /// Unique organization name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user
    Add {
        /// Display name
        name: String,
        /// Unique email address
        #[arg(long)]
        email: String,
        /// Organization ID or name to join
        #[arg(long)]
        organization: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from a TOML definition file
    Create {
        /// Path to the plan definition file
        file: String,
    },
    /// Show a plan's structure and day slots
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// List all plans
    List,
    /// Make a plan resolvable for its assignees again
    Activate {
        /// Plan ID
        plan_id: String,
    },
    /// Retire a plan; its assignments stop resolving
    Deactivate {
        /// Plan ID
        plan_id: String,
    },
}

#[derive(Subcommand)]
pub enum WorkoutCommands {
    /// Mark a plan workout as started
    Start {
        /// User ID or email
        #[arg(long)]
        user: String,
        /// Plan ID
        #[arg(long)]
        plan: String,
        /// Plan workout (day slot) ID
        plan_workout_id: String,
    },
    /// Mark a plan workout as completed
    Complete {
        /// User ID or email
        #[arg(long)]
        user: String,
        /// Plan ID
        #[arg(long)]
        plan: String,
        /// Plan workout (day slot) ID
        plan_workout_id: String,
    },
}

/// Execute the `regimen init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
            max_connections: None,
        },
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server.bind  = {}", cfg.server.bind);
    println!("  server.port  = {}", cfg.server.port);
    println!();
    println!("Next: run `regimen db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `regimen db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = RegimenConfig::resolve(cli_db_url, None, None)?;

    println!("Initializing regimen database...");

    pool::ensure_database_exists(&resolved.db_config).await?;

    let db_pool = pool::create_pool(&resolved.db_config).await?;

    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("regimen db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Org { command } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = directory_cmds::run_org_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::User { command } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = directory_cmds::run_user_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Assign {
            plan,
            user,
            organization,
            start,
            end,
        } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let args = assign_cmd::AssignArgs {
                plan,
                user,
                organization,
                start,
                end,
            };
            let result = assign_cmd::run_assign(&db_pool, &args).await;
            db_pool.close().await;
            result?;
        }
        Commands::MyPlan {
            user,
            date,
            phase,
            week,
            day,
            json,
        } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let args = progress_cmd::MyPlanArgs {
                user,
                date,
                request: regimen_core::progress::SlotRequest { phase, week, day },
                json,
            };
            let result = progress_cmd::run_my_plan(&db_pool, &args).await;
            db_pool.close().await;
            result?;
        }
        Commands::Workout { command } => {
            let resolved = RegimenConfig::resolve(cli.database_url.as_deref(), None, None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = workout_cmds::run_workout_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved =
                RegimenConfig::resolve(cli.database_url.as_deref(), bind.as_deref(), port)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &resolved.bind, resolved.port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
