mod runner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{LevelFilter, debug};
use std::sync::Arc;

use fitkage::catalog::{ExerciseApiClient, ExerciseCatalogService, ExerciseSource, RefreshOutcome};
use fitkage::config::{EngineConfig, ExerciseApiConfig};
use fitkage::db::{DEFAULT_DATABASE_URL, SqliteStore, WorkoutStore};
use fitkage::logging::{Target, init_logger, parse_level};
use fitkage::models::{
    DEFAULT_REPS, DEFAULT_REST_SECONDS, DEFAULT_SETS, ExerciseSettings, WorkoutPlan,
    format_duration_ms,
};
use fitkage::plans;
use fitkage::session::{Session, SessionEngine};

#[derive(Parser, Debug)]
#[command(version, about = "FitKage - Guided Workout CLI", long_about = None)]
struct Args {
    /// SQLite database url
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,
    /// Whose history sessions are saved under
    #[arg(short, long, env = "FITKAGE_USER", default_value = "local")]
    user: String,
    #[arg(long, env = "FITKAGE_LOG", default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workout plan interactively
    Run {
        /// Plan id or name
        plan: String,
    },
    /// Manage workout plans
    Plans {
        #[command(subcommand)]
        command: PlanCommand,
    },
    /// Browse and refresh the exercise catalog
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommand,
    },
    /// List saved workout sessions
    History {
        #[arg(short, long)]
        verbose: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PlanCommand {
    List {
        /// Only user-built plans
        #[arg(short, long)]
        custom: bool,
    },
    Show {
        plan: String,
    },
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    AddExercise {
        plan: String,
        exercise_id: String,
        #[arg(long, default_value_t = DEFAULT_SETS)]
        sets: u32,
        #[arg(long, default_value_t = DEFAULT_REPS)]
        reps: u32,
        #[arg(long, default_value_t = DEFAULT_REST_SECONDS)]
        rest: u32,
    },
    /// Import a plan from a JSON file
    Import {
        path: String,
    },
    Delete {
        plan: String,
    },
}

#[derive(Subcommand, Debug)]
enum ExerciseCommand {
    /// Fetch the remote catalog into the local cache
    Refresh,
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    BodyPart {
        body_part: String,
    },
    BodyParts,
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Delete all exercises, plans and sessions
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

/// Looks a plan up by id, then by case-insensitive name.
async fn resolve_plan(store: &SqliteStore, key: &str) -> Result<WorkoutPlan> {
    if let Some(plan) = store.plan(key).await? {
        return Ok(plan);
    }
    store
        .plans()
        .await?
        .into_iter()
        .find(|plan| plan.name.eq_ignore_ascii_case(key.trim()))
        .ok_or_else(|| anyhow::anyhow!("No plan with id or name '{}'", key))
}

fn catalog_service(store: &Arc<SqliteStore>) -> ExerciseCatalogService {
    let source: Option<Arc<dyn ExerciseSource>> =
        match ExerciseApiClient::new(ExerciseApiConfig::from_env()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                log::warn!("Exercise API client unavailable: {:#}", e);
                None
            }
        };
    ExerciseCatalogService::new(store.clone(), source)
}

fn print_plan(plan: &WorkoutPlan) {
    println!(
        "{} ({}){}",
        plan.name,
        plan.id,
        if plan.is_custom { " [custom]" } else { "" }
    );
    if !plan.description.is_empty() {
        println!("  {}", plan.description);
    }
    for (idx, entry) in plan.exercises.iter().enumerate() {
        println!(
            "  {}. {} - {} x {} reps, {}s rest",
            idx + 1,
            entry.exercise.name,
            entry.sets,
            entry.reps,
            entry.rest_seconds
        );
    }
}

async fn run_plan(store: Arc<SqliteStore>, user: &str, key: &str) -> Result<()> {
    let plan = resolve_plan(&store, key).await?;
    let engine = SessionEngine::with_current_runtime(EngineConfig::from_env())?;
    let session = Session::new(engine, store, user);

    let terminal = ratatui::init();
    let result = runner::run_workout(terminal, &session, &plan).await;
    ratatui::restore();

    match result? {
        Some(record) => {
            println!("{}", record.share_text());
            println!("\nSaved session {}", record.id);
        }
        None => println!("Workout not saved"),
    }
    Ok(())
}

async fn handle_plans(store: Arc<SqliteStore>, command: PlanCommand) -> Result<()> {
    match command {
        PlanCommand::List { custom } => {
            let plans = if custom {
                store.custom_plans().await?
            } else {
                store.plans().await?
            };
            if plans.is_empty() {
                println!("No plans found");
            }
            for plan in plans {
                println!(
                    "{}, {} ({} exercises){}",
                    plan.id,
                    plan.name,
                    plan.exercises.len(),
                    if plan.is_custom { " [custom]" } else { "" }
                );
            }
        }
        PlanCommand::Show { plan } => {
            print_plan(&resolve_plan(&store, &plan).await?);
        }
        PlanCommand::Create { name, description } => {
            let plan = plans::create_custom_plan(store.as_ref(), &name, &description).await?;
            println!("Created plan {} ({})", plan.name, plan.id);
        }
        PlanCommand::AddExercise {
            plan,
            exercise_id,
            sets,
            reps,
            rest,
        } => {
            let target = resolve_plan(&store, &plan).await?;
            let settings = ExerciseSettings {
                sets,
                reps,
                rest_seconds: rest,
            };
            let updated = plans::add_exercise_to_plan(
                store.as_ref(),
                store.as_ref(),
                &target.id,
                &exercise_id,
                settings,
            )
            .await?;
            print_plan(&updated);
        }
        PlanCommand::Import { path } => {
            let json = tokio::fs::read_to_string(&path).await?;
            let plan = plans::import_plan(store.as_ref(), &json).await?;
            println!("Imported plan {} ({})", plan.name, plan.id);
        }
        PlanCommand::Delete { plan } => {
            let target = resolve_plan(&store, &plan).await?;
            if store.delete_plan(&target.id).await? {
                println!("Deleted plan {}", target.name);
            }
        }
    }
    Ok(())
}

async fn handle_exercises(store: Arc<SqliteStore>, command: ExerciseCommand) -> Result<()> {
    let catalog = catalog_service(&store);
    match command {
        ExerciseCommand::Refresh => match catalog.refresh().await {
            RefreshOutcome::Updated(count) => println!("Cached {} exercises", count),
            RefreshOutcome::NoResults => println!("The exercise API returned no exercises"),
            RefreshOutcome::Unavailable(reason) => {
                println!("Refresh failed, keeping cached exercises: {}", reason)
            }
        },
        ExerciseCommand::Search { query } => {
            for exercise in catalog.search(&query).await? {
                println!("{}, {} [{}]", exercise.id, exercise.name, exercise.body_part);
            }
        }
        ExerciseCommand::BodyPart { body_part } => {
            let exercises = catalog.by_body_part(&body_part).await?;
            if exercises.is_empty() {
                println!("No exercises for '{}'", body_part);
            }
            for exercise in exercises {
                println!(
                    "{}, {} [{} / {}]",
                    exercise.id,
                    exercise.name,
                    exercise.body_part,
                    exercise.target.unwrap_or_default()
                );
            }
        }
        ExerciseCommand::BodyParts => {
            for part in catalog.body_parts().await? {
                println!("{}", part);
            }
        }
    }
    Ok(())
}

async fn handle_history(store: Arc<SqliteStore>, user: &str, verbose: bool) -> Result<()> {
    let sessions = store.sessions_for_user(user).await?;
    if sessions.is_empty() {
        println!("No saved sessions for {}", user);
    }
    for record in sessions {
        let rating = if record.rating == 0 {
            "unrated".to_string()
        } else {
            format!("{}/5", record.rating)
        };
        println!(
            "{}, {} - {} - {} - {}/{} exercises, {} kcal, {}",
            record.id,
            record.started_at.format("%Y-%m-%d %H:%M"),
            record.plan.name,
            format_duration_ms(record.total_duration_ms),
            record.completed_exercises,
            record.total_exercises,
            record.calories_burned,
            rating
        );
        if verbose {
            for entry in &record.plan.exercises {
                let reps: Vec<String> = entry.actual_reps.iter().map(u32::to_string).collect();
                println!(
                    "\t{} {}: [{}]",
                    if entry.completed { "x" } else { " " },
                    entry.exercise.name,
                    reps.join(", ")
                );
            }
            if !record.notes.is_empty() {
                println!("\tnotes: {}", record.notes);
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let level = parse_level(&args.log_level).unwrap_or(LevelFilter::Warn);
    init_logger(level, Target::Stderr);
    debug!("Using database {}", args.database_url);

    let store = Arc::new(SqliteStore::open(&args.database_url).await?);

    match args.command {
        Commands::Run { plan } => run_plan(store, &args.user, &plan).await,
        Commands::Plans { command } => handle_plans(store, command).await,
        Commands::Exercises { command } => handle_exercises(store, command).await,
        Commands::History { verbose } => handle_history(store, &args.user, verbose).await,
        Commands::Db {
            command: DbCommand::Reset { yes },
        } => {
            if !yes {
                println!("This deletes every exercise, plan and session. Re-run with --yes");
                return Ok(());
            }
            store.reset().await?;
            println!("Database reset");
            Ok(())
        }
    }
}
