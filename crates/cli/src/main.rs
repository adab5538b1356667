//! GymTrack CLI - workout navigation, rest timers and progress.

mod context;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gymtrack_core::{Error, SetId, UserId, WorkoutId};
use gymtrack_progress::{BasicProgressTracker, ExerciseStatus, ProgressTracker, WorkoutProgress};
use gymtrack_session::{
    BasicSessionNavigator, CurrentExercise, NavigationTarget, SessionNavigator, SetTracker,
};
use gymtrack_storage::{SqliteStorage, Storage};
use gymtrack_timer::{
    rest_seconds, InMemoryTimerManager, TimerConfig, TimerEvent, TimerEventKind, TimerManager,
};

use context::RequestContext;

#[derive(Parser)]
#[command(name = "gymtrack")]
#[command(about = "Workout session tracker", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "gymtrack.db")]
    db: PathBuf,

    /// Acting user ID
    #[arg(long, global = true, default_value = "1")]
    user: i64,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a demo workout owned by --user
    Seed {
        /// Workout ID
        #[arg(long, default_value = "1")]
        workout: i64,
    },
    /// Show the current exercise
    Show {
        /// Workout ID
        workout: i64,
    },
    /// Move to the next exercise
    Next {
        /// Workout ID
        workout: i64,
    },
    /// Move to the previous exercise
    Prev {
        /// Workout ID
        workout: i64,
    },
    /// Jump to an exercise position (clamped)
    Goto {
        /// Workout ID
        workout: i64,
        /// Zero-based position
        #[arg(allow_hyphen_values = true)]
        index: i64,
    },
    /// Mark a set done, or undo it
    ToggleSet {
        /// Workout ID
        workout: i64,
        /// Set ID
        set: i64,
    },
    /// Show workout progress
    Progress {
        /// Workout ID
        workout: i64,
        /// Progress bar width
        #[arg(long, default_value = "10")]
        width: usize,
    },
    /// Run a rest timer; Ctrl-C cancels it
    Rest {
        /// Workout ID
        workout: i64,
        /// Countdown length, defaults to the current exercise's rest
        #[arg(long, allow_hyphen_values = true)]
        seconds: Option<i64>,
        /// Rest used when the exercise has none
        #[arg(long)]
        default_rest: Option<u32>,
        /// Emit a tick every this-many seconds
        #[arg(long, default_value = "10")]
        every: u64,
        /// Only report start and end
        #[arg(long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = RequestContext::new(UserId(cli.user));

    let storage = Arc::new(SqliteStorage::new(&cli.db).await?);
    debug!("Opened {}", cli.db.display());

    let navigator = BasicSessionNavigator::new(storage.clone());

    match cli.command {
        Commands::Seed { workout } => {
            let sets = seed::seed_workout(&*storage, WorkoutId(workout), ctx.caller).await?;
            println!("Seeded workout {} with {} sets", workout, sets);
        }
        Commands::Show { workout } => {
            let workout_id = WorkoutId(workout);
            ctx.authorize_workout(&*storage, workout_id).await?;
            let current = navigator.show_current(workout_id).await?;
            print_current(&*storage, &current, cli.json).await?;
        }
        Commands::Next { workout } => {
            navigate(&*storage, &navigator, &ctx, workout, NavigationTarget::Next, cli.json).await?;
        }
        Commands::Prev { workout } => {
            navigate(&*storage, &navigator, &ctx, workout, NavigationTarget::Previous, cli.json).await?;
        }
        Commands::Goto { workout, index } => {
            navigate(&*storage, &navigator, &ctx, workout, NavigationTarget::Index(index), cli.json)
                .await?;
        }
        Commands::ToggleSet { workout, set } => {
            let workout_id = WorkoutId(workout);
            ctx.authorize_workout(&*storage, workout_id).await?;
            let set_id = SetId(set);

            let in_workout = match storage.load_set(set_id).await? {
                Some(found) => storage
                    .list_exercises(workout_id)
                    .await?
                    .iter()
                    .any(|e| e.id == found.exercise_id),
                None => false,
            };
            if !in_workout {
                return Err(Error::not_found(format!("set {} in workout {}", set_id, workout_id)).into());
            }

            let updated = SetTracker::new(storage.clone()).complete_by_id(set_id).await?;
            if cli.json {
                print_json(&updated)?;
            } else {
                println!(
                    "Set {} {}",
                    updated.id,
                    if updated.completed { "done" } else { "not done" }
                );
            }
        }
        Commands::Progress { workout, width } => {
            let workout_id = WorkoutId(workout);
            ctx.authorize_workout(&*storage, workout_id).await?;
            let progress = BasicProgressTracker::new(storage.clone())
                .get_progress(workout_id)
                .await?;
            print_progress(&progress, width, cli.json)?;
        }
        Commands::Rest {
            workout,
            seconds,
            default_rest,
            every,
            quiet,
        } => {
            let workout_id = WorkoutId(workout);
            ctx.authorize_workout(&*storage, workout_id).await?;

            let seconds = match seconds {
                Some(seconds) => seconds,
                None => {
                    let current = navigator.show_current(workout_id).await?;
                    i64::from(rest_seconds(Some(&current.exercise_type), default_rest))
                }
            };
            let config = TimerConfig::new()
                .with_notify_every(every)
                .with_progress_notifications(!quiet);

            run_rest(&ctx, workout_id, seconds, config, cli.json).await?;
        }
    }

    Ok(())
}

async fn navigate<S: Storage + 'static>(
    storage: &S,
    navigator: &BasicSessionNavigator<S>,
    ctx: &RequestContext,
    workout: i64,
    target: NavigationTarget,
    json: bool,
) -> Result<()> {
    let workout_id = WorkoutId(workout);
    ctx.authorize_workout(storage, workout_id).await?;

    let session = navigator.navigate(workout_id, target).await?;
    debug!("Session {} at {}", session.id, session.current_exercise_index);

    let current = navigator.show_current(workout_id).await?;
    print_current(storage, &current, json).await
}

async fn print_current<S: Storage>(storage: &S, current: &CurrentExercise, json: bool) -> Result<()> {
    if json {
        return print_json(current);
    }

    println!(
        "{} - exercise {}/{}: {}",
        current.workout.name,
        current.exercise_index + 1,
        current.workout.exercise_count,
        current.exercise_type.name
    );
    for set in storage.list_sets(current.exercise.id).await? {
        println!(
            "  [{}] set {} (id {}): {} x {}",
            if set.completed { "x" } else { " " },
            set.index + 1,
            set.id,
            set.reps,
            set.weight
        );
    }
    Ok(())
}

fn print_progress(progress: &WorkoutProgress, width: usize, json: bool) -> Result<()> {
    if json {
        return print_json(progress);
    }

    println!("{} {}%", progress.progress_bar(width), progress.percent);
    println!(
        "  Sets: {}/{}  Exercises: {}/{}",
        progress.completed_sets,
        progress.total_sets,
        progress.completed_exercises,
        progress.total_exercises
    );
    if let Some(eta) = progress.eta_minutes {
        println!("  ETA: {:.0} min", eta.ceil());
    }
    for exercise in &progress.exercises {
        println!(
            "  {} {}/{} {}",
            exercise.exercise_id,
            exercise.completed_sets,
            exercise.total_sets,
            format_status(exercise.status)
        );
    }
    Ok(())
}

async fn run_rest(
    ctx: &RequestContext,
    workout_id: WorkoutId,
    seconds: i64,
    config: TimerConfig,
    json: bool,
) -> Result<()> {
    let timers = InMemoryTimerManager::with_config(config);
    let mut events = timers.subscribe();
    let handle = timers.start(ctx.caller, workout_id, seconds).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event, json)?;
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {} timer events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                match timers.cancel(&handle.timer_id, ctx.caller).await {
                    // Expired first; its event is already queued.
                    Ok(_) | Err(Error::NotFound(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    timers.shutdown().await;
    Ok(())
}

fn print_event(event: &TimerEvent, json: bool) -> Result<()> {
    if json {
        return print_json(event);
    }
    match &event.kind {
        TimerEventKind::Started => println!("Rest started ({})", event.timer_id),
        TimerEventKind::Tick { remaining_seconds } => println!("  {}s left", remaining_seconds),
        TimerEventKind::Cancelled => println!("Rest cancelled"),
        TimerEventKind::Expired => println!("Rest over, next set!"),
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_status(status: ExerciseStatus) -> &'static str {
    match status {
        ExerciseStatus::NotStarted => "not started",
        ExerciseStatus::InProgress => "in progress",
        ExerciseStatus::Done => "done",
    }
}
