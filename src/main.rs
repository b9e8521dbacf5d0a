//! Todo List CLI - Main Entry Point
//!
//! This is the main entry point for the todo-list application.
//! The actual implementation is in the `todo_list` library.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::{CommandFactory, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use todo_list::{
    format, LocalScheduler, ReminderScheduler, Storage, TaskId, TodoListController,
};

/// Personal todo manager with ordered task lists and timed local reminders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the todo data file
    file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task
    Add {
        /// Task name
        name: String,
        /// Reminder time, local (e.g. "2026-08-05 09:00")
        #[arg(long)]
        remind: Option<String>,
        /// Flag the task
        #[arg(long)]
        flag: bool,
    },
    /// List tasks
    List {
        /// Show only flagged tasks
        #[arg(long)]
        flagged: bool,
        /// Hide completed tasks
        #[arg(long)]
        active: bool,
        /// Show only tasks whose name starts with this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Mark a task completed
    Done {
        /// Task id
        id: TaskId,
    },
    /// Move the task at one position to another (1-based)
    Move {
        from: usize,
        to: usize,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: TaskId,
    },
    /// Run in the foreground and deliver due reminders
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    // Check if no arguments were provided (except the program name)
    if std::env::args().len() == 1 {
        // No arguments provided, show help and exit with error code
        let mut cmd = Args::command();
        cmd.print_help().ok();
        println!(); // Add a newline after help
        std::process::exit(2);
    }

    let args = Args::parse();
    let store = Arc::new(Storage::new(&args.file)?);
    let (delivery, mut reminders) = mpsc::unbounded_channel();
    let scheduler = Arc::new(LocalScheduler::new(delivery));

    let hide_unflagged = matches!(args.command, Command::List { flagged: true, .. });
    let controller = TodoListController::with_options(
        store,
        Arc::clone(&scheduler) as _,
        hide_unflagged,
        "Tasks",
    );

    match args.command {
        Command::Add { name, remind, flag } => {
            let date = remind.as_deref().map(parse_local_datetime).transpose()?;
            let task = controller.add(&name, date, flag).await?;
            println!("Task created with ID: {}", task.id);
        }
        Command::List { search, active, .. } => {
            controller.set_hide_completed(active);
            if let Some(search) = search {
                controller.set_search_text(search);
            }
            controller.refresh()?;
            println!("{}", format::format_tasks(&controller.visible_tasks()));
        }
        Command::Done { id } => {
            let task = controller.set_completed(id, true).await?;
            println!("Task {} completed", task.id);
        }
        Command::Move { from, to } => {
            let count = controller.visible_tasks().len();
            if from == 0 || from > count || to == 0 || to > count {
                anyhow::bail!("positions must be between 1 and {count}");
            }
            // The controller's destination is a pre-removal offset; moving
            // down needs one extra slot so the task lands at `to`.
            let destination = if to > from { to } else { to - 1 };
            controller.move_tasks(&[from - 1], destination)?;
            controller.refresh()?;
            println!("{}", format::format_tasks(&controller.visible_tasks()));
        }
        Command::Delete { id } => {
            controller.delete_tasks_by_id(&HashSet::from([id])).await?;
            println!("Task {id} deleted");
        }
        Command::Watch => {
            // Reminders are per-process; re-register whatever the store
            // still expects to ring.
            let now = Local::now();
            for task in controller.visible_tasks() {
                if let Some(date) = task.notified_date
                    && date > now
                {
                    if let Err(e) = scheduler.register(task.id, &task.name, date) {
                        warn!(task = %task.id, "could not schedule reminder: {e}");
                    }
                }
            }
            info!(
                pending = scheduler.pending_count(),
                "watching for reminders, Ctrl-C to exit"
            );
            while let Some(reminder) = reminders.recv().await {
                println!("{}", format::format_reminder(&reminder));
            }
        }
    }

    Ok(())
}

/// Parse a "YYYY-MM-DD HH:MM" string as a local point in time
fn parse_local_datetime(s: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD HH:MM"))?;
    naive
        .and_local_timezone(Local)
        .single()
        .with_context(|| format!("date '{s}' is ambiguous in the local timezone"))
}
