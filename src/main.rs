use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use todostore::{Config, FileStorage, Filter, LatestSnapshot, TaskError, TaskStore, TerminalView};
use tracing::Level;

type CliStore = TaskStore<FileStorage, LatestSnapshot<TerminalView<io::Stdout>>>;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage a to-do list from the terminal")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/todostore/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task list (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage key of the task list (overrides config)
    #[arg(short, long)]
    key: Option<String>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Mark a task done, or open again
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },

    /// Replace a task's text
    Edit {
        /// Task id or unique id prefix
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    Delete {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete every completed task
    ClearCompleted {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show tasks
    List {
        /// all, active or completed (default from config)
        #[arg(short, long)]
        filter: Option<Filter>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup tracing; stdout belongs to the task list
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(key) = cli.key {
        config.storage_key = key;
    }
    config.validate().context("Invalid configuration")?;

    let storage = FileStorage::open(&config.data_dir)
        .with_context(|| format!("Failed to open task storage at {}", config.data_dir.display()))?;
    let view = LatestSnapshot::new(TerminalView::new(io::stdout()));
    let mut store = TaskStore::open_with_key(storage, view, &config.storage_key);
    if store.is_write_blocked() {
        return Err(eyre!(
            "Task list '{}' in {} could not be read",
            config.storage_key,
            config.data_dir.display()
        ));
    }

    match execute(&mut store, cli.command, config.default_filter) {
        Ok(()) => {
            store.view_mut().flush();
            // Nothing outlives this process, so unsaved changes are lost
            if store.is_dirty() {
                eprintln!("{} changes were not saved", "error:".red().bold());
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => match report.downcast_ref::<TaskError>() {
            Some(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                Ok(ExitCode::FAILURE)
            }
            None => Err(report),
        },
    }
}

/// Route one command to the matching store operation
fn execute(store: &mut CliStore, command: Commands, default_filter: Filter) -> Result<()> {
    store.set_filter(default_filter);

    match command {
        Commands::Add { text } => {
            let task = store.add(&text.join(" "))?;
            println!("Added {}", task.id);
        }
        Commands::Toggle { id } => {
            let id = store.resolve(&id)?;
            let task = store.toggle(&id)?;
            if !task.completed {
                println!("Reopened {}", task.id);
            }
        }
        Commands::Edit { id, text } => {
            let id = store.resolve(&id)?;
            let task = store.edit(&id, &text.join(" "))?;
            println!("Updated {}", task.id);
        }
        Commands::Delete { id } => {
            // Unknown ids are a silent no-op for the store; only prefixes need resolving
            let id = match store.resolve(&id) {
                Ok(id) => id,
                Err(TaskError::NotFound(_)) => {
                    println!("Nothing to delete");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(task) = store.delete(&id) {
                println!("Deleted {}", task.id);
            }
        }
        Commands::ClearCompleted { yes } => {
            let count = store.completed_count();
            if count == 0 {
                println!("No completed tasks");
                return Ok(());
            }
            if !yes && !confirm(&format!("Delete {} completed task{}?", count, if count > 1 { "s" } else { "" }))? {
                println!("Cancelled");
                return Ok(());
            }
            let removed = store.clear_completed();
            println!("Cleared {} completed task{}", removed, if removed == 1 { "" } else { "s" });
        }
        Commands::List { filter } => {
            if let Some(filter) = filter {
                store.set_filter(filter);
            }
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
