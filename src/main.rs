use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use taskmaster::{
    App, Category, Clock, FilterPatch, JsonFile, Priority, Selector, SortKey, Status, SystemClock,
    TaskId, TaskStore, Terminal, config::Settings,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track tasks with a due date, category and priority")]
struct Cli {
    /// Main verb. If omitted, `list` is default action.
    #[command(subcommand)]
    verb: Option<Verb>,

    /// Task list file (overrides the config file).
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    store: Option<PathBuf>,

    /// Optional TOML settings file.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Answer "yes" to confirmation prompts.
    #[arg(short, long)]
    yes: bool,

    /// Log store activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Verb {
    /// Create a pending task.
    Add {
        title: String,

        /// work, personal, shopping or other.
        #[arg(short, long)]
        category: Option<String>,

        /// Due date as YYYY-MM-DD; defaults to today.
        #[arg(short, long)]
        date: Option<String>,

        /// low, medium or high.
        #[arg(short, long)]
        priority: Option<String>,
    },
    /// Flip a task between pending and completed.
    Toggle { id: TaskId },
    /// Delete one task.
    Remove { id: TaskId },
    /// Delete every completed task.
    ClearCompleted,
    List {
        #[arg(long, default_value = "all")]
        status: Selector<Status>,

        #[arg(long, default_value = "all")]
        priority: Selector<Priority>,

        #[arg(long, default_value = "all")]
        category: Selector<Category>,

        /// date or priority.
        #[arg(long, default_value = "date")]
        sort: SortKey,
    },
    /// Show total/completed/pending counts.
    Stats,
    /// Write the full list to tasks_<YYYY-MM-DD>.json.
    Export {
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    install_tracing(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        settings.store = store;
    }

    let store = TaskStore::open(JsonFile::new(&settings.store), SystemClock);
    let mut app = App::new(store, Terminal::stdio(cli.yes));

    let ok = match cli.verb.unwrap_or(Verb::List {
        status: Selector::All,
        priority: Selector::All,
        category: Selector::All,
        sort: SortKey::Date,
    }) {
        Verb::Add {
            title,
            category,
            date,
            priority,
        } => {
            let category = category.unwrap_or_else(|| settings.default_category.to_string());
            let priority = priority.unwrap_or_else(|| settings.default_priority.to_string());
            let date = date.unwrap_or_else(|| SystemClock.today().to_string());
            app.submit(&title, &category, &date, &priority).is_ok()
        }
        Verb::Toggle { id } => app.toggle(id).is_ok(),
        Verb::Remove { id } => app.delete(id).is_ok(),
        Verb::ClearCompleted => app.clear_completed().is_ok(),
        Verb::List {
            status,
            priority,
            category,
            sort,
        } => {
            app.set_view(
                FilterPatch {
                    status: Some(status),
                    priority: Some(priority),
                    category: Some(category),
                },
                sort,
            );
            true
        }
        Verb::Stats => {
            let s = app.stats();
            println!("Total: {} | Completed: {} | Pending: {}", s.total, s.completed, s.pending);
            true
        }
        Verb::Export { dir } => {
            let dir = dir.unwrap_or(settings.export_dir);
            match app.export(&dir) {
                Ok(path) => {
                    println!("{}", path.display());
                    true
                }
                Err(_) => false,
            }
        }
    };

    // Failures were already reported through the terminal.
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn install_tracing(verbose: bool) {
    let filter = log_filter(verbose, std::env::var("RUST_LOG").ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

/// `-v` forces debug; otherwise `RUST_LOG` wins, falling back to warn.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        _ if verbose => EnvFilter::new("debug"),
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new("warn"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_is_kept_without_verbose() {
        assert_eq!(log_filter(false, Some("debug")).to_string(), "debug");
        assert_eq!(log_filter(false, Some("taskmaster=trace")).to_string(), "taskmaster=trace");
    }

    #[test]
    fn verbose_and_default_levels() {
        assert_eq!(log_filter(true, Some("error")).to_string(), "debug");
        assert_eq!(log_filter(false, None).to_string(), "warn");
        assert_eq!(log_filter(false, Some("  ")).to_string(), "warn");
    }
}
