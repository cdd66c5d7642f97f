//! Render port: display-ready rows plus the terminal adapter.

use std::io::{self, BufRead, Write};

use time::{Date, macros::format_description};
use tracing::warn;

use crate::{
    error::Field,
    model::{DateBucket, Status, Task, TaskId},
    stats::Stats,
};

/// One task prepared for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub due: String,
    pub bucket: DateBucket,
    pub priority: String,
    pub status: String,
    /// What the toggle action would do: "Complete" or "Undo".
    pub action: &'static str,
}

impl Row {
    pub fn from_task(task: &Task, today: Date) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            category: task.category.label(),
            due: format_due(task.date),
            bucket: DateBucket::classify(task, today),
            priority: task.priority.label(),
            status: task.status.label(),
            action: match task.status {
                Status::Pending => "Complete",
                Status::Completed => "Undo",
            },
        }
    }
}

/// `Fri, Jan 10`
pub fn format_due(date: Date) -> String {
    date.format(format_description!(
        "[weekday repr:short], [month repr:short] [day padding:none]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Danger,
}

/// Transient user feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Danger, message)
    }

    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Whatever puts the view in front of the user.
pub trait Render {
    fn show(&mut self, rows: &[Row], stats: Stats);
    fn notify(&mut self, notice: Notice);
    fn field_error(&mut self, field: Field, message: &str);
    /// Ask before destructive intents.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Plain-text table on a terminal. Notices and prompts share the output
/// stream; answers are read line by line from `input`.
pub struct Terminal<W, R> {
    out: W,
    input: R,
    assume_yes: bool,
}

impl Terminal<io::Stdout, io::StdinLock<'static>> {
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(io::stdout(), io::stdin().lock(), assume_yes)
    }
}

impl<W: Write, R: BufRead> Terminal<W, R> {
    pub fn new(out: W, input: R, assume_yes: bool) -> Self {
        Self {
            out,
            input,
            assume_yes,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn emit(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if let Err(e) = write(&mut self.out).and_then(|()| self.out.flush()) {
            warn!(error = %e, "terminal write failed");
        }
    }
}

impl<W: Write, R: BufRead> Render for Terminal<W, R> {
    fn show(&mut self, rows: &[Row], stats: Stats) {
        self.emit(|out| {
            if rows.is_empty() {
                writeln!(out, "No tasks found")?;
                writeln!(out, "Try changing your filters or add a new task")?;
            } else {
                writeln!(
                    out,
                    "{:<15} | {:<24} | {:<8} | {:<21} | {:<8} | {:<9} | Action",
                    "ID", "Title", "Category", "Due", "Priority", "Status"
                )?;
                writeln!(out, "{}", "-".repeat(112))?;
                for row in rows {
                    let due = match row.bucket {
                        DateBucket::Overdue => format!("{} (overdue)", row.due),
                        DateBucket::Today => format!("{} (today)", row.due),
                        DateBucket::Normal => row.due.clone(),
                    };
                    writeln!(
                        out,
                        "{:<15} | {:<24} | {:<8} | {:<21} | {:<8} | {:<9} | {}",
                        row.id, row.title, row.category, due, row.priority, row.status, row.action
                    )?;
                }
            }
            writeln!(
                out,
                "Total: {} | Completed: {} | Pending: {}",
                stats.total, stats.completed, stats.pending
            )
        });
    }

    fn notify(&mut self, notice: Notice) {
        let tag = match notice.kind {
            NoticeKind::Success => "+",
            NoticeKind::Info => "i",
            NoticeKind::Danger => "!",
        };
        self.emit(|out| writeln!(out, "[{tag}] {}", notice.message));
    }

    fn field_error(&mut self, field: Field, message: &str) {
        self.emit(|out| writeln!(out, "  {field}: {message}"));
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        self.emit(|out| write!(out, "{prompt} [y/N] "));

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }
}
