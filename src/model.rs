use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::UnknownValue;

// Self documenting aliases
pub type TimeStamp = OffsetDateTime;
pub type TaskId = i64;

// Due dates are stored as plain `YYYY-MM-DD`.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// --- Task Status ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    /// The only transition a task knows: pending <-> completed.
    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

// --- Task Priority ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Ordering weight, high = 3 > medium = 2 > low = 1.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

// --- Task Category ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Other,
}

/// Lowercase wire names shared by `Display`, `FromStr` and display labels.
macro_rules! keyword_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Capitalized form used in rendered rows.
            pub fn label(self) -> String {
                capitalize(self.as_str())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownValue {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

keyword_enum!(Status, "status", { Pending => "pending", Completed => "completed" });
keyword_enum!(Priority, "priority", { Low => "low", Medium => "medium", High => "high" });
keyword_enum!(Category, "category", {
    Work => "work",
    Personal => "personal",
    Shopping => "shopping",
    Other => "other",
});

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// --- Task Object ---
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /** Immutable primary key (unique per store, never reused) */
    pub id: TaskId,

    /** Required, trimmed, non-empty summary */
    pub title: String,

    pub category: Category,

    /** Due date, no time of day */
    #[serde(with = "iso_date")]
    pub date: Date,

    pub priority: Priority,

    /** The only mutable field */
    pub status: Status,

    /** Created at time (immutable once set) */
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: TimeStamp,
}

impl Task {
    /// Creates a new builder chain (*without* a title).
    pub fn builder() -> TaskBuilder<MissingTitle> {
        TaskBuilder {
            title: None,
            category: Category::Work,
            priority: Priority::Medium,
            _state: std::marker::PhantomData,
        }
    }

    /// Flip pending <-> completed.
    pub fn toggle(&mut self) {
        self.status = self.status.toggled();
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

// --- Zero size markers for the "typed-state" builder ---
pub struct MissingTitle;
pub struct HasTitle;

pub struct TaskBuilder<TitleState> {
    title: Option<String>,
    category: Category,
    priority: Priority,

    // zero-cost phantom marker to record builder state in type system
    _state: std::marker::PhantomData<TitleState>,
}

impl TaskBuilder<MissingTitle> {
    pub fn title<S: Into<String>>(self, t: S) -> TaskBuilder<HasTitle> {
        TaskBuilder {
            title: Some(t.into()),
            category: self.category,
            priority: self.priority,
            _state: std::marker::PhantomData,
        }
    }
}

impl<S> TaskBuilder<S> {
    pub fn category(mut self, c: Category) -> Self {
        self.category = c;
        self
    }

    pub fn priority(mut self, p: Priority) -> Self {
        self.priority = p;
        self
    }
}

// --- Final-Stage: .build() only once title supplied ---
impl TaskBuilder<HasTitle> {
    /// Consume builder and return a pending [`Task`] due on `date`.
    pub fn build(self, id: TaskId, date: Date, created_at: TimeStamp) -> Task {
        Task {
            id,
            title: self.title.unwrap_or_default(),
            category: self.category,
            date,
            priority: self.priority,
            status: Status::Pending,
            created_at,
        }
    }
}

/// Display-only classification of a due date relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Overdue,
    Today,
    Normal,
}

impl DateBucket {
    pub fn classify(task: &Task, today: Date) -> Self {
        if task.date < today && task.status == Status::Pending {
            DateBucket::Overdue
        } else if task.date == today {
            DateBucket::Today
        } else {
            DateBucket::Normal
        }
    }
}
