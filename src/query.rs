//! Filtering and ordering of the task list into a display view.

use std::{cmp::Reverse, fmt, str::FromStr};

use crate::model::{Category, Priority, Status, Task};

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

// Not derived: that would demand `T: Default`.
impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Selector<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Selector::All)
        } else {
            s.parse().map(Selector::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Only(v) => v.fmt(f),
        }
    }
}

/// Conjunctive filter over status, priority and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub status: Selector<Status>,
    pub priority: Selector<Priority>,
    pub category: Selector<Category>,
}

impl FilterSpec {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(&task.status)
            && self.priority.matches(&task.priority)
            && self.category.matches(&task.category)
    }

    /// Overwrite only the fields present in `patch`.
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

/// Partial update of a [`FilterSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub status: Option<Selector<Status>>,
    pub priority: Option<Selector<Priority>>,
    pub category: Option<Selector<Category>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Earliest due date first.
    #[default]
    Date,
    /// Highest priority first.
    Priority,
}

impl FromStr for SortKey {
    type Err = crate::error::UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "priority" => Ok(SortKey::Priority),
            _ => Err(crate::error::UnknownValue {
                kind: "sort key",
                value: s.to_owned(),
            }),
        }
    }
}

/// Filtered, ordered copy of `tasks`. Both orderings are stable, so ties
/// keep their input order.
pub fn view(tasks: &[Task], filter: &FilterSpec, sort: SortKey) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();

    match sort {
        SortKey::Date => out.sort_by_key(|t| t.date),
        SortKey::Priority => out.sort_by_key(|t| Reverse(t.priority.rank())),
    }

    out
}
