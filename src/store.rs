use time::{Date, format_description::well_known::Iso8601};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::{Field, FieldError, TaskError, TaskResult},
    model::{Category, Priority, Task, TaskId},
    storage::Persistence,
};

/// Input for a new task, as entered in a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: Category,
    pub date: Option<Date>,
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, category: Category, date: Option<Date>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            category,
            date,
            priority,
        }
    }

    /// Build a draft from raw form strings, collecting an error for every
    /// bad field rather than stopping at the first.
    pub fn parse(title: &str, category: &str, date: &str, priority: &str) -> TaskResult<Self> {
        let mut errors = Vec::new();

        if title.trim().is_empty() {
            errors.push(FieldError::new(Field::Title, TITLE_REQUIRED));
        }

        let date = match date.trim() {
            "" => {
                errors.push(FieldError::new(Field::Date, DATE_REQUIRED));
                None
            }
            raw => Date::parse(raw, &Iso8601::DATE)
                .map_err(|_| {
                    errors.push(FieldError::new(
                        Field::Date,
                        format!("Due date must look like YYYY-MM-DD, got {raw}"),
                    ))
                })
                .ok(),
        };

        let category = category
            .parse::<Category>()
            .map_err(|e| errors.push(FieldError::new(Field::Category, e.to_string())))
            .ok();

        let priority = priority
            .parse::<Priority>()
            .map_err(|e| errors.push(FieldError::new(Field::Priority, e.to_string())))
            .ok();

        match (category, date, priority) {
            (Some(category), Some(date), Some(priority)) if errors.is_empty() => {
                Ok(Self::new(title, category, Some(date), priority))
            }
            _ => Err(TaskError::Validation(errors)),
        }
    }

    /// Check the required fields and hand back the due date.
    fn validate(&self) -> TaskResult<Date> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new(Field::Title, TITLE_REQUIRED));
        }
        if self.date.is_none() {
            errors.push(FieldError::new(Field::Date, DATE_REQUIRED));
        }

        match self.date {
            Some(date) if errors.is_empty() => Ok(date),
            _ => Err(TaskError::Validation(errors)),
        }
    }
}

const TITLE_REQUIRED: &str = "Task title is required";
const DATE_REQUIRED: &str = "Due date is required";

/// The authoritative task list. Every mutation is written through the
/// persistence port before it becomes visible; a failed write leaves the
/// list untouched.
pub struct TaskStore<P, C> {
    tasks: Vec<Task>,
    persistence: P,
    clock: C,
    last_id: TaskId,
}

impl<P: Persistence, C: Clock> TaskStore<P, C> {
    /// Load whatever the persistence port holds (empty when unreadable).
    pub fn open(persistence: P, clock: C) -> Self {
        let tasks = persistence.load();
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        info!(count = tasks.len(), "task store opened");
        Self {
            tasks,
            persistence,
            clock,
            last_id,
        }
    }

    pub fn add(&mut self, draft: TaskDraft) -> TaskResult<Task> {
        let date = draft.validate()?;

        let now = self.clock.now();
        let id = self.next_id(now)?;
        let task = Task::builder()
            .title(draft.title.trim())
            .category(draft.category)
            .priority(draft.priority)
            .build(id, date, now);

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        self.last_id = id;

        debug!(id, title = %task.title, "task added");
        Ok(task)
    }

    pub fn toggle_status(&mut self, id: TaskId) -> TaskResult<Task> {
        let mut next = self.tasks.clone();
        let task = next
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))?;
        task.toggle();
        let toggled = task.clone();

        self.commit(next)?;
        debug!(id, status = %toggled.status, "task toggled");
        Ok(toggled)
    }

    pub fn delete(&mut self, id: TaskId) -> TaskResult<()> {
        // `retain` keeps all elements for which the predicate is *true*.
        let mut next = self.tasks.clone();
        next.retain(|t| t.id != id);
        if next.len() == self.tasks.len() {
            return Err(TaskError::NotFound(id));
        }

        self.commit(next)?;
        debug!(id, "task deleted");
        Ok(())
    }

    /// Drop every completed task and return how many went.
    pub fn clear_completed(&mut self) -> TaskResult<usize> {
        let next: Vec<Task> = self.tasks.iter().filter(|t| !t.is_completed()).cloned().collect();
        let removed = self.tasks.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.commit(next)?;
        debug!(removed, "completed tasks cleared");
        Ok(removed)
    }

    /// Owned copy of every task in insertion order.
    pub fn load_all(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrow the list for read-only derivations (views, stats, export).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    /// Millisecond timestamp, bumped past the largest id ever handed out.
    fn next_id(&self, now: crate::model::TimeStamp) -> TaskResult<TaskId> {
        let millis = i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);
        let after_last = self
            .last_id
            .checked_add(1)
            .ok_or(TaskError::IdsExhausted(self.last_id))?;
        Ok(millis.max(after_last))
    }

    fn commit(&mut self, next: Vec<Task>) -> TaskResult<()> {
        if let Err(e) = self.persistence.save(&next) {
            warn!(error = %e, "saving tasks failed, change discarded");
            return Err(e.into());
        }
        self.tasks = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, model::Status, storage::Memory};
    use time::macros::{date, datetime};

    const NOW_MS: i64 = 1_736_500_000_000;

    fn store() -> TaskStore<Memory, FixedClock> {
        // 2025-01-10T09:06:40Z
        let clock = FixedClock(datetime!(2025-01-10 09:06:40 UTC));
        TaskStore::open(Memory::new(), clock)
    }

    fn milk() -> TaskDraft {
        TaskDraft::new("Buy milk", Category::Shopping, Some(date!(2025 - 01 - 10)), Priority::Low)
    }

    #[test]
    fn add_creates_pending_task_and_persists() {
        let mut s = store();
        let t = s.add(milk()).unwrap();

        assert_eq!(t.id, NOW_MS);
        assert_eq!(t.status, Status::Pending);
        assert_eq!(t.created_at, datetime!(2025-01-10 09:06:40 UTC));
        assert_eq!(s.load_all(), vec![t.clone()]);
        assert_eq!(s.persistence().load(), vec![t]);
    }

    #[test]
    fn add_trims_title() {
        let mut s = store();
        let mut draft = milk();
        draft.title = "  Buy milk \n".into();
        assert_eq!(s.add(draft).unwrap().title, "Buy milk");
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() {
        let mut s = store();
        let a = s.add(milk()).unwrap();
        let b = s.add(milk()).unwrap();
        s.delete(b.id).unwrap();
        let c = s.add(milk()).unwrap();

        assert_eq!(b.id, a.id + 1);
        assert_eq!(c.id, b.id + 1);
    }

    #[test]
    fn blank_title_and_missing_date_are_both_reported() {
        let mut s = store();
        let err = s
            .add(TaskDraft::new("   ", Category::Work, None, Priority::High))
            .unwrap_err();

        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Title, Field::Date]);
        assert!(s.is_empty());
        assert_eq!(s.persistence().contents(), None);
    }

    #[test]
    fn toggle_flips_and_unknown_id_is_not_found() {
        let mut s = store();
        let t = s.add(milk()).unwrap();

        assert_eq!(s.toggle_status(t.id).unwrap().status, Status::Completed);
        assert_eq!(s.toggle_status(t.id).unwrap().status, Status::Pending);
        assert!(matches!(s.toggle_status(7), Err(TaskError::NotFound(7))));
    }

    #[test]
    fn delete_missing_id_changes_nothing() {
        let mut s = store();
        s.add(milk()).unwrap();
        let before = s.load_all();

        assert!(matches!(s.delete(99), Err(TaskError::NotFound(99))));
        assert_eq!(s.load_all(), before);
    }

    #[test]
    fn clear_completed_counts_removed() {
        let mut s = store();
        let a = s.add(milk()).unwrap();
        let b = s.add(milk()).unwrap();
        let c = s.add(milk()).unwrap();
        s.toggle_status(a.id).unwrap();
        s.toggle_status(c.id).unwrap();

        assert_eq!(s.clear_completed().unwrap(), 2);
        assert_eq!(s.load_all(), vec![b]);
        assert_eq!(s.clear_completed().unwrap(), 0);
    }

    #[test]
    fn failed_save_rolls_back() {
        let mut s = store();
        let t = s.add(milk()).unwrap();
        s.persistence_mut().set_failing(true);

        assert!(matches!(s.add(milk()), Err(TaskError::StorageUnavailable(_))));
        assert!(matches!(s.toggle_status(t.id), Err(TaskError::StorageUnavailable(_))));
        assert!(matches!(s.delete(t.id), Err(TaskError::StorageUnavailable(_))));
        assert_eq!(s.load_all(), vec![t]);
    }

    #[test]
    fn failed_save_keeps_completed_tasks() {
        let mut s = store();
        let done = s.add(milk()).unwrap();
        s.add(milk()).unwrap();
        s.toggle_status(done.id).unwrap();
        let before = s.load_all();
        s.persistence_mut().set_failing(true);

        assert!(matches!(s.clear_completed(), Err(TaskError::StorageUnavailable(_))));
        assert_eq!(s.load_all(), before);
    }

    #[test]
    fn reopen_continues_ids_after_stored_ones() {
        let mut s = store();
        let t = s.add(milk()).unwrap();
        let mem = s.persistence().clone();

        // An earlier clock must not produce a colliding id.
        let mut reopened = TaskStore::open(mem, FixedClock(datetime!(2024-01-01 00:00 UTC)));
        assert_eq!(reopened.load_all(), vec![t.clone()]);
        assert_eq!(reopened.add(milk()).unwrap().id, t.id + 1);
    }

    #[test]
    fn largest_stored_id_refuses_new_tasks() {
        let raw = format!(
            r#"[{{"id":{},"title":"last","category":"work","date":"2025-01-10",
            "priority":"low","status":"pending","createdAt":"2025-01-01T00:00:00Z"}}]"#,
            i64::MAX
        );
        let mut s = TaskStore::open(Memory::with_contents(raw.clone()), FixedClock(datetime!(2025-01-10 00:00 UTC)));
        assert_eq!(s.len(), 1);

        assert!(matches!(s.add(milk()), Err(TaskError::IdsExhausted(i64::MAX))));
        assert_eq!(s.len(), 1);
        assert_eq!(s.persistence().contents(), Some(raw.as_str()));
    }

    #[test]
    fn corrupt_storage_opens_empty() {
        let s = TaskStore::open(Memory::with_contents("[{\"id\":"), FixedClock(datetime!(2025-01-10 00:00 UTC)));
        assert!(s.is_empty());
    }

    #[test]
    fn parse_accepts_form_strings() {
        let draft = TaskDraft::parse(" Buy milk ", "shopping", "2025-01-10", "low").unwrap();
        assert_eq!(draft, milk_with_title(" Buy milk "));
    }

    fn milk_with_title(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            ..milk()
        }
    }

    #[test]
    fn parse_reports_every_bad_field() {
        let err = TaskDraft::parse("", "chores", "", "urgent").unwrap_err();
        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![Field::Title, Field::Date, Field::Category, Field::Priority]
        );
    }

    #[test]
    fn parse_rejects_malformed_date_once() {
        let err = TaskDraft::parse("Report", "work", "10/01/2025", "high").unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Date);
        assert!(errors[0].message.contains("YYYY-MM-DD"));
    }
}
