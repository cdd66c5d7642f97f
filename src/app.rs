//! Intent controller: binds user intents to the store and keeps the render
//! port showing the current view.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    clock::Clock,
    error::{TaskError, TaskResult},
    export,
    model::{Task, TaskId},
    query::{FilterPatch, FilterSpec, SortKey, view},
    render::{Notice, Render, Row},
    stats::{Stats, stats},
    storage::Persistence,
    store::{TaskDraft, TaskStore},
};

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this task?";
pub const CONFIRM_CLEAR: &str = "Clear all completed tasks?";

/// Owns the store plus the ephemeral filter/sort state. Every intent is
/// handled to completion: errors are reported to the render port, the view
/// is redrawn, and the outcome is handed back to the caller.
pub struct App<P, C, R> {
    store: TaskStore<P, C>,
    render: R,
    filter: FilterSpec,
    sort: SortKey,
}

impl<P: Persistence, C: Clock, R: Render> App<P, C, R> {
    pub fn new(store: TaskStore<P, C>, render: R) -> Self {
        Self {
            store,
            render,
            filter: FilterSpec::default(),
            sort: SortKey::default(),
        }
    }

    /// Redraw the current view and counts.
    pub fn refresh(&mut self) {
        let today = self.store.clock().today();
        let rows: Vec<Row> = self.view().iter().map(|t| Row::from_task(t, today)).collect();
        let counts = self.stats();
        self.render.show(&rows, counts);
    }

    pub fn add(&mut self, draft: TaskDraft) -> TaskResult<Task> {
        let result = self.store.add(draft);
        self.settle(result, |_| Some(Notice::success("Task added successfully!")))
    }

    /// Add from raw form strings.
    pub fn submit(&mut self, title: &str, category: &str, date: &str, priority: &str) -> TaskResult<Task> {
        match TaskDraft::parse(title, category, date, priority) {
            Ok(draft) => self.add(draft),
            Err(e) => self.settle(Err(e), |_| None),
        }
    }

    pub fn toggle(&mut self, id: TaskId) -> TaskResult<Task> {
        let result = self.store.toggle_status(id);
        self.settle(result, |_| Some(Notice::info("Task status updated!")))
    }

    /// Returns `Ok(false)` when the user declined.
    pub fn delete(&mut self, id: TaskId) -> TaskResult<bool> {
        if !self.render.confirm(CONFIRM_DELETE) {
            debug!(id, "delete declined");
            return Ok(false);
        }
        let result = self.store.delete(id).map(|()| true);
        self.settle(result, |_| Some(Notice::danger("Task deleted!")))
    }

    /// Returns `Ok(None)` when the user declined, otherwise how many tasks
    /// were removed.
    pub fn clear_completed(&mut self) -> TaskResult<Option<usize>> {
        if !self.render.confirm(CONFIRM_CLEAR) {
            debug!("clear completed declined");
            return Ok(None);
        }
        let result = self.store.clear_completed().map(Some);
        self.settle(result, |_| Some(Notice::info("Completed tasks cleared!")))
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.filter.apply(patch);
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.refresh();
    }

    /// Change filter and sort together with a single redraw.
    pub fn set_view(&mut self, patch: FilterPatch, sort: SortKey) {
        self.filter.apply(patch);
        self.sort = sort;
        self.refresh();
    }

    /// Export the whole, unfiltered list into `dir`.
    pub fn export(&mut self, dir: impl AsRef<Path>) -> TaskResult<PathBuf> {
        let today = self.store.clock().today();
        let result = export::write(dir, self.store.tasks(), today).map_err(TaskError::from);
        self.settle(result, |_| Some(Notice::success("Tasks exported successfully!")))
    }

    pub fn view(&self) -> Vec<Task> {
        view(self.store.tasks(), &self.filter, self.sort)
    }

    pub fn stats(&self) -> Stats {
        stats(self.store.tasks())
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn store(&self) -> &TaskStore<P, C> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaskStore<P, C> {
        &mut self.store
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn into_render(self) -> R {
        self.render
    }

    fn settle<T>(
        &mut self,
        result: TaskResult<T>,
        success: impl FnOnce(&T) -> Option<Notice>,
    ) -> TaskResult<T> {
        match &result {
            Ok(value) => {
                if let Some(notice) = success(value) {
                    self.render.notify(notice);
                }
            }
            Err(e) => self.report(e),
        }
        self.refresh();
        result
    }

    fn report(&mut self, err: &TaskError) {
        match err {
            TaskError::Validation(errors) => {
                for e in errors {
                    self.render.field_error(e.field, &e.message);
                }
                self.render.notify(Notice::danger("Please fix the highlighted fields"));
            }
            TaskError::NotFound(id) => {
                self.render.notify(Notice::danger(format!("Task {id} not found")));
            }
            TaskError::IdsExhausted(_) => {
                self.render
                    .notify(Notice::danger(format!("Task was not added: {err}")));
            }
            TaskError::StorageUnavailable(e) => {
                self.render
                    .notify(Notice::danger(format!("Could not save tasks: {e}")));
            }
        }
    }
}
