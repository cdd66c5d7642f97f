use std::path::{Path, PathBuf};

use time::{Date, macros::format_description};
use tracing::info;

use crate::{
    error::StorageError,
    model::Task,
    storage::atomic_write,
};

/// `tasks_2025-01-10.json`
pub fn file_name(today: Date) -> String {
    let stamp = today
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| today.to_string());
    format!("tasks_{stamp}.json")
}

/// The full list, pretty-printed in the persisted shape.
pub fn to_json(tasks: &[Task]) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Write the export document into `dir` and return its path.
pub fn write(dir: impl AsRef<Path>, tasks: &[Task], today: Date) -> Result<PathBuf, StorageError> {
    let path = dir.as_ref().join(file_name(today));
    atomic_write(&path, tasks)?;
    info!(path = %path.display(), count = tasks.len(), "tasks exported");
    Ok(path)
}
