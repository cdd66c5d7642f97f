// --- Persistence port and its adapters ---

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile; // For atomic writes
use tracing::{debug, warn};

use crate::{error::StorageError, model::Task};

/// Default name of the single storage slot this system owns.
pub const DEFAULT_STORE: &str = "tasks.json";

/// Load/save the whole task list. Loading never fails: a missing,
/// unreadable or corrupt slot reads as an empty list.
pub trait Persistence {
    fn load(&self) -> Vec<Task>;
    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Durable storage in one JSON file. Writes are serialized through an
/// exclusive lock on a sidecar `.lock` file and land via atomic rename.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl Persistence for JsonFile {
    fn load(&self) -> Vec<Task> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored tasks yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "task storage unreadable, starting empty");
                return Vec::new();
            }
        };

        decode(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "stored tasks are corrupt, starting empty");
            Vec::new()
        })
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        FileExt::lock_exclusive(&lock)?;

        let written = atomic_write(&self.path, &tasks);

        // Closing the handle releases the lock.
        drop(lock);
        written?;

        debug!(path = %self.path.display(), count = tasks.len(), "tasks saved");
        Ok(())
    }
}

/// In-process slot holding the serialized list, for tests and throwaway
/// sessions. Can be switched into a failing mode to model an unavailable
/// medium.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    slot: Option<String>,
    failing: bool,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw slot contents, which need not be valid.
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            slot: Some(raw.into()),
            failing: false,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl Persistence for Memory {
    fn load(&self) -> Vec<Task> {
        let Some(raw) = &self.slot else {
            return Vec::new();
        };
        decode(raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored tasks are corrupt, starting empty");
            Vec::new()
        })
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        if self.failing {
            return Err(io::Error::other("storage medium is unavailable").into());
        }
        self.slot = Some(serde_json::to_string(tasks)?);
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Atomically write *any* serializable value to disk as pretty JSON,
/// replacing previous contents only once the entire payload is persisted.
pub fn atomic_write<T>(path: impl AsRef<Path>, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Write into a temp file in the *same* directory.
    let mut tmp = NamedTempFile::new_in(dir)?;

    serde_json::to_writer_pretty(&mut tmp, value)?;

    // push os buffers
    tmp.flush()?;

    tmp.as_file().sync_all()?;

    // atomic rename on POSIX, replace on Windows
    tmp.persist(path).map_err(|source| StorageError::Persist {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Priority, Status};
    use time::macros::{date, datetime};

    fn sample() -> Vec<Task> {
        let mut done = Task::builder()
            .title("File taxes")
            .priority(Priority::High)
            .build(2, date!(2025 - 04 - 15), datetime!(2025-01-02 10:00 UTC));
        done.status = Status::Completed;
        vec![
            Task::builder()
                .title("Buy milk")
                .category(Category::Shopping)
                .priority(Priority::Low)
                .build(1, date!(2025 - 01 - 10), datetime!(2025-01-01 09:00 UTC)),
            done,
        ]
    }

    #[test]
    fn json_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFile::new(dir.path().join(DEFAULT_STORE));

        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFile::new(dir.path().join("nothing-here.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE);
        fs::write(&path, "{not json").unwrap();

        assert!(JsonFile::new(&path).load().is_empty());
    }

    #[test]
    fn unknown_priority_counts_as_corrupt() {
        let raw = r#"[{"id":1,"title":"x","category":"work","date":"2025-01-10",
            "priority":"urgent","status":"pending","createdAt":"2025-01-01T00:00:00Z"}]"#;
        assert!(Memory::with_contents(raw).load().is_empty());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFile::new(dir.path().join("no/such/dir/tasks.json"));
        assert!(store.save(&sample()).is_err());
    }

    #[test]
    fn failed_replace_reports_write_error_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE);
        // A directory in the way makes the final rename fail.
        fs::create_dir(&path).unwrap();
        let mut store = JsonFile::new(&path);

        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, StorageError::Persist { .. }));

        let lock = OpenOptions::new().write(true).open(store.lock_path()).unwrap();
        FileExt::lock_exclusive(&lock).unwrap();
    }

    #[test]
    fn file_holds_a_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFile::new(dir.path().join(DEFAULT_STORE));
        store.save(&sample()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["status"], "completed");
    }

    #[test]
    fn memory_round_trips_and_can_fail() {
        let mut mem = Memory::new();
        mem.save(&sample()).unwrap();
        assert_eq!(mem.load(), sample());

        mem.set_failing(true);
        assert!(mem.save(&[]).is_err());
        assert_eq!(mem.load(), sample());
    }
}
