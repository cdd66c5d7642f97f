use std::fmt;

use thiserror::Error;

use crate::model::TaskId;

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Category,
    Date,
    Priority,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "title",
            Field::Category => "category",
            Field::Date => "date",
            Field::Priority => "priority",
        })
    }
}

/// One rejected form field with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Failures of the persistence medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Everything a single task operation can fail with. None of these is fatal:
/// the store is left exactly as it was before the operation.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid task: {}", join(.0))]
    Validation(Vec<FieldError>),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("no task id left after {0}")]
    IdsExhausted(TaskId),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl TaskError {
    /// Field-level errors, empty for anything but validation failures.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            TaskError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type TaskResult<T> = Result<T, TaskError>;
