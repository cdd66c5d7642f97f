pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod query;
pub mod render;
pub mod stats;
pub mod storage;
pub mod store;

pub use app::App;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Field, FieldError, StorageError, TaskError, TaskResult};
pub use model::{Category, DateBucket, Priority, Status, Task, TaskId};
pub use query::{FilterPatch, FilterSpec, Selector, SortKey, view};
pub use render::{Notice, NoticeKind, Render, Row, Terminal};
pub use stats::{Stats, stats};
pub use storage::{JsonFile, Memory, Persistence};
pub use store::{TaskDraft, TaskStore};
