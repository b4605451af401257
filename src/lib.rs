// todostore - To-do list state manager with pluggable key-value persistence

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

// Re-export main types for convenience
pub use config::Config;
pub use error::{StorageError, TaskError};
pub use filter::Filter;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{DEFAULT_STORAGE_KEY, TaskStore};
pub use task::{Task, TaskId};
pub use view::{LatestSnapshot, TerminalView, View, remaining_summary};
