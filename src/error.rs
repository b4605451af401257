// Error taxonomy for the task store and its storage backends

use crate::task::TaskId;
use thiserror::Error;

/// Errors surfaced by [`crate::TaskStore`] operations
///
/// None of these are fatal: the store stays usable after every one of them.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task text was empty after trimming
    #[error("task text cannot be empty")]
    EmptyInput,

    /// No task carries the given id
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// An id prefix matched more than one task
    #[error("id prefix '{prefix}' is ambiguous ({matches} tasks match)")]
    AmbiguousId { prefix: String, matches: usize },

    /// Stored data could not be turned into a valid task list
    #[error("persisted task list is corrupt: {0}")]
    CorruptPersistedState(String),

    /// The stored task list could not be read (as opposed to parsed)
    #[error("failed to read persisted task list: {0}")]
    StorageReadFailure(#[source] StorageError),

    /// Saving is held back because the stored list was never read
    #[error("not saving: the stored task list could not be read and would be overwritten")]
    WriteBlocked,

    /// Writing the task list to storage failed; in-memory state is kept
    #[error("failed to persist task list: {0}")]
    PersistenceWriteFailure(#[source] StorageError),
}

/// Errors from a [`crate::Storage`] backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key '{0}' (1-64 chars, alphanumeric with _/-)")]
    InvalidKey(String),

    #[error("storage is unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_messages() {
        assert_eq!(TaskError::EmptyInput.to_string(), "task text cannot be empty");
        assert_eq!(TaskError::NotFound(TaskId::from("abc")).to_string(), "task abc not found");
        assert_eq!(
            TaskError::AmbiguousId {
                prefix: "01".to_string(),
                matches: 3
            }
            .to_string(),
            "id prefix '01' is ambiguous (3 tasks match)"
        );
    }

    #[test]
    fn test_write_failure_keeps_source() {
        let err = TaskError::PersistenceWriteFailure(StorageError::Unavailable);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "failed to persist task list: storage is unavailable");
    }

    #[test]
    fn test_read_failure_is_not_corruption() {
        let err = TaskError::StorageReadFailure(StorageError::Unavailable);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "failed to read persisted task list: storage is unavailable");
    }
}
