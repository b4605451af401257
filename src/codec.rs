// Serialized form of the task list
//
// The stored value is a JSON array of `{"id","text","completed"}` objects,
// the same layout browser front-ends keep under their `todos` key.

use crate::error::TaskError;
use crate::task::Task;
use std::collections::HashSet;
use tracing::debug;

/// Encode the task list in insertion order
pub fn encode(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

/// Decode and validate a stored task list
///
/// Unlike a JSONL log, a half-valid list is not salvaged: any unparseable
/// document, empty text or repeated id rejects the whole value.
pub fn decode(raw: &str) -> Result<Vec<Task>, TaskError> {
    let tasks: Vec<Task> =
        serde_json::from_str(raw).map_err(|e| TaskError::CorruptPersistedState(format!("invalid JSON: {}", e)))?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        if task.text.trim().is_empty() {
            return Err(TaskError::CorruptPersistedState(format!(
                "task {} at position {} has empty text",
                task.id, index
            )));
        }
        if !seen.insert(&task.id) {
            return Err(TaskError::CorruptPersistedState(format!(
                "duplicate task id {} at position {}",
                task.id, index
            )));
        }
    }

    debug!(count = tasks.len(), "Decoded task list");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;

    fn task(id: &str, text: &str, completed: bool) -> Task {
        Task {
            id: TaskId::from(id),
            text: text.to_string(),
            completed,
        }
    }

    #[test]
    fn test_encode_preserves_order() {
        let tasks = vec![task("b", "Second", false), task("a", "First", true)];
        let json = encode(&tasks).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"b","text":"Second","completed":false},{"id":"a","text":"First","completed":true}]"#
        );
        assert_eq!(decode(&json).unwrap(), tasks);
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_legacy_numeric_ids() {
        let tasks = decode(r#"[{"id":1700000000000,"text":"Buy milk","completed":true}]"#).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "1700000000000");
        assert!(tasks[0].completed);
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, TaskError::CorruptPersistedState(_)));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode(r#"{"id":"a","text":"x","completed":false}"#).unwrap_err();
        assert!(matches!(err, TaskError::CorruptPersistedState(_)));
    }

    #[test]
    fn test_decode_rejects_empty_text() {
        let err = decode(r#"[{"id":"a","text":"   ","completed":false}]"#).unwrap_err();
        assert!(matches!(err, TaskError::CorruptPersistedState(_)));
    }

    #[test]
    fn test_decode_rejects_duplicate_ids() {
        let err = decode(
            r#"[{"id":"a","text":"one","completed":false},{"id":"a","text":"two","completed":false}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::CorruptPersistedState(msg) if msg.contains("duplicate")));
    }
}
