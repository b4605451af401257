// Task list state manager

use crate::codec;
use crate::error::TaskError;
use crate::filter::Filter;
use crate::storage::Storage;
use crate::task::{Task, TaskId};
use crate::view::View;
use tracing::{debug, info, warn};

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "todos";

/// Owner of the task list, the active filter, and their persistence
///
/// Every mutating operation writes the whole list back to storage and then
/// re-renders the view. A failed write never rolls back the in-memory list;
/// it marks the store dirty and is reported through [`View::persist_failed`].
///
/// If the stored list exists but cannot be read, writes are blocked for the
/// session so the unread value is never overwritten by accident; see
/// [`TaskStore::force_flush`].
pub struct TaskStore<S: Storage, V: View> {
    storage: S,
    view: V,
    key: String,
    tasks: Vec<Task>,
    filter: Filter,
    dirty: bool,
    write_blocked: bool,
}

impl<S: Storage, V: View> TaskStore<S, V> {
    /// Open a store under [`DEFAULT_STORAGE_KEY`]
    pub fn open(storage: S, view: V) -> Self {
        Self::open_with_key(storage, view, DEFAULT_STORAGE_KEY)
    }

    /// Hydrate from `storage[key]` and render the initial snapshot
    ///
    /// A missing key starts empty. A corrupt value is logged, reported to the
    /// view, and discarded. A value that cannot be read at all also starts
    /// empty, but additionally blocks writes.
    pub fn open_with_key(storage: S, view: V, key: &str) -> Self {
        let mut store = Self {
            storage,
            view,
            key: key.to_string(),
            tasks: Vec::new(),
            filter: Filter::default(),
            dirty: false,
            write_blocked: false,
        };

        match store.load() {
            Ok(tasks) => {
                info!(key = %store.key, count = tasks.len(), "Loaded task list");
                store.tasks = tasks;
            }
            Err(e @ TaskError::StorageReadFailure(_)) => {
                warn!(key = %store.key, error = %e, "Stored task list unreadable, blocking writes");
                store.write_blocked = true;
                store.view.persist_failed(&e);
            }
            Err(e) => {
                warn!(key = %store.key, error = %e, "Discarding stored task list, starting empty");
                store.view.persist_failed(&e);
            }
        }

        store.render();
        store
    }

    fn load(&self) -> Result<Vec<Task>, TaskError> {
        let raw = self.storage.get(&self.key).map_err(TaskError::StorageReadFailure)?;

        match raw {
            Some(raw) => codec::decode(&raw),
            None => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new open task
    pub fn add(&mut self, raw_text: &str) -> Result<Task, TaskError> {
        let text = Self::clean_text(raw_text)?;
        let task = Task::new(text);
        debug!(id = %task.id, "add: appending task");

        self.tasks.push(task.clone());
        self.commit();
        Ok(task)
    }

    /// Flip a task's completion flag
    pub fn toggle(&mut self, id: &TaskId) -> Result<Task, TaskError> {
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        let task = task.clone();
        debug!(id = %task.id, completed = task.completed, "toggle: flipped task");

        if task.completed {
            self.view.task_completed(&task);
        }
        self.commit();
        Ok(task)
    }

    /// Replace a task's text
    ///
    /// Empty input is rejected before the id is looked up.
    pub fn edit(&mut self, id: &TaskId, raw_new_text: &str) -> Result<Task, TaskError> {
        let text = Self::clean_text(raw_new_text)?;
        let index = self.index_of(id)?;
        self.tasks[index].text = text;
        let task = self.tasks[index].clone();
        debug!(id = %task.id, "edit: replaced text");

        self.commit();
        Ok(task)
    }

    /// Remove a task; unknown ids are a no-op
    pub fn delete(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        let removed = self.tasks.remove(index);
        debug!(id = %removed.id, "delete: removed task");

        self.commit();
        Some(removed)
    }

    /// Remove every completed task, returning how many were removed
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        debug!(removed, "clear_completed: removed tasks");

        self.commit();
        removed
    }

    /// Change which tasks `visible_tasks` returns
    pub fn set_filter(&mut self, filter: Filter) {
        debug!(%filter, "set_filter");
        self.filter = filter;
        self.render();
    }

    /// Write the current list to storage
    ///
    /// Mutations already do this; call it to retry after a failed write.
    pub fn flush(&mut self) -> Result<(), TaskError> {
        if self.write_blocked {
            self.dirty = true;
            return Err(TaskError::WriteBlocked);
        }

        let value = codec::encode(&self.tasks)
            .map_err(|e| TaskError::PersistenceWriteFailure(std::io::Error::other(e).into()))?;

        match self.storage.set(&self.key, &value) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(TaskError::PersistenceWriteFailure(e))
            }
        }
    }

    /// Lift the write block set by an unreadable stored list, then flush
    ///
    /// This replaces whatever is stored under the key with the in-memory list.
    pub fn force_flush(&mut self) -> Result<(), TaskError> {
        if self.write_blocked {
            info!(key = %self.key, "Lifting write block, overwriting stored task list");
            self.write_blocked = false;
        }
        self.flush()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Tasks matching the active filter, in insertion order
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.filter.matches(t)).collect()
    }

    /// Number of open tasks, regardless of the active filter
    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.remaining_count()
    }

    /// Every task in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// True when the last write failed and storage is behind memory
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when the stored list could not be read and saving is held back
    pub fn is_write_blocked(&self) -> bool {
        self.write_blocked
    }

    /// Resolve a full id or a unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<TaskId, TaskError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(TaskError::NotFound(TaskId::from(prefix)));
        }

        // An exact match wins even if it is also a prefix of another id
        if let Some(task) = self.tasks.iter().find(|t| t.id.as_str() == prefix) {
            return Ok(task.id.clone());
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.as_str().starts_with(prefix));
        match (matches.next(), matches.count()) {
            (None, _) => Err(TaskError::NotFound(TaskId::from(prefix))),
            (Some(task), 0) => Ok(task.id.clone()),
            (Some(_), rest) => Err(TaskError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: rest + 1,
            }),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_parts(self) -> (S, V) {
        (self.storage, self.view)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn clean_text(raw: &str) -> Result<String, TaskError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyInput);
        }
        Ok(text.to_string())
    }

    fn index_of(&self, id: &TaskId) -> Result<usize, TaskError> {
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    /// Persist, then re-render; the post-condition of every mutation
    fn commit(&mut self) {
        if let Err(e) = self.flush() {
            warn!(key = %self.key, error = %e, "Keeping unsaved changes in memory");
            self.view.persist_failed(&e);
        }
        self.render();
    }

    fn render(&mut self) {
        let visible: Vec<&Task> = self.tasks.iter().filter(|t| self.filter.matches(t)).collect();
        let remaining = self.tasks.iter().filter(|t| !t.completed).count();
        self.view.render(&visible, remaining);
    }
}
