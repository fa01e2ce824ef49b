use crate::model::{Status, Task, TaskError, TaskFields, TaskId};
use chrono::Utc;
use std::cmp::Ordering;

/// In-memory task collection. Insertion order is kept; the sorted dashboard
/// order is derived on demand by [`TaskStore::sorted_view`].
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    last_issued: i64,
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore::default()
    }

    /// Adds a task in `Todo` with a fresh id.
    ///
    /// `fields` must already have passed [`TaskFields::validate`]; ratings are
    /// stored as given.
    pub fn create(&mut self, fields: TaskFields) -> &Task {
        debug_assert!(fields.validate().is_ok(), "unvalidated task fields");
        let id = self.next_id();
        tracing::debug!(%id, title = %fields.title, score = fields.priority_score(), "creating task");
        self.tasks.push(Task::new(id, fields));
        let idx = self.tasks.len() - 1;
        &self.tasks[idx]
    }

    /// Replaces the editable fields of `id`. Status is left alone.
    pub fn update(&mut self, id: &TaskId, fields: TaskFields) -> Result<&Task, TaskError> {
        let idx = self.position(id)?;
        debug_assert!(fields.validate().is_ok(), "unvalidated task fields");
        let task = &mut self.tasks[idx];
        task.apply(fields);
        tracing::debug!(%id, score = task.priority_score(), "updated task");
        Ok(&*task)
    }

    pub fn delete(&mut self, id: &TaskId) -> Result<Task, TaskError> {
        let idx = self.position(id)?;
        tracing::debug!(%id, "deleting task");
        Ok(self.tasks.remove(idx))
    }

    pub fn set_status(&mut self, id: &TaskId, status: Status) -> Result<&Task, TaskError> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.status = status;
        tracing::debug!(%id, status = ?status, "status changed");
        Ok(&*task)
    }

    /// All tasks, highest priority first, earlier due date breaking ties.
    /// Tasks equal on both keys keep insertion order.
    pub fn sorted_view(&self) -> Vec<&Task> {
        let mut view: Vec<&Task> = self.tasks.iter().collect();
        view.sort_by(|a, b| dashboard_order(a, b));
        view
    }

    /// Tasks in `status`, in insertion order.
    pub fn by_status(&self, status: Status) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, id: &TaskId) -> Result<usize, TaskError> {
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    // Millisecond timestamps, bumped when two creations share a millisecond.
    fn next_id(&mut self) -> TaskId {
        let now = Utc::now().timestamp_millis();
        let issued = now.max(self.last_issued + 1);
        self.last_issued = issued;
        TaskId::new(issued.to_string())
    }
}

fn dashboard_order(a: &Task, b: &Task) -> Ordering {
    b.priority_score()
        .cmp(&a.priority_score())
        .then_with(|| a.due_date.cmp(&b.due_date))
}
