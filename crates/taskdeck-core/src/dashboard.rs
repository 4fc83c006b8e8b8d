//! Dashboard state container.
//!
//! The dashboard owns the canonical task list for a session. State lives in
//! immutable [`DashboardSnapshot`]s; every transition builds a new snapshot
//! and publishes it on a `watch` channel that views subscribe to. List
//! mutations only happen after the server confirmed the operation.

use std::sync::{Arc, OnceLock};

use taskdeck_shared::{CreateTaskRequest, UpdateTaskRequest};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::facade::TaskFacade;
use crate::repository::TaskRepository;
use crate::task::Task;

const MISSING_TASK_MESSAGE: &str = "La tarea no existe";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Closed,
    Creating,
    Editing(Task),
}

/// Result of a dashboard transition. Failures are also recorded in the
/// snapshot's `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Declined,
    Failed,
}

#[derive(Debug, Default)]
struct Partition {
    pending: Vec<usize>,
    completed: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct DashboardSnapshot {
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
    dialog: Dialog,
    partition: OnceLock<Partition>,
}

impl DashboardSnapshot {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.has_id(id))
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        let tasks = &self.tasks;
        self.partition()
            .pending
            .iter()
            .map(move |&idx| &tasks[idx])
    }

    pub fn completed_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        let tasks = &self.tasks;
        self.partition()
            .completed
            .iter()
            .map(move |&idx| &tasks[idx])
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.partition().pending.len()
    }

    pub fn completed_count(&self) -> usize {
        self.partition().completed.len()
    }

    // Computed once per snapshot; a new snapshot starts with an empty memo.
    fn partition(&self) -> &Partition {
        self.partition.get_or_init(|| {
            let mut partition = Partition::default();
            for (idx, task) in self.tasks.iter().enumerate() {
                if task.is_done {
                    partition.completed.push(idx);
                } else {
                    partition.pending.push(idx);
                }
            }
            partition
        })
    }

    fn evolve(&self, apply: impl FnOnce(&mut DashboardSnapshot)) -> DashboardSnapshot {
        let mut next = DashboardSnapshot {
            tasks: self.tasks.clone(),
            loading: self.loading,
            error: self.error.clone(),
            dialog: self.dialog.clone(),
            partition: OnceLock::new(),
        };
        apply(&mut next);
        next
    }
}

pub struct Dashboard<R> {
    facade: TaskFacade<R>,
    state: watch::Sender<Arc<DashboardSnapshot>>,
}

impl<R: TaskRepository> Dashboard<R> {
    pub fn new(facade: TaskFacade<R>) -> Self {
        let (state, _) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self { facade, state }
    }

    pub fn facade(&self) -> &TaskFacade<R> {
        &self.facade
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.state.subscribe()
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Outcome {
        self.publish(|state| state.loading = true);

        match self.facade.list().await {
            Ok(tasks) => {
                info!(count = tasks.len(), "tasks loaded");
                self.publish(|state| {
                    state.tasks = tasks;
                    state.loading = false;
                    state.error = None;
                });
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "load failed; keeping current list");
                self.publish(|state| {
                    state.loading = false;
                    state.error = Some(err.to_string());
                });
                Outcome::Failed
            }
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&mut self, request: &CreateTaskRequest) -> Outcome {
        match self.facade.create(request).await {
            Ok(task) => {
                info!(id = %task.id, "task created");
                self.publish(|state| {
                    state.tasks.insert(0, task);
                    state.dialog = Dialog::Closed;
                });
                Outcome::Applied
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update(&mut self, request: &UpdateTaskRequest) -> Outcome {
        match self.facade.update(request).await {
            Ok(task) => {
                self.replace(task);
                Outcome::Applied
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_status(&mut self, id: &str) -> Outcome {
        let Some(current) = self.snapshot().find(id).map(|task| task.is_done) else {
            return self.fail(MISSING_TASK_MESSAGE.to_string());
        };

        match self.facade.toggle_status(id, current).await {
            Ok(task) => {
                self.replace(task);
                Outcome::Applied
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    /// `confirm` is asked first; when it declines, the repository is never
    /// called and the list stays as it is.
    #[instrument(skip(self, confirm))]
    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> Outcome
    where
        F: FnOnce(Option<&Task>) -> bool,
    {
        let snapshot = self.snapshot();
        if !confirm(snapshot.find(id)) {
            debug!("delete declined");
            return Outcome::Declined;
        }

        match self.facade.delete(id).await {
            Ok(()) => {
                info!("task deleted");
                self.publish(|state| state.tasks.retain(|task| !task.has_id(id)));
                Outcome::Applied
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    pub fn open_create_dialog(&mut self) {
        self.publish(|state| state.dialog = Dialog::Creating);
    }

    pub fn open_edit_dialog(&mut self, id: &str) -> bool {
        let Some(task) = self.snapshot().find(id).cloned() else {
            return false;
        };
        self.publish(|state| state.dialog = Dialog::Editing(task));
        true
    }

    pub fn close_dialog(&mut self) {
        self.publish(|state| state.dialog = Dialog::Closed);
    }

    pub fn clear_error(&mut self) {
        self.publish(|state| state.error = None);
    }

    /// Replaces the task with the same id in place. A response for a task
    /// that is no longer listed is dropped; last response wins otherwise.
    fn replace(&mut self, task: Task) {
        self.publish(|state| {
            match state.tasks.iter_mut().find(|current| current.has_id(&task.id)) {
                Some(slot) => *slot = task,
                None => debug!(id = %task.id, "updated task no longer listed; dropping"),
            }
            state.dialog = Dialog::Closed;
        });
    }

    fn fail(&mut self, message: String) -> Outcome {
        warn!(error = %message, "dashboard operation failed");
        self.publish(|state| state.error = Some(message));
        Outcome::Failed
    }

    fn publish(&self, apply: impl FnOnce(&mut DashboardSnapshot)) {
        let next = self.state.borrow().evolve(apply);
        self.state.send_replace(Arc::new(next));
    }
}
