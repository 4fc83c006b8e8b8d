use serde_json::Value;
use taskdeck_shared::{CreateTaskRequest, DeleteTaskRequest, TaskEnvelope, UpdateTaskRequest};
use tracing::{error, instrument};

use crate::error::{RepositoryError, TaskError};
use crate::repository::TaskRepository;
use crate::task::Task;
use crate::transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Used when the server rejects the call without a message.
    pub fn rejected_message(self) -> &'static str {
        match self {
            Self::Load => "Error al obtener las tareas",
            Self::Create => "Error al crear la tarea",
            Self::Update => "Error al actualizar la tarea",
            Self::Delete => "Error al eliminar la tarea",
        }
    }

    /// Shown for transport failures; the detail only goes to the log.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Load => "No se pudieron cargar las tareas",
            Self::Create => "No se pudo crear la tarea",
            Self::Update => "No se pudo actualizar la tarea",
            Self::Delete => "No se pudo eliminar la tarea",
        }
    }
}

/// Per-operation contract over a [`TaskRepository`]: a clean [`Task`] (or
/// nothing, for delete) or a [`TaskError::Operation`] fit for display.
#[derive(Debug)]
pub struct TaskFacade<R> {
    repository: R,
}

impl<R: TaskRepository> TaskFacade<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Task>, TaskError> {
        let envelope = self
            .repository
            .list()
            .await
            .map_err(|err| transport_failure(Operation::Load, &err))?;
        let data = accepted_data(Operation::Load, envelope)?;
        transform::to_local_tasks(Some(&data))
            .map_err(|err| transform_failure(Operation::Load, &err))
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateTaskRequest) -> Result<Task, TaskError> {
        let envelope = self
            .repository
            .create(request)
            .await
            .map_err(|err| transport_failure(Operation::Create, &err))?;
        single_task(Operation::Create, envelope)
    }

    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update(&self, request: &UpdateTaskRequest) -> Result<Task, TaskError> {
        let envelope = self
            .repository
            .update(request)
            .await
            .map_err(|err| transport_failure(Operation::Update, &err))?;
        single_task(Operation::Update, envelope)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), TaskError> {
        let request = DeleteTaskRequest { id: id.to_string() };
        let envelope = self
            .repository
            .delete(&request)
            .await
            .map_err(|err| transport_failure(Operation::Delete, &err))?;

        if envelope.success {
            Ok(())
        } else {
            Err(rejected(Operation::Delete, envelope.message))
        }
    }

    pub async fn toggle_status(&self, id: &str, current_status: bool) -> Result<Task, TaskError> {
        self.update(&UpdateTaskRequest::toggle(id, current_status))
            .await
    }
}

fn single_task(operation: Operation, envelope: TaskEnvelope) -> Result<Task, TaskError> {
    let data = accepted_data(operation, envelope)?;
    transform::to_local_task(&data).map_err(|err| transform_failure(operation, &err))
}

fn accepted_data(operation: Operation, envelope: TaskEnvelope) -> Result<Value, TaskError> {
    match envelope.data {
        Some(data) if envelope.success => Ok(data),
        _ => Err(rejected(operation, envelope.message)),
    }
}

fn rejected(operation: Operation, message: Option<String>) -> TaskError {
    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| operation.rejected_message().to_string());
    error!(?operation, message = %message, "API rejected task operation");
    TaskError::Operation(message)
}

fn transport_failure(operation: Operation, err: &RepositoryError) -> TaskError {
    error!(?operation, error = %err, "task request failed");
    TaskError::Operation(operation.failure_message().to_string())
}

fn transform_failure(operation: Operation, err: &TaskError) -> TaskError {
    error!(?operation, error = %err, "task payload could not be normalized");
    TaskError::Operation(operation.failure_message().to_string())
}
