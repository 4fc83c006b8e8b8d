#![allow(dead_code)]

use std::collections::VecDeque;

use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{Value, json};
use taskdeck_core::error::RepositoryError;
use taskdeck_core::repository::TaskRepository;
use taskdeck_shared::{CreateTaskRequest, DeleteTaskRequest, TaskEnvelope, UpdateTaskRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Create(CreateTaskRequest),
    Update(UpdateTaskRequest),
    Delete(DeleteTaskRequest),
}

/// Replays queued responses in order and records every call it receives.
/// Running out of responses is reported as an HTTP 500.
#[derive(Debug, Default)]
pub struct ScriptedRepository {
    responses: Mutex<VecDeque<Result<TaskEnvelope, RepositoryError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, envelope: TaskEnvelope) -> Self {
        self.responses.lock().push_back(Ok(envelope));
        self
    }

    pub fn fail_with_status(self, status: StatusCode) -> Self {
        self.responses.lock().push_back(Err(status_error(status)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn next(&self, call: Call) -> Result<TaskEnvelope, RepositoryError> {
        self.calls.lock().push(call);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(status_error(StatusCode::INTERNAL_SERVER_ERROR)))
    }
}

impl TaskRepository for ScriptedRepository {
    async fn list(&self) -> Result<TaskEnvelope, RepositoryError> {
        self.next(Call::List)
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        self.next(Call::Create(request.clone()))
    }

    async fn update(&self, request: &UpdateTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        self.next(Call::Update(request.clone()))
    }

    async fn delete(&self, request: &DeleteTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        self.next(Call::Delete(request.clone()))
    }
}

pub fn status_error(status: StatusCode) -> RepositoryError {
    RepositoryError::Status {
        method: "GET".to_string(),
        url: "http://localhost:3000/api/tasks".to_string(),
        status,
    }
}

pub fn ok(data: Value) -> TaskEnvelope {
    TaskEnvelope {
        success: true,
        message: Some("ok".to_string()),
        data: Some(data),
        ..TaskEnvelope::default()
    }
}

pub fn ok_empty() -> TaskEnvelope {
    TaskEnvelope {
        success: true,
        ..TaskEnvelope::default()
    }
}

pub fn rejected(message: Option<&str>) -> TaskEnvelope {
    TaskEnvelope {
        success: false,
        message: message.map(str::to_string),
        ..TaskEnvelope::default()
    }
}

pub fn raw_task(id: u64, title: &str, is_done: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("descripción de {title}"),
        "priority": 2,
        "is_done": is_done,
        "created_at": "2024-05-01T10:00:00Z",
    })
}
