//! Wire types exchanged with the task API.
//!
//! Everything in here mirrors the JSON the server speaks. Task payloads
//! inside envelopes stay untyped (`serde_json::Value`) so the client can
//! normalize them instead of rejecting a whole response over one bad
//! field.

use serde::{
  Deserialize,
  Serialize
};
use serde_json::Value;

pub const TASKS_PATH: &str = "tasks";
pub const USERS_PATH: &str = "users";

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub enum TaskPriority {
  Low,
  #[default]
  Medium,
  High
}

impl TaskPriority {
  pub const ALL: [TaskPriority; 3] = [
    TaskPriority::Low,
    TaskPriority::Medium,
    TaskPriority::High
  ];

  pub fn from_level(
    level: u8
  ) -> Option<Self> {
    match level {
      | 1 => Some(Self::Low),
      | 2 => Some(Self::Medium),
      | 3 => Some(Self::High),
      | _ => None
    }
  }

  pub fn level(self) -> u8 {
    match self {
      | Self::Low => 1,
      | Self::Medium => 2,
      | Self::High => 3
    }
  }
}

impl TryFrom<u8> for TaskPriority {
  type Error = String;

  fn try_from(
    level: u8
  ) -> Result<Self, Self::Error> {
    Self::from_level(level).ok_or_else(
      || {
        format!(
          "priority must be 1, 2 or 3, \
           got {level}"
        )
      }
    )
  }
}

impl From<TaskPriority> for u8 {
  fn from(priority: TaskPriority) -> u8 {
    priority.level()
  }
}

/// `{success, message, data, count, id_user}` as returned by every
/// `/tasks` endpoint. `data` is an array for list, a single record for
/// create/update and null for delete.
/// `count` and `id_user` are informational and arrive with whatever type
/// the backend uses, so they stay untyped like `data`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
pub struct TaskEnvelope {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub data:    Option<Value>,
  #[serde(default)]
  pub count:   Option<Value>,
  #[serde(default)]
  pub id_user: Option<Value>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct CreateTaskRequest {
  pub title:       String,
  pub description: String,
  pub priority:    TaskPriority
}

/// Partial update. Only the fields that are `Some` go on the wire.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct UpdateTaskRequest {
  pub id:          String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub title:       Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:    Option<TaskPriority>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub is_done:     Option<bool>
}

impl UpdateTaskRequest {
  pub fn new(
    id: impl Into<String>
  ) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  pub fn toggle(
    id: impl Into<String>,
    current_status: bool
  ) -> Self {
    Self {
      is_done: Some(!current_status),
      ..Self::new(id)
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DeleteTaskRequest {
  pub id: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct User {
  pub id_user: String,
  pub mail:    String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CreateUserRequest {
  pub mail: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct UserResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub token:   Option<String>,
  #[serde(default)]
  pub exists:  bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct CreateUserResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub token:   Option<String>
}
