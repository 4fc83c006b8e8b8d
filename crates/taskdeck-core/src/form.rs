use taskdeck_shared::{CreateTaskRequest, TaskPriority, UpdateTaskRequest};
use thiserror::Error;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El título es requerido")]
    TitleRequired,

    #[error("El título debe tener al menos 3 caracteres")]
    TitleTooShort,

    #[error("El título no puede superar 100 caracteres")]
    TitleTooLong,

    #[error("La descripción no puede superar 500 caracteres")]
    DescriptionTooLong,

    #[error("La prioridad debe ser 1, 2 o 3")]
    InvalidPriority(u8),

    #[error("El correo no es válido")]
    InvalidEmail,
}

/// Raw input for creating or editing a task, checked before anything is
/// sent to the API.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: u8,
}

impl TaskForm {
    pub fn into_create_request(self) -> Result<CreateTaskRequest, ValidationError> {
        Ok(CreateTaskRequest {
            title: validate_title(&self.title)?,
            description: validate_description(&self.description)?,
            priority: validate_priority(self.priority)?,
        })
    }
}

/// Edits only carry the fields the user touched; each present field is
/// validated like on creation.
pub fn validate_update(
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
    priority: Option<u8>,
) -> Result<UpdateTaskRequest, ValidationError> {
    Ok(UpdateTaskRequest {
        title: title.map(validate_title).transpose()?,
        description: description.map(validate_description).transpose()?,
        priority: priority.map(validate_priority).transpose()?,
        ..UpdateTaskRequest::new(id)
    })
}

pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    let chars = title.chars().count();
    if chars == 0 {
        Err(ValidationError::TitleRequired)
    } else if chars < TITLE_MIN_CHARS {
        Err(ValidationError::TitleTooShort)
    } else if chars > TITLE_MAX_CHARS {
        Err(ValidationError::TitleTooLong)
    } else {
        Ok(title.to_string())
    }
}

pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(description.to_string())
}

pub fn validate_priority(level: u8) -> Result<TaskPriority, ValidationError> {
    TaskPriority::from_level(level).ok_or(ValidationError::InvalidPriority(level))
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if valid && !email.contains(char::is_whitespace) {
        Ok(email.to_string())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}
