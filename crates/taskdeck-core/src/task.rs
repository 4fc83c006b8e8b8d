use chrono::{DateTime, Utc};

pub use taskdeck_shared::TaskPriority;

/// A task as held in client state. Only the transformer builds these from
/// wire data, so `priority` and `created_at` are always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn has_id(&self, id: &str) -> bool {
        self.id == id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityStyle {
    pub label: &'static str,
    pub marker: char,
    /// ANSI SGR color code.
    pub color: &'static str,
}

const LOW_STYLE: PriorityStyle = PriorityStyle {
    label: "Baja",
    marker: '●',
    color: "32",
};

const MEDIUM_STYLE: PriorityStyle = PriorityStyle {
    label: "Media",
    marker: '●',
    color: "33",
};

const HIGH_STYLE: PriorityStyle = PriorityStyle {
    label: "Alta",
    marker: '●',
    color: "31",
};

pub fn priority_style(priority: TaskPriority) -> PriorityStyle {
    match priority {
        TaskPriority::Low => LOW_STYLE,
        TaskPriority::Medium => MEDIUM_STYLE,
        TaskPriority::High => HIGH_STYLE,
    }
}
