//! Normalization of loosely typed task payloads into [`Task`].
//!
//! The API is not strict about its records: priorities arrive as numbers
//! or strings, dates in several shapes, flags as anything truthy. Every
//! field gets a fallback here so a single odd record never blanks the
//! dashboard. Substitutions are logged, never raised.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::TaskError;
use crate::task::{Task, TaskPriority};

pub const DEFAULT_PRIORITY: TaskPriority = TaskPriority::Medium;

pub fn to_local_task(raw: &Value) -> Result<Task, TaskError> {
    to_local_task_at(raw, Utc::now())
}

/// Same as [`to_local_task`] with an explicit "now" used for missing or
/// unparsable dates.
#[instrument(skip(raw, now))]
pub fn to_local_task_at(raw: &Value, now: DateTime<Utc>) -> Result<Task, TaskError> {
    if raw.is_null() {
        return Err(TaskError::InvalidInput(
            "task data cannot be null".to_string(),
        ));
    }

    Ok(Task {
        id: normalize_id(raw.get("id")),
        title: text_or_empty(raw.get("title")),
        description: text_or_empty(raw.get("description")),
        is_done: raw.get("is_done").is_some_and(is_truthy),
        priority: normalize_priority(raw.get("priority")),
        created_at: normalize_date(raw.get("created_at"), now),
    })
}

/// Anything that is not an array (missing data, `null`, an object) yields
/// an empty list. A `null` element inside the array is still an error.
pub fn to_local_tasks(raw: Option<&Value>) -> Result<Vec<Task>, TaskError> {
    to_local_tasks_at(raw, Utc::now())
}

pub fn to_local_tasks_at(
    raw: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<Vec<Task>, TaskError> {
    let Some(Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| to_local_task_at(item, now))
        .collect()
}

fn normalize_id(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        other => {
            warn!(id = ?other, "task record without usable id");
            String::new()
        }
    }
}

fn text_or_empty(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(text)) => text.clone(),
        Some(value @ (Value::Number(_) | Value::Bool(true))) if is_truthy(value) => {
            value.to_string()
        }
        _ => String::new(),
    }
}

fn normalize_priority(raw: Option<&Value>) -> TaskPriority {
    let level = raw.map(loose_number).unwrap_or(f64::NAN);

    let valid = level.is_finite() && level.fract() == 0.0 && (1.0..=3.0).contains(&level);
    match valid.then(|| TaskPriority::from_level(level as u8)).flatten() {
        Some(priority) => priority,
        None => {
            warn!(
                priority = ?raw,
                fallback = DEFAULT_PRIORITY.level(),
                "invalid priority value, using default"
            );
            DEFAULT_PRIORITY
        }
    }
}

fn normalize_date(raw: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(value) = raw.filter(|value| is_truthy(value)) else {
        return now;
    };

    let parsed = match value {
        Value::String(text) => parse_date_text(text.trim()),
        Value::Number(millis) => millis
            .as_f64()
            .filter(|millis| millis.is_finite())
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64)),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        warn!(created_at = %value, "invalid date value, using current date");
        now
    })
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Numeric coercion as a loose JSON consumer performs it.
fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|number| number != 0.0 && !number.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use super::{to_local_task, to_local_task_at, to_local_tasks, to_local_tasks_at};
    use crate::error::TaskError;
    use crate::task::TaskPriority;

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 10, 30, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn malformed_priorities_fall_back_to_medium() {
        let malformed = [
            json!("abc"),
            json!(0),
            json!(4),
            json!(null),
            json!(2.5),
            json!(-1),
            json!(""),
            json!([3]),
        ];

        for priority in malformed {
            let raw = json!({ "id": "1", "title": "t", "priority": priority.clone() });
            let task = to_local_task_at(&raw, fixed_now()).expect("transform");
            assert_eq!(task.priority, TaskPriority::Medium, "priority {priority}");
        }

        let missing = to_local_task_at(&json!({ "id": "1" }), fixed_now()).expect("transform");
        assert_eq!(missing.priority, TaskPriority::Medium);
    }

    #[test]
    fn numeric_strings_and_numbers_are_accepted() {
        let high = to_local_task_at(&json!({ "priority": "3" }), fixed_now()).expect("transform");
        assert_eq!(high.priority, TaskPriority::High);

        let low = to_local_task_at(&json!({ "priority": 1 }), fixed_now()).expect("transform");
        assert_eq!(low.priority, TaskPriority::Low);

        let float_low =
            to_local_task_at(&json!({ "priority": 1.0 }), fixed_now()).expect("transform");
        assert_eq!(float_low.priority, TaskPriority::Low);
    }

    #[test]
    fn malformed_dates_become_now() {
        let malformed = [json!("not a date"), json!("2026-13-45"), json!({}), json!(false)];
        for created_at in malformed {
            let raw = json!({ "id": "1", "created_at": created_at.clone() });
            let task = to_local_task_at(&raw, fixed_now()).expect("transform");
            assert_eq!(task.created_at, fixed_now(), "created_at {created_at}");
        }
    }

    #[test]
    fn supported_date_shapes_parse() {
        let expected = Utc
            .with_ymd_and_hms(2025, 1, 15, 8, 0, 0)
            .single()
            .expect("valid date");

        for created_at in [
            json!("2025-01-15T08:00:00Z"),
            json!("2025-01-15T08:00:00.000Z"),
            json!("2025-01-15T10:00:00+02:00"),
            json!("2025-01-15 08:00:00"),
            json!(expected.timestamp_millis()),
        ] {
            let task = to_local_task_at(&json!({ "created_at": created_at.clone() }), fixed_now())
                .expect("transform");
            assert_eq!(task.created_at, expected, "created_at {created_at}");
        }

        let date_only = to_local_task_at(&json!({ "created_at": "2025-01-15" }), fixed_now())
            .expect("transform");
        assert_eq!(date_only.created_at.format("%Y-%m-%d %H:%M").to_string(), "2025-01-15 00:00");
    }

    #[test]
    fn missing_text_fields_default_to_empty() {
        let task = to_local_task_at(
            &json!({ "id": 12, "title": null, "is_done": 1 }),
            fixed_now(),
        )
        .expect("transform");

        assert_eq!(task.id, "12");
        assert_eq!(task.title, "");
        assert_eq!(task.description, "");
        assert!(task.is_done);
    }

    #[test]
    fn done_flag_uses_truthiness() {
        for (raw, expected) in [
            (json!(true), true),
            (json!("yes"), true),
            (json!(0), false),
            (json!(""), false),
            (json!(null), false),
        ] {
            let task = to_local_task_at(&json!({ "is_done": raw.clone() }), fixed_now())
                .expect("transform");
            assert_eq!(task.is_done, expected, "is_done {raw}");
        }
    }

    #[test]
    fn null_record_is_rejected() {
        let err = to_local_task(&Value::Null).expect_err("null must fail");
        assert!(matches!(err, TaskError::InvalidInput(_)));
    }

    #[test]
    fn non_arrays_yield_no_tasks() {
        assert!(to_local_tasks(None).expect("missing").is_empty());
        assert!(to_local_tasks(Some(&Value::Null)).expect("null").is_empty());
        assert!(
            to_local_tasks(Some(&json!({ "id": "1" })))
                .expect("object")
                .is_empty()
        );
    }

    #[test]
    fn arrays_keep_server_order() {
        let raw = json!([
            { "id": "a", "title": "first", "priority": 3 },
            { "id": "b", "title": "second", "priority": "x" }
        ]);
        let tasks = to_local_tasks_at(Some(&raw), fixed_now()).expect("transform");
        let ids: Vec<_> = tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(tasks[1].priority, TaskPriority::Medium);
    }
}
