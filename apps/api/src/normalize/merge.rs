//! Merge of possibly-partial external data onto the Record template.
//!
//! # Merge rules
//! - Every top-level key present in the external document replaces the template's key.
//! - `personalInfo` merges one level deeper: each string sub-key replaces its template
//!   counterpart, missing sub-keys keep the template value.
//! - `null`, wrong-typed or unknown keys are ignored and the template value stays.
//! - A `null` item inside a list becomes a blank entry in its position.
//! - A flat-list `skills` value is migrated to buckets.
//!
//! The merge never fails. The worst outcome for any input is the template itself.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{PersonalInfo, Record};
use crate::normalize::migrate::import_skills;

/// Merges `external` onto `template` and returns the resulting Record.
///
/// Idempotent: feeding the serialized output back in yields the same Record.
pub fn initialize(template: &Record, external: Option<&Value>) -> Record {
    let mut record = template.clone();

    let fields = match external {
        None => return record,
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            warn!(
                kind = value_kind(other),
                "external record is not an object; using template"
            );
            return record;
        }
    };

    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        let value = strip_nulls(value.clone());
        match key.as_str() {
            "personalInfo" => merge_personal_info(&mut record.personal_info, &value),
            "professionalSummary" => assign(&mut record.professional_summary, value, key),
            "education" => {
                let value = blank_null_items(value, blank_entry());
                assign(&mut record.education, value, key)
            }
            "projects" => {
                let value = blank_null_items(value, blank_entry());
                assign(&mut record.projects, value, key)
            }
            "achievements" => assign(
                &mut record.achievements,
                blank_null_items(value, Value::String(String::new())),
                key,
            ),
            "skills" => match import_skills(value) {
                Some(skills) => record.skills = skills,
                None => warn!(key = %key, "malformed skills value; keeping template value"),
            },
            _ => debug!(key = %key, "ignoring unknown record key"),
        }
    }

    record
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn merge_personal_info(target: &mut PersonalInfo, value: &Value) {
    let Some(fields) = value.as_object() else {
        warn!(
            kind = value_kind(value),
            "personalInfo is not an object; keeping template value"
        );
        return;
    };

    for (key, value) in fields {
        let slot = match key.as_str() {
            "fullName" => &mut target.full_name,
            "email" => &mut target.email,
            "phone" => &mut target.phone,
            "linkedin" => &mut target.linkedin,
            "github" => &mut target.github,
            _ => {
                debug!(key = %key, "ignoring unknown personalInfo key");
                continue;
            }
        };
        match value.as_str() {
            Some(text) => *slot = text.to_string(),
            None => debug!(key = %key, "non-string personalInfo value ignored"),
        }
    }
}

/// Replaces `slot` with `value` if it deserializes; logs and keeps the old value otherwise.
fn assign<T: DeserializeOwned>(slot: &mut T, value: Value, key: &str) {
    match serde_json::from_value(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!(key, error = %e, "malformed record key; keeping template value"),
    }
}

/// Removes `null` members from objects at every depth so that they fall back to
/// field defaults during deserialization.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Replaces top-level `null` items of a list with `blank`. Non-lists pass through.
fn blank_null_items(value: Value, blank: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| if item.is_null() { blank.clone() } else { item })
                .collect(),
        ),
        other => other,
    }
}

fn blank_entry() -> Value {
    Value::Object(Map::new())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
