//! One-time migration of the flat skills list into the categorized buckets.
//!
//! Older documents stored `skills` as `["Rust", "Go", ...]`. The bucketed shape is the
//! only one carried on a `Record`, so a flat list is folded into
//! `programmingLanguages` when it is imported.

use serde_json::Value;
use tracing::debug;

use crate::models::SkillBuckets;

/// Folds a flat skill list into buckets: trimmed, non-blank entries joined with ", ".
pub fn migrate_flat_skills<S: AsRef<str>>(skills: &[S]) -> SkillBuckets {
    let joined = skills
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    SkillBuckets {
        programming_languages: joined,
        ..SkillBuckets::default()
    }
}

/// Reads a raw `skills` value in either shape.
///
/// Returns `None` when the value is neither an object nor an array, in which case the
/// caller keeps its current buckets. Non-string list items are skipped.
pub(crate) fn import_skills(value: Value) -> Option<SkillBuckets> {
    match value {
        Value::Array(items) => {
            debug!(items = items.len(), "migrating flat skills list to buckets");
            let strings: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            Some(migrate_flat_skills(&strings))
        }
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_list_joins_into_programming_languages() {
        let buckets = migrate_flat_skills(&["Rust", " Go ", "", "  ", "SQL"]);
        assert_eq!(buckets.programming_languages, "Rust, Go, SQL");
        assert_eq!(buckets.frontend_backend, "");
        assert_eq!(buckets.tools, "");
    }

    #[test]
    fn test_empty_flat_list_gives_empty_buckets() {
        let empty: [&str; 0] = [];
        assert_eq!(migrate_flat_skills(&empty), SkillBuckets::default());
    }

    #[test]
    fn test_import_skills_accepts_bucket_object() {
        let buckets = import_skills(json!({ "tools": "Docker" })).unwrap();
        assert_eq!(buckets.tools, "Docker");
        assert_eq!(buckets.programming_languages, "");
    }

    #[test]
    fn test_import_skills_skips_non_string_items() {
        let buckets = import_skills(json!(["Rust", 42, "Go"])).unwrap();
        assert_eq!(buckets.programming_languages, "Rust, Go");
    }

    #[test]
    fn test_import_skills_rejects_scalar() {
        assert!(import_skills(json!("Rust")).is_none());
        assert!(import_skills(json!(7)).is_none());
    }
}
