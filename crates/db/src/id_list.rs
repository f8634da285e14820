//! Helpers for JSON id-array columns.
//!
//! Id arrays behave as sets: `push` never inserts a duplicate and `pull`
//! removes every occurrence. Insertion order is kept so listings stay stable.

use sea_orm::prelude::Json;
use serde_json::json;

/// An empty id array, used as the initial value of every relation column.
#[must_use]
pub fn empty() -> Json {
    json!([])
}

/// Decode an id-array column. Malformed values decode as empty.
#[must_use]
pub fn ids(value: &Json) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Encode ids back into a column value.
#[must_use]
pub fn to_json(ids: &[String]) -> Json {
    json!(ids)
}

/// Whether `id` is present in the array.
#[must_use]
pub fn contains(value: &Json, id: &str) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(id)))
}

/// Return the array with `id` appended, unless already present.
#[must_use]
pub fn push(value: &Json, id: &str) -> Json {
    let mut list = ids(value);
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
    to_json(&list)
}

/// Return the array with every id in `remove` taken out.
#[must_use]
pub fn pull<I, S>(value: &Json, remove: I) -> Json
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let remove: Vec<S> = remove.into_iter().collect();
    let mut list = ids(value);
    list.retain(|existing| !remove.iter().any(|r| r.as_ref() == existing));
    to_json(&list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_is_idempotent() {
        let value = push(&empty(), "a");
        let value = push(&value, "b");
        let value = push(&value, "a");
        assert_eq!(ids(&value), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_pull_removes_all_listed() {
        let value = json!(["a", "b", "c", "b"]);
        let value = pull(&value, ["b", "z"]);
        assert_eq!(ids(&value), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_contains() {
        let value = json!(["a", "b"]);
        assert!(contains(&value, "a"));
        assert!(!contains(&value, "c"));
        assert!(!contains(&json!(null), "a"));
    }

    #[test]
    fn test_malformed_column_decodes_empty() {
        assert!(ids(&json!({"not": "an array"})).is_empty());
        assert_eq!(ids(&push(&json!(null), "x")), vec!["x".to_string()]);
    }
}
