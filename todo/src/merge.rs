//! Conversions between the local item list and the stored document.

use std::collections::HashSet;

use moss_driver::is_plain_record;
use moss_types::TodoItem;
use serde_json::{Map, Value, json};

/// Drop later items whose `guid` was already seen. Order is preserved.
#[must_use]
pub fn remove_duplicates(items: Vec<TodoItem>) -> Vec<TodoItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.guid.clone()))
        .collect()
}

/// Remote items first, then local ones, deduplicated by `guid`.
#[must_use]
pub fn merge_lists(remote: Vec<TodoItem>, local: Vec<TodoItem>) -> Vec<TodoItem> {
    let mut combined = remote;
    combined.extend(local);
    remove_duplicates(combined)
}

fn read_entry(entry: &Value) -> Result<TodoItem, serde_json::Error> {
    serde_json::from_value(entry.clone())
}

/// Items stored in a document's `object`, in stored order.
///
/// Only a plain record holds items; any other shape (a list, a string, nothing)
/// yields an empty list. Entries that do not describe an item are skipped.
#[must_use]
pub fn pack_remote_items(object: &Value) -> Vec<TodoItem> {
    if !is_plain_record(object) {
        return Vec::new();
    }
    let Value::Object(entries) = object else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(key, entry)| match read_entry(entry) {
            Ok(mut item) => {
                item.value = item.value.trim().to_string();
                Some(item)
            }
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Skipping unreadable remote entry");
                None
            }
        })
        .collect()
}

/// The guid-keyed object stored remotely. A repeated `guid` keeps its last item.
#[must_use]
pub fn unpack_for_payload(items: &[TodoItem]) -> Value {
    let mut payload = Map::with_capacity(items.len());
    for item in items {
        payload.insert(
            item.guid.to_string(),
            json!({
                "guid": item.guid.as_str(),
                "value": item.value,
                "isDone": item.is_done,
                "state": item.state.code(),
            }),
        );
    }
    Value::Object(payload)
}

/// Like [`unpack_for_payload`], but entries of `fetched` that
/// [`pack_remote_items`] could not read are carried over untouched after the
/// items, so replacing the stored object never drops them.
#[must_use]
pub fn unpack_over(fetched: &Value, items: &[TodoItem]) -> Value {
    let mut payload = unpack_for_payload(items);
    if let (Value::Object(payload), Value::Object(entries)) = (&mut payload, fetched) {
        for (key, entry) in entries {
            if read_entry(entry).is_err() && !payload.contains_key(key) {
                payload.insert(key.clone(), entry.clone());
            }
        }
    }
    payload
}
