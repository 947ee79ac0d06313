//! Local mirror of a node fed by the streaming REST API.
//!
//! The server sends `put` events (replace the value at `path`) and `patch`
//! events (merge children into the value at `path`), with paths relative to
//! the watched node.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Payload of a `put` or `patch` event.
#[derive(Debug, Deserialize)]
pub struct StreamMessage {
    pub path: String,
    pub data: Value,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Sets the value at `path`, turning any non-object node on the way into an
/// object.
fn put_at(node: &mut Value, path: &[&str], data: Value) {
    let Some((first, rest)) = path.split_first() else {
        *node = data;
        return;
    };
    let map = match node {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(Map::new());
            let Value::Object(map) = other else {
                return;
            };
            map
        }
    };
    put_at(map.entry(first.to_string()).or_insert(Value::Null), rest, data);
}

/// Removes the value at `path`. Missing parents mean there is nothing to
/// remove.
fn remove_at(node: &mut Value, path: &[&str]) {
    match path {
        [] => *node = Value::Null,
        [last] => {
            if let Value::Object(map) = node {
                map.remove(*last);
            }
        }
        [first, rest @ ..] => {
            if let Some(child) = node.get_mut(*first) {
                remove_at(child, rest);
            }
        }
    }
}

/// Applies a `put`: the value at `path` becomes `data` (`null` deletes it).
pub fn apply_put(root: &mut Value, path: &str, data: Value) {
    let path = segments(path);
    if data.is_null() {
        remove_at(root, &path);
    } else {
        put_at(root, &path, data);
    }
}

/// Applies a `patch`: each child of `data` is put under `path`.
pub fn apply_patch(root: &mut Value, path: &str, data: Value) {
    let Value::Object(children) = data else {
        return;
    };
    let base = path.trim_end_matches('/');
    for (key, value) in children {
        apply_put(root, &format!("{base}/{key}"), value);
    }
}
