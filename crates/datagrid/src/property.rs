//! Lenient property access on row items.
//!
//! Rows are heterogeneous: a path that does not resolve, or that walks
//! through a scalar, yields `None` instead of an error.

use serde_json::Value;

/// Removes a leading `root_alias.` from a path.
pub fn strip_root_alias<'a>(path: &'a str, root_alias: &str) -> &'a str {
    if root_alias.is_empty() {
        return path;
    }
    path.strip_prefix(root_alias)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
}

/// Prefixes `path` with the root alias unless it already names one.
pub fn qualify(path: &str, root_alias: &str) -> String {
    if root_alias.is_empty() || path.contains('.') {
        path.to_string()
    } else {
        format!("{root_alias}.{path}")
    }
}

/// Reads a dot-separated property path from `item`.
///
/// Array elements are addressed by index. An empty path yields the item
/// itself.
///
/// ```
/// use datagrid::try_get_property;
/// use serde_json::json;
///
/// let item = json!({"author": {"name": "Ada"}, "tags": ["a", "b"]});
/// assert_eq!(try_get_property(&item, "author.name"), Some(json!("Ada")));
/// assert_eq!(try_get_property(&item, "tags.1"), Some(json!("b")));
/// assert_eq!(try_get_property(&item, "author.name.first"), None);
/// ```
pub fn try_get_property(item: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(item.clone());
    }
    let mut current = item;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Writes `value` into `target` at a dot-separated path, creating
/// intermediate objects and replacing scalars in the way.
pub fn set_nested(target: &mut serde_json::Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = target;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(serde_json::Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strip_alias_only_as_prefix_segment() {
        assert_eq!(strip_root_alias("u.name", "u"), "name");
        assert_eq!(strip_root_alias("user.name", "u"), "user.name");
        assert_eq!(strip_root_alias("name", ""), "name");
    }

    #[test]
    fn qualify_paths() {
        assert_eq!(qualify("name", "u"), "u.name");
        assert_eq!(qualify("o.total", "u"), "o.total");
        assert_eq!(qualify("name", ""), "name");
    }

    #[test]
    fn missing_is_none() {
        let item = json!({"a": null});
        assert_eq!(try_get_property(&item, "a"), Some(Value::Null));
        assert_eq!(try_get_property(&item, "b"), None);
    }

    #[test]
    fn nested_set() {
        let mut row = serde_json::Map::new();
        set_nested(&mut row, "author.name", json!({"display": "Ada"}));
        set_nested(&mut row, "author.age", json!({"display": 36}));
        set_nested(&mut row, "id", json!({"display": 1}));
        assert_eq!(
            Value::Object(row),
            json!({
                "author": {"name": {"display": "Ada"}, "age": {"display": 36}},
                "id": {"display": 1}
            })
        );
    }
}
