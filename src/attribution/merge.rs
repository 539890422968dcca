//! Recursive merge of option objects.
//!
//! Rules, applied at every level:
//! - object onto object: merged key by key, recursively
//! - array onto array: concatenated, base entries first
//! - anything else: the overlay value replaces the base value
//!
//! Concatenation is what lets `{ "params": ["foo"] }` track `foo` on top of
//! the built-in UTM keys. Callers who want their list to be the only one pass
//! `"defaults": false`, which empties the built-in list before merging.

use serde_json::Value;

pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arrays_concatenate() {
        let mut base = json!({ "params": ["utm_source", "utm_medium"] });
        deep_merge(&mut base, json!({ "params": ["foo"] }));
        assert_eq!(base, json!({ "params": ["utm_source", "utm_medium", "foo"] }));
    }

    #[test]
    fn test_nested_objects_add_keys() {
        let mut base = json!({ "data": { "referrer": "direct" } });
        deep_merge(&mut base, json!({ "data": { "baz": "qux" } }));
        assert_eq!(base, json!({ "data": { "referrer": "direct", "baz": "qux" } }));
    }

    #[test]
    fn test_overlay_scalar_replaces() {
        let mut base = json!({ "timeout": 30, "data": { "referrer": "direct" } });
        deep_merge(&mut base, json!({ "timeout": 0, "data": { "referrer": null } }));
        assert_eq!(base, json!({ "timeout": 0, "data": { "referrer": null } }));
    }

    #[test]
    fn test_type_change_replaces() {
        let mut base = json!({ "params": ["utm_source"] });
        deep_merge(&mut base, json!({ "params": "utm_source" }));
        assert_eq!(base, json!({ "params": "utm_source" }));
    }

    #[test]
    fn test_key_order_preserved() {
        let mut base = json!({ "data": { "referrer": "direct" } });
        deep_merge(&mut base, json!({ "data": { "zeta": 1, "alpha": 2 } }));
        let keys: Vec<_> = base["data"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["referrer", "zeta", "alpha"]);
    }
}
