//! Normalization of the catalog API's inconsistent response envelopes.
//!
//! Collection endpoints have been observed returning any of:
//!
//! ```text
//! [ {...}, {...} ]                          bare array
//! { "data": [ ... ] }                       resource wrapper
//! { "data": { "data": [ ... ], ... } }      paginator inside a wrapper
//! { "products": [ ... ] }                   named collection
//! ```
//!
//! The rules are tried in that order. Anything else yields an empty list and
//! a warning rather than an error, so a shape change degrades the storefront
//! instead of breaking it.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts the list of records from a collection response.
///
/// `resource` is the plural key used by the fourth rule, e.g. `"products"`.
#[must_use]
pub fn normalize_collection(body: Value, resource: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match map.remove("data") {
                Some(Value::Array(items)) => return items,
                Some(Value::Object(mut inner)) => {
                    if let Some(Value::Array(items)) = inner.remove("data") {
                        return items;
                    }
                }
                _ => {}
            }
            if let Some(Value::Array(items)) = map.remove(resource) {
                return items;
            }
            tracing::warn!(resource, "unrecognized collection envelope; treating as empty");
            Vec::new()
        }
        other => {
            tracing::warn!(
                resource,
                kind = value_kind(&other),
                "collection response is not an array or object; treating as empty"
            );
            Vec::new()
        }
    }
}

/// Extracts a single record from `{data: {...}}`, `{<singular>: {...}}` or a
/// bare object. Returns `None` for anything else.
#[must_use]
pub fn normalize_record(body: Value, singular: &str) -> Option<Value> {
    let Value::Object(mut map) = body else {
        return None;
    };
    if let Some(Value::Object(inner)) = map.remove("data") {
        return Some(Value::Object(inner));
    }
    if let Some(Value::Object(inner)) = map.remove(singular) {
        return Some(Value::Object(inner));
    }
    if map.contains_key("id") {
        return Some(Value::Object(map));
    }
    None
}

/// Decodes each record, skipping (and logging) the ones that do not fit `T`.
#[must_use]
pub fn decode_records<T: DeserializeOwned>(records: Vec<Value>, resource: &str) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<T>(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(resource, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(records: &[Value]) -> Vec<i64> {
        records.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    #[test]
    fn bare_array_is_returned_as_is() {
        let records = normalize_collection(json!([{"id": 1}, {"id": 2}]), "products");
        assert_eq!(ids(&records), vec![1, 2]);
    }

    #[test]
    fn data_wrapper_is_unwrapped() {
        let records = normalize_collection(json!({"data": [{"id": 3}]}), "products");
        assert_eq!(ids(&records), vec![3]);
    }

    #[test]
    fn paginator_inside_data_is_unwrapped() {
        let body = json!({"data": {"current_page": 1, "data": [{"id": 4}, {"id": 5}]}});
        assert_eq!(ids(&normalize_collection(body, "products")), vec![4, 5]);
    }

    #[test]
    fn named_collection_is_unwrapped() {
        let body = json!({"categories": [{"id": 6}]});
        assert_eq!(ids(&normalize_collection(body, "categories")), vec![6]);
    }

    #[test]
    fn data_wrapper_wins_over_named_collection() {
        let body = json!({"data": [{"id": 1}], "products": [{"id": 2}]});
        assert_eq!(ids(&normalize_collection(body, "products")), vec![1]);
    }

    #[test]
    fn unknown_shapes_degrade_to_empty() {
        assert!(normalize_collection(json!({"items": [{"id": 1}]}), "products").is_empty());
        assert!(normalize_collection(json!({"data": {"rows": []}}), "products").is_empty());
        assert!(normalize_collection(json!("oops"), "products").is_empty());
        assert!(normalize_collection(Value::Null, "products").is_empty());
    }

    #[test]
    fn record_shapes_are_unwrapped() {
        let wrapped = normalize_record(json!({"data": {"id": 1}}), "product");
        assert_eq!(wrapped, Some(json!({"id": 1})));

        let named = normalize_record(json!({"product": {"id": 2}, "message": "ok"}), "product");
        assert_eq!(named, Some(json!({"id": 2})));

        let bare = normalize_record(json!({"id": 3, "name": "x"}), "product");
        assert_eq!(bare, Some(json!({"id": 3, "name": "x"})));

        assert_eq!(normalize_record(json!({"message": "ok"}), "product"), None);
        assert_eq!(normalize_record(json!([{"id": 1}]), "product"), None);
    }

    #[test]
    fn malformed_records_are_skipped() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: i64,
        }
        let rows: Vec<Row> =
            decode_records(vec![json!({"id": 1}), json!({"id": "x"}), json!({"id": 2})], "rows");
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
