//! Response envelope normalization
//!
//! List endpoints answer in one of several shapes:
//!
//! ```text
//! {"success": true, "data": [...], "meta": {"total": 42, "page": 1, "limit": 20}}
//! {"data": [...], "pagination": {"totalItems": 42, "currentPage": 1, "itemsPerPage": 20}}
//! {"data": {"items": [...], "pagination": {...}}}
//! [...]
//! ```
//!
//! All of them become a `Page<T>`. Missing counters fall back to the query
//! that was sent.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::list::Page;

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    #[serde(default, alias = "totalItems", alias = "totalCount", alias = "count")]
    total: Option<u64>,
    #[serde(default, alias = "pages")]
    total_pages: Option<u32>,
    #[serde(default, alias = "currentPage")]
    page: Option<u32>,
    #[serde(default, alias = "itemsPerPage", alias = "pageSize", alias = "perPage")]
    limit: Option<u32>,
}

impl PageMeta {
    fn or(self, other: Option<PageMeta>) -> PageMeta {
        match other {
            Some(o) => PageMeta {
                total: self.total.or(o.total),
                total_pages: self.total_pages.or(o.total_pages),
                page: self.page.or(o.page),
                limit: self.limit.or(o.limit),
            },
            None => self,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListData<T> {
    Rows(Vec<T>),
    Nested {
        #[serde(alias = "docs", alias = "rows", alias = "results")]
        items: Vec<T>,
        #[serde(default, alias = "meta")]
        pagination: Option<PageMeta>,
    },
}

/// Fields shared by every envelope
#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// A message field may be a string or an object carrying one
fn message_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn decode_err(path: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    }
}

/// `success: false` turns into `Rejected`; anything else passes
fn check_success(path: &str, value: &Value) -> Result<Option<String>, ApiError> {
    if !value.is_object() {
        return Ok(None);
    }
    let status: Status = serde_json::from_value(value.clone()).map_err(|e| decode_err(path, e))?;
    let message = message_text(status.message);
    if status.success == Some(false) {
        return Err(ApiError::Rejected(
            message
                .or_else(|| message_text(status.error))
                .unwrap_or_else(|| "The server rejected the request".to_string()),
        ));
    }
    Ok(message)
}

/// Normalize a list response into a page
pub fn parse_page<T: DeserializeOwned>(
    path: &str,
    value: Value,
    requested_page: u32,
    requested_limit: u32,
) -> Result<Page<T>, ApiError> {
    check_success(path, &value)?;

    let (data, outer_meta) = match value {
        Value::Array(items) => (Value::Array(items), PageMeta::default()),
        Value::Object(mut map) => {
            let data = map.remove("data").or_else(|| map.remove("items")).unwrap_or(Value::Null);
            let meta = map
                .remove("meta")
                .map(serde_json::from_value::<PageMeta>)
                .transpose()
                .map_err(|e| decode_err(path, e))?
                .unwrap_or_default();
            let pagination = map
                .remove("pagination")
                .map(serde_json::from_value::<PageMeta>)
                .transpose()
                .map_err(|e| decode_err(path, e))?;
            // Some backends put the counters at the top level
            let top = serde_json::from_value::<PageMeta>(Value::Object(map)).ok();
            (data, meta.or(pagination).or(top))
        }
        _ => return Err(decode_err(path, "expected a list or an envelope object")),
    };

    if data.is_null() {
        return Err(decode_err(path, "response has no `data` field"));
    }

    let (items, meta) = match serde_json::from_value::<ListData<T>>(data).map_err(|e| decode_err(path, e))? {
        ListData::Rows(items) => (items, outer_meta),
        ListData::Nested { items, pagination } => (items, outer_meta.or(pagination)),
    };

    let limit = meta.limit.filter(|l| *l > 0).unwrap_or(requested_limit).max(1);
    let page = meta.page.filter(|p| *p > 0).unwrap_or(requested_page).max(1);
    let total = match (meta.total, meta.total_pages) {
        (Some(total), _) => total,
        (None, Some(pages)) if pages > 0 => u64::from(pages - 1) * u64::from(limit) + items.len() as u64,
        _ => items.len() as u64,
    };
    Ok(Page::new(items, page, limit, total))
}

/// Normalize a single-object response (`{data: {...}}` or the object itself)
pub fn parse_item<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    check_success(path, &value)?;
    let inner = match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| decode_err(path, e))
}

/// Check a mutation response, returning the server's message if any
pub fn parse_ack(path: &str, value: &Value) -> Result<Option<String>, ApiError> {
    check_success(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    fn rows(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!({"id": format!("r{}", i)})).collect())
    }

    #[test]
    fn test_meta_envelope() {
        let page: Page<Row> =
            parse_page("/t", json!({"success": true, "data": rows(2), "meta": {"total": 42, "page": 3, "limit": 2}}), 1, 20)
                .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.page, page.limit, page.total, page.total_pages), (3, 2, 42, 21));
    }

    #[test]
    fn test_pagination_envelope_aliases() {
        let page: Page<Row> = parse_page(
            "/t",
            json!({"data": rows(5), "pagination": {"totalItems": 45, "currentPage": 2, "itemsPerPage": 10}}),
            1,
            20,
        )
        .unwrap();
        assert_eq!((page.page, page.limit, page.total, page.total_pages), (2, 10, 45, 5));
    }

    #[test]
    fn test_nested_items_and_bare_array() {
        let page: Page<Row> = parse_page(
            "/t",
            json!({"data": {"items": rows(3), "pagination": {"total": 3}}}),
            1,
            20,
        )
        .unwrap();
        assert_eq!(page.total, 3);

        let page: Page<Row> = parse_page("/t", rows(4), 1, 20).unwrap();
        assert_eq!((page.page, page.limit, page.total, page.total_pages), (1, 20, 4, 1));
    }

    #[test]
    fn test_total_from_page_count() {
        let page: Page<Row> =
            parse_page("/t", json!({"data": rows(3), "meta": {"totalPages": 4, "page": 4, "limit": 10}}), 4, 10)
                .unwrap();
        assert_eq!(page.total, 33);
        assert_eq!(page.total_pages, 4);
    }

    #[test]
    fn test_rejected_envelope() {
        let err = parse_page::<Row>("/t", json!({"success": false, "message": "Tenant locked"}), 1, 20).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Tenant locked"));

        let err = parse_ack("/t", &json!({"success": false})).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
        assert_eq!(parse_ack("/t", &json!({"success": true, "message": "ok"})).unwrap(), Some("ok".to_string()));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse_page::<Row>("/t", json!({"meta": {}}), 1, 20),
            Err(ApiError::Decode { .. })
        ));
        assert!(matches!(parse_page::<Row>("/t", json!("nope"), 1, 20), Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_parse_item() {
        let row: Row = parse_item("/m", json!({"success": true, "data": {"id": "x"}})).unwrap();
        assert_eq!(row.id, "x");
        let row: Row = parse_item("/m", json!({"id": "y"})).unwrap();
        assert_eq!(row.id, "y");
    }
}
