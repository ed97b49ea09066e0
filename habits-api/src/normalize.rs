//! Collapse the list shapes the backend may send into one [`Page`].
//!
//! Three shapes are recognised:
//! - a bare JSON array,
//! - a flat paged envelope (`{"content": [...], "totalElements": .., ...}`),
//! - a hypermedia envelope (`{"_embedded": {"<key>": [...]}, "page": {...}}`)
//!   whose items may each be wrapped as `{"content": item, "_links": ..}`.
//!
//! Anything else is a [`ApiError::MalformedResponse`], never an empty page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
    pub page_size: u32,
}

/// The canonical paginated shape handed to callers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub pageable: Pageable,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    fn build(
        content: Vec<T>,
        total_elements: u64,
        total_pages: u32,
        page_number: u32,
        page_size: u32,
    ) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            content,
            total_elements,
            total_pages,
            pageable: Pageable {
                page_number,
                page_size,
            },
            first: page_number == 0,
            last: page_number >= total_pages - 1,
        }
    }

    pub fn has_more(&self) -> bool {
        !self.last
    }

    /// Whether a caller that asked for page `requested` has seen the last
    /// one. Relies on the requested number, not the echoed one, since
    /// envelopes without pagination metadata always echo page 0.
    pub fn ends_paging(&self, requested: u32) -> bool {
        self.content.is_empty()
            || self.last
            || requested.saturating_add(1) >= self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            pageable: self.pageable,
            first: self.first,
            last: self.last,
        }
    }
}

/// Which resource a list holds; drives the choice of the data-bearing key in
/// hypermedia envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Habit,
    Progress,
    Achievement,
}

impl Resource {
    fn known_keys(&self) -> &'static [&'static str] {
        match self {
            Resource::Habit => &["habitResponseList", "habitResponses", "habits", "content"],
            Resource::Progress => &[
                "progressResponseList",
                "progressResponses",
                "progress",
                "progressList",
                "content",
            ],
            Resource::Achievement => &[
                "achievementResponseList",
                "achievementResponses",
                "achievements",
                "content",
            ],
        }
    }

    fn stem(&self) -> &'static str {
        match self {
            Resource::Habit => "habit",
            Resource::Progress => "progress",
            Resource::Achievement => "achievement",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePageable {
    page_number: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePageMeta {
    size: Option<u32>,
    total_elements: Option<u64>,
    total_pages: Option<u32>,
    number: Option<u32>,
}

/// The closed set of list shapes, before item decoding.
#[derive(Debug)]
enum ListEnvelope {
    Bare(Vec<Value>),
    Paged {
        content: Vec<Value>,
        total_elements: Option<u64>,
        total_pages: Option<u32>,
        pageable: WirePageable,
    },
    Hypermedia {
        items: Vec<Value>,
        page: Option<WirePageMeta>,
    },
}

impl ListEnvelope {
    fn parse(value: Value, resource: Resource) -> Result<Self> {
        let mut object = match value {
            Value::Array(items) => return Ok(ListEnvelope::Bare(items)),
            Value::Object(object) => object,
            other => {
                return Err(ApiError::malformed(format!(
                    "expected a list or an object, got {}",
                    kind_of(&other)
                )))
            }
        };

        if object.contains_key("_embedded") || is_empty_hypermedia(&object) {
            let page = match object.remove("page") {
                Some(Value::Null) | None => None,
                Some(meta) => Some(decode::<WirePageMeta>(meta, "page metadata")?),
            };
            let items = match object.remove("_embedded") {
                Some(Value::Object(embedded)) => embedded_items(embedded, resource)?,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(ApiError::malformed(format!(
                        "_embedded is {} instead of an object",
                        kind_of(&other)
                    )))
                }
            };
            return Ok(ListEnvelope::Hypermedia { items, page });
        }

        if matches!(object.get("content"), Some(Value::Array(_))) {
            let content = match object.remove("content") {
                Some(Value::Array(content)) => content,
                _ => Vec::new(),
            };
            let pageable = match object.remove("pageable") {
                Some(p @ Value::Object(_)) => decode::<WirePageable>(p, "pageable")?,
                _ => WirePageable::default(),
            };
            return Ok(ListEnvelope::Paged {
                content,
                total_elements: object.get("totalElements").and_then(Value::as_u64),
                total_pages: object
                    .get("totalPages")
                    .and_then(Value::as_u64)
                    .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
                pageable,
            });
        }

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        Err(ApiError::malformed(format!(
            "unrecognised list envelope with keys [{}]",
            keys.join(", ")
        )))
    }

    fn into_page<T: DeserializeOwned>(self) -> Result<Page<T>> {
        match self {
            ListEnvelope::Bare(items) => {
                let content = decode_items::<T>(items)?;
                let len = content.len();
                Ok(Page::build(content, len as u64, 1, 0, len as u32))
            }
            ListEnvelope::Paged {
                content,
                total_elements,
                total_pages,
                pageable,
            } => {
                let content = decode_items::<T>(content)?;
                let total_elements = total_elements.unwrap_or(content.len() as u64);
                Ok(Page::build(
                    content,
                    total_elements,
                    total_pages.unwrap_or(1),
                    pageable.page_number.unwrap_or(0),
                    pageable.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
                ))
            }
            ListEnvelope::Hypermedia { items, page } => {
                let content = decode_items::<T>(items)?;
                let meta = page.unwrap_or_default();
                let len = content.len();
                Ok(Page::build(
                    content,
                    meta.total_elements.unwrap_or(len as u64),
                    meta.total_pages.unwrap_or(1),
                    meta.number.unwrap_or(0),
                    meta.size.unwrap_or(DEFAULT_PAGE_SIZE),
                ))
            }
        }
    }
}

/// Normalise any recognised list response into a [`Page`].
pub fn normalize_list<T: DeserializeOwned>(value: Value, resource: Resource) -> Result<Page<T>> {
    let envelope = ListEnvelope::parse(value, resource)?;
    tracing::trace!(?envelope, "parsed list envelope");
    envelope.into_page()
}

/// Unwrap a single-resource response that may arrive as `{"content": X, "_links": ..}`.
pub fn unwrap_entity<T: DeserializeOwned>(value: Value) -> Result<T> {
    let inner = match value {
        Value::Object(mut object) if is_entity_wrapper(&object) => {
            object.remove("content").unwrap_or(Value::Null)
        }
        other => other,
    };
    if inner.is_null() {
        return Err(ApiError::malformed("empty entity response"));
    }
    decode(inner, "entity")
}

/// Unwrap each entry of a bare array of (possibly wrapped) entities,
/// dropping null entries.
pub fn unwrap_entities<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(items) => decode_items(items),
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::malformed(format!(
            "expected a list, got {}",
            kind_of(&other)
        ))),
    }
}

fn is_entity_wrapper(object: &Map<String, Value>) -> bool {
    object.contains_key("content") && object.keys().all(|k| k == "content" || k == "_links")
}

/// Spring omits `_embedded` entirely when a page is empty.
fn is_empty_hypermedia(object: &Map<String, Value>) -> bool {
    (object.contains_key("page") || object.contains_key("_links")) && !object.contains_key("content")
}

fn embedded_items(mut embedded: Map<String, Value>, resource: Resource) -> Result<Vec<Value>> {
    if embedded.is_empty() {
        return Ok(Vec::new());
    }

    let key = data_key(&embedded, resource)?;
    match embedded.remove(&key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ApiError::malformed(format!(
            "_embedded.{} is {} instead of a list",
            key,
            kind_of(&other)
        ))),
        None => Ok(Vec::new()),
    }
}

/// Pick the data-bearing key: a known name first, then the single key that
/// mentions the resource, then the only key present. Several candidates
/// without a known name is ambiguous and rejected.
fn data_key(embedded: &Map<String, Value>, resource: Resource) -> Result<String> {
    if let Some(known) = resource
        .known_keys()
        .iter()
        .find(|k| embedded.contains_key(**k))
    {
        return Ok(known.to_string());
    }

    let stem = resource.stem();
    let mentions: Vec<&String> = embedded
        .keys()
        .filter(|k| k.to_ascii_lowercase().contains(stem))
        .collect();
    match mentions.as_slice() {
        [only] => return Ok((*only).clone()),
        [] => {}
        _ => {
            return Err(ApiError::malformed(format!(
                "ambiguous _embedded keys for {}: {:?}",
                stem, mentions
            )))
        }
    }

    if embedded.len() == 1 {
        if let Some(only) = embedded.keys().next() {
            return Ok(only.clone());
        }
    }

    let keys: Vec<&String> = embedded.keys().collect();
    Err(ApiError::malformed(format!(
        "cannot tell which _embedded key holds {} data: {:?}",
        stem, keys
    )))
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut object) if is_entity_wrapper(&object) => {
                object.remove("content").unwrap_or(Value::Null)
            }
            other => other,
        })
        .filter(|item| !item.is_null())
        .map(|item| decode(item, "list item"))
        .collect()
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::malformed(format!("invalid {}: {}", what, e)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        id: i64,
    }

    fn ids(page: &Page<Item>) -> Vec<i64> {
        page.content.iter().map(|i| i.id).collect()
    }

    #[test]
    fn bare_array_is_a_single_page() {
        let page: Page<Item> =
            normalize_list(json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]), Resource::Habit).unwrap();

        assert_eq!(ids(&page), vec![1, 2, 3]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.first);
        assert!(page.last);
    }

    #[test]
    fn empty_bare_array_is_an_empty_page() {
        let page: Page<Item> = normalize_list(json!([]), Resource::Progress).unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(page.first && page.last);
    }

    #[test]
    fn flat_envelope_defaults_missing_fields() {
        let page: Page<Item> = normalize_list(
            json!({
                "content": [{ "id": 7 }],
                "totalElements": 41,
                "totalPages": 3,
                "pageable": { "pageNumber": 1, "pageSize": 20 }
            }),
            Resource::Habit,
        )
        .unwrap();

        assert_eq!(ids(&page), vec![7]);
        assert_eq!(page.total_elements, 41);
        assert_eq!(page.pageable.page_number, 1);
        assert!(!page.first);
        assert!(!page.last);
        assert!(page.has_more());

        let page: Page<Item> =
            normalize_list(json!({ "content": [{ "id": 1 }, { "id": 2 }] }), Resource::Habit).unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.pageable.page_size, 20);
        assert!(page.first && page.last);
    }

    #[test]
    fn oversized_total_pages_saturates() {
        let page: Page<Item> = normalize_list(
            json!({ "content": [{ "id": 1 }], "totalPages": 4_294_967_297_u64 }),
            Resource::Habit,
        )
        .unwrap();
        assert_eq!(page.total_pages, u32::MAX);
        assert!(!page.last);
    }

    #[test]
    fn paging_stops_on_requested_page_not_echo() {
        let page: Page<Item> = normalize_list(
            json!({ "content": [{ "id": 1 }], "totalElements": 2, "totalPages": 2 }),
            Resource::Habit,
        )
        .unwrap();
        assert_eq!(page.pageable.page_number, 0);
        assert!(!page.ends_paging(0));
        assert!(page.ends_paging(1));

        let empty: Page<Item> =
            normalize_list(json!({ "content": [], "totalPages": 9 }), Resource::Habit).unwrap();
        assert!(empty.ends_paging(0));
    }

    #[test]
    fn hypermedia_page_size_defaults_like_flat_pages() {
        let page: Page<Item> = normalize_list(
            json!({
                "_embedded": { "habitResponseList": [{ "id": 1 }, { "id": 2 }] },
                "page": { "totalElements": 2, "totalPages": 1, "number": 0 }
            }),
            Resource::Habit,
        )
        .unwrap();
        assert_eq!(page.pageable.page_size, 20);

        let page: Page<Item> =
            normalize_list(json!({ "_embedded": { "habitResponseList": [{ "id": 1 }] } }), Resource::Habit)
                .unwrap();
        assert_eq!(page.pageable.page_size, 20);
    }

    #[test]
    fn hypermedia_items_are_unwrapped_in_order_without_nulls() {
        let page: Page<Item> = normalize_list(
            json!({
                "_embedded": {
                    "habitProgressViewList": [
                        { "content": { "id": 3 }, "_links": { "self": { "href": "/x/3" } } },
                        null,
                        { "content": { "id": 1 } },
                        { "content": null },
                        { "content": { "id": 2 } }
                    ]
                },
                "page": { "size": 20, "totalElements": 3, "totalPages": 1, "number": 0 }
            }),
            Resource::Progress,
        )
        .unwrap();

        assert_eq!(ids(&page), vec![3, 1, 2]);
        assert_eq!(page.total_elements, 3);
        assert!(page.first && page.last);
    }

    #[test]
    fn hypermedia_prefers_known_key() {
        let page: Page<Item> = normalize_list(
            json!({
                "_embedded": {
                    "habitResponseList": [{ "id": 1 }],
                    "somethingElse": [{ "id": 99 }]
                }
            }),
            Resource::Habit,
        )
        .unwrap();
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn hypermedia_takes_sole_unknown_key() {
        let page: Page<Item> =
            normalize_list(json!({ "_embedded": { "entries": [{ "id": 5 }] } }), Resource::Achievement)
                .unwrap();
        assert_eq!(ids(&page), vec![5]);
    }

    #[test]
    fn hypermedia_without_embedded_is_empty() {
        let page: Page<Item> = normalize_list(
            json!({
                "_links": { "self": { "href": "/api/habits" } },
                "page": { "size": 20, "totalElements": 0, "totalPages": 0, "number": 0 }
            }),
            Resource::Habit,
        )
        .unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn ambiguous_embedded_keys_are_rejected() {
        let err = normalize_list::<Item>(
            json!({ "_embedded": { "habitA": [], "habitB": [] } }),
            Resource::Habit,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let err = normalize_list::<Item>(
            json!({ "_embedded": { "foo": [], "bar": [] } }),
            Resource::Habit,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn unrecognised_shapes_are_errors_not_empty_pages() {
        for value in [
            json!(null),
            json!("habits"),
            json!(42),
            json!({}),
            json!({ "items": [] }),
            json!({ "content": "nope" }),
            json!({ "_embedded": [] }),
        ] {
            let err = normalize_list::<Item>(value.clone(), Resource::Habit).unwrap_err();
            assert!(
                matches!(err, ApiError::MalformedResponse(_)),
                "{value} gave {err:?}"
            );
        }
    }

    #[test]
    fn bad_item_is_malformed() {
        let err = normalize_list::<Item>(json!([{ "id": "x" }]), Resource::Habit).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn entity_wrapper_is_unwrapped() {
        let item: Item =
            unwrap_entity(json!({ "content": { "id": 4 }, "_links": {} })).unwrap();
        assert_eq!(item, Item { id: 4 });

        let item: Item = unwrap_entity(json!({ "id": 9 })).unwrap();
        assert_eq!(item, Item { id: 9 });

        assert!(unwrap_entity::<Item>(json!(null)).is_err());
    }
}
