//! Response schemas and shape validation for API payloads.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ClientError, ClientResult},
    models::{AuthResponse, EquipmentItem, EventItem, NewsItem, PageMeta, User},
};

use super::NewsPage;

fn malformed(message: impl Into<String>) -> ClientError {
    ClientError::MalformedResponse(message.into())
}

/// Decode the array stored under `key` of a JSON object.
pub(super) fn collection<T: DeserializeOwned>(body: &mut Value, key: &str) -> ClientResult<Vec<T>> {
    let raw = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| malformed(format!("missing `{key}` collection")))?;
    if !raw.is_array() {
        return Err(malformed(format!("`{key}` is not a list")));
    }
    serde_json::from_value(raw).map_err(|err| malformed(format!("invalid `{key}` entry: {err}")))
}

/// Decode an object that may be wrapped as `{ "<key>": {...} }`.
pub(super) fn single<T: DeserializeOwned>(mut body: Value, key: &str) -> ClientResult<T> {
    let wrapped = body.get(key).is_some_and(Value::is_object);
    let raw = if wrapped { body[key].take() } else { body };
    if !raw.is_object() {
        return Err(malformed(format!("expected a `{key}` object")));
    }
    serde_json::from_value(raw).map_err(|err| malformed(format!("invalid `{key}`: {err}")))
}

pub(super) fn news_page(mut body: Value, requested_page: u32) -> ClientResult<NewsPage> {
    let items: Vec<NewsItem> = collection(&mut body, "news")?;
    let total_pages = body
        .get("pages")
        .or_else(|| body.get("totalPages"))
        .and_then(Value::as_u64)
        .and_then(|pages| u32::try_from(pages).ok())
        .unwrap_or(1)
        .max(1);
    let page = body
        .get("page")
        .or_else(|| body.get("currentPage"))
        .and_then(Value::as_u64)
        .and_then(|page| u32::try_from(page).ok())
        .unwrap_or(requested_page)
        .clamp(1, total_pages);
    let total_items = body.get("total").and_then(Value::as_u64);
    Ok(NewsPage {
        items,
        meta: PageMeta {
            page,
            total_pages,
            total_items,
        },
    })
}

pub(super) fn events(mut body: Value) -> ClientResult<Vec<EventItem>> {
    let events: Vec<EventItem> = collection(&mut body, "events")?;
    for event in &events {
        ensure_price(event.price, &event.id)?;
    }
    Ok(events)
}

pub(super) fn equipment(mut body: Value) -> ClientResult<Vec<EquipmentItem>> {
    let items: Vec<EquipmentItem> = collection(&mut body, "equipment")?;
    for item in &items {
        ensure_price(item.price, &item.id)?;
    }
    Ok(items)
}

pub(super) fn categories(mut body: Value) -> ClientResult<Vec<String>> {
    if body.is_array() {
        return serde_json::from_value(body)
            .map_err(|err| malformed(format!("invalid category list: {err}")));
    }
    collection(&mut body, "categories")
}

pub(super) fn auth(body: Value) -> ClientResult<AuthResponse> {
    let response: AuthResponse = serde_json::from_value(body)
        .map_err(|err| malformed(format!("invalid auth response: {err}")))?;
    if response.token.trim().is_empty() {
        return Err(malformed("empty token in auth response"));
    }
    Ok(response)
}

pub(super) fn user(body: Value) -> ClientResult<User> {
    single(body, "user")
}

/// Optional `message` field of an acknowledgement body.
pub(super) fn message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

fn ensure_price(price: f64, id: &str) -> ClientResult<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(malformed(format!("invalid price {price} for {id}")))
    }
}
