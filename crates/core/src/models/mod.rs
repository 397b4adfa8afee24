//! Shared domain models as served by the club API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters shown when a news item has no explicit excerpt.
const EXCERPT_CHARS: usize = 150;
/// Stock level under which an item is flagged as running low.
const LOW_STOCK_THRESHOLD: u32 = 10;

/// A published news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Headline.
    pub title: String,
    /// Full article body.
    #[serde(default)]
    pub content: String,
    /// Optional hand-written summary.
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Illustration URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Editorial category (e.g. `football`).
    #[serde(default)]
    pub category: String,
    /// Publication instant.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// View counter.
    #[serde(default)]
    pub views: u64,
}

impl NewsItem {
    /// The excerpt if present, else the start of the body.
    pub fn summary(&self) -> String {
        match self.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => self.content.chars().take(EXCERPT_CHARS).collect(),
        }
    }
}

/// A club event open for registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Event name.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Day of the event.
    pub date: DateTime<Utc>,
    /// Local start time, `HH:MM` or longer.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Local end time.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Venue.
    #[serde(default)]
    pub location: String,
    /// Sport key such as `basketball`.
    #[serde(default)]
    pub sport: String,
    /// Capacity, if limited.
    #[serde(default)]
    pub max_participants: Option<u32>,
    /// Registrations so far.
    #[serde(default)]
    pub current_participants: u32,
    /// Entry fee.
    #[serde(default)]
    pub price: f64,
    /// Wire status: `upcoming` or `cancelled`.
    #[serde(default = "default_event_status")]
    pub status: String,
}

fn default_event_status() -> String {
    "upcoming".to_string()
}

impl EventItem {
    /// `HH:MM - HH:MM`, or whichever half is known.
    pub fn time_range(&self) -> String {
        let start = self.start_time.as_deref().map(short_time).unwrap_or_default();
        match self.end_time.as_deref().map(short_time) {
            Some(end) if !end.is_empty() => format!("{start} - {end}"),
            _ => start,
        }
    }

    /// True once registrations reached the capacity.
    pub fn is_full(&self) -> bool {
        self.max_participants
            .map(|max| self.current_participants >= max)
            .unwrap_or(false)
    }
}

fn short_time(value: &str) -> String {
    value.chars().take(5).collect()
}

/// An item sold in the club shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Product name.
    pub name: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Shop category.
    #[serde(default)]
    pub category: String,
    /// Manufacturer.
    #[serde(default)]
    pub brand: Option<String>,
    /// Unit price in euros.
    pub price: f64,
    /// Units in stock.
    #[serde(default)]
    pub stock: u32,
    /// Whether the shop currently sells the item.
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Image URLs, primary first.
    #[serde(default)]
    pub images: Vec<String>,
    /// Free-form attributes such as color or size.
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, Value>>,
    /// Creation instant, used by the `newest` sort.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl EquipmentItem {
    /// Available and in stock.
    pub fn is_purchasable(&self) -> bool {
        self.is_available && self.stock > 0
    }

    /// In stock but below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock < LOW_STOCK_THRESHOLD
    }

    /// First image, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Specification value rendered as plain text.
    pub fn specification(&self, key: &str) -> Option<String> {
        let value = self.specifications.as_ref()?.get(key)?;
        match value {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Pagination data returned next to a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Current page, 1-indexed.
    pub page: u32,
    /// Number of pages, at least 1.
    pub total_pages: u32,
    /// Total number of items across pages, when reported.
    pub total_items: Option<u64>,
}

impl PageMeta {
    /// Metadata for an unpaginated list.
    pub fn single() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total_items: None,
        }
    }
}

/// Authenticated club member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role such as `member` or `admin`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Successful credential exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Profile of the authenticated user.
    #[serde(default)]
    pub user: Option<User>,
}

/// Login payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Account creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Contact form payload as posted to `/contact`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    /// Sender name.
    pub name: String,
    /// Reply address.
    pub email: String,
    /// Optional phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_wire_event_with_defaults() -> anyhow::Result<()> {
        let event: EventItem = serde_json::from_value(json!({
            "_id": "e1",
            "title": "Tournoi",
            "date": "2026-10-20T09:00:00.000Z",
            "startTime": "09:00:00",
            "endTime": "18:00",
            "maxParticipants": 20
        }))?;
        assert_eq!(event.id, "e1");
        assert_eq!(event.status, "upcoming");
        assert_eq!(event.current_participants, 0);
        assert_eq!(event.time_range(), "09:00 - 18:00");
        assert!(!event.is_full());
        Ok(())
    }

    #[test]
    fn equipment_flags_and_specs() -> anyhow::Result<()> {
        let item: EquipmentItem = serde_json::from_value(json!({
            "id": "q1",
            "name": "Ballon",
            "price": 25.0,
            "stock": 3,
            "specifications": { "color": "rouge", "size": 5, "weight": null }
        }))?;
        assert!(item.is_available);
        assert!(item.is_purchasable());
        assert!(item.is_low_stock());
        assert_eq!(item.specification("color").as_deref(), Some("rouge"));
        assert_eq!(item.specification("size").as_deref(), Some("5"));
        assert_eq!(item.specification("weight"), None);
        assert_eq!(item.primary_image(), None);
        Ok(())
    }

    #[test]
    fn news_summary_falls_back_to_content() {
        let mut item = NewsItem {
            id: "n1".to_string(),
            title: "Titre".to_string(),
            content: "x".repeat(400),
            excerpt: Some("  ".to_string()),
            image: None,
            category: "club".to_string(),
            published_at: None,
            views: 0,
        };
        assert_eq!(item.summary().chars().count(), EXCERPT_CHARS);
        item.excerpt = Some("Résumé".to_string());
        assert_eq!(item.summary(), "Résumé");
    }
}
