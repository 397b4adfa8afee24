//! Typed club API on top of the HTTP adapter.

mod client;
mod dto;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::ClientResult,
    models::{
        AuthResponse, ContactMessage, Credentials, EquipmentItem, EventItem, NewsItem, PageMeta,
        Registration, User,
    },
};

/// One page of news.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsPage {
    /// Items on this page.
    pub items: Vec<NewsItem>,
    /// Page position and count.
    pub meta: PageMeta,
}

/// Query parameters accepted by `GET /equipment`. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentQuery {
    /// Category name; `None` means all categories.
    pub category: Option<String>,
    /// Sort key (`name`, `price-asc`, `price-desc`, `newest`).
    pub sort: Option<String>,
    /// Lower price bound as typed by the user.
    pub min_price: Option<String>,
    /// Upper price bound as typed by the user.
    pub max_price: Option<String>,
    /// Brand substring.
    pub brand: Option<String>,
}

/// Every endpoint the client consumes.
///
/// Implementations validate response shapes and fail closed with
/// [`ClientError::MalformedResponse`](crate::error::ClientError::MalformedResponse).
#[async_trait]
pub trait ClubApi: Send + Sync {
    /// True when requests will carry a bearer token.
    fn has_token(&self) -> bool;

    /// `GET /news?page&limit`.
    async fn list_news(&self, page: u32, limit: u32) -> ClientResult<NewsPage>;

    /// `GET /news/:id`.
    async fn get_news(&self, id: &str) -> ClientResult<NewsItem>;

    /// `GET /events`.
    async fn list_events(&self) -> ClientResult<Vec<EventItem>>;

    /// `POST /events/:id/register`; returns the server message, if any.
    async fn register_event(&self, id: &str) -> ClientResult<Option<String>>;

    /// `GET /equipment` with filters.
    async fn list_equipment(&self, query: &EquipmentQuery) -> ClientResult<Vec<EquipmentItem>>;

    /// `GET /equipment/categories`.
    async fn equipment_categories(&self) -> ClientResult<Vec<String>>;

    /// `POST /contact`; returns the server message, if any.
    async fn send_contact(&self, message: &ContactMessage) -> ClientResult<Option<String>>;

    /// `POST /auth/login`.
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse>;

    /// `POST /auth/register`.
    async fn register_account(&self, registration: &Registration) -> ClientResult<AuthResponse>;

    /// `GET /auth/profile`.
    async fn profile(&self) -> ClientResult<User>;

    /// `GET /health`.
    async fn health(&self) -> ClientResult<Value>;
}

/// Probe `/health` and report whether the backend answered.
pub async fn check_connection<A: ClubApi + ?Sized>(api: &A) -> bool {
    match api.health().await {
        Ok(status) => {
            tracing::info!(%status, "API connection succeeded");
            true
        }
        Err(err) => {
            tracing::error!("Unable to reach the API: {err}");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scriptable [`ClubApi`] used by controller tests.

    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::ClientError;

    type Queue<T> = Mutex<VecDeque<ClientResult<T>>>;

    /// Fake API returning queued results and recording every call.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub(crate) token: bool,
        pub(crate) calls: Mutex<Vec<String>>,
        pub(crate) news: Queue<NewsPage>,
        pub(crate) events: Queue<Vec<EventItem>>,
        pub(crate) equipment: Queue<Vec<EquipmentItem>>,
        pub(crate) categories: Queue<Vec<String>>,
        pub(crate) registrations: Queue<Option<String>>,
        pub(crate) contacts: Queue<Option<String>>,
        pub(crate) auths: Queue<AuthResponse>,
        pub(crate) equipment_queries: Mutex<Vec<EquipmentQuery>>,
    }

    impl FakeApi {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().push(call);
        }
    }

    fn next<T>(queue: &Queue<T>, what: &str) -> ClientResult<T> {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::MalformedResponse(format!("no scripted {what}"))))
    }

    #[async_trait]
    impl ClubApi for FakeApi {
        fn has_token(&self) -> bool {
            self.token
        }

        async fn list_news(&self, page: u32, limit: u32) -> ClientResult<NewsPage> {
            self.record(format!("GET /news?page={page}&limit={limit}"));
            next(&self.news, "news")
        }

        async fn get_news(&self, id: &str) -> ClientResult<NewsItem> {
            self.record(format!("GET /news/{id}"));
            Err(ClientError::MalformedResponse("not scripted".to_string()))
        }

        async fn list_events(&self) -> ClientResult<Vec<EventItem>> {
            self.record("GET /events".to_string());
            next(&self.events, "events")
        }

        async fn register_event(&self, id: &str) -> ClientResult<Option<String>> {
            self.record(format!("POST /events/{id}/register"));
            next(&self.registrations, "registration")
        }

        async fn list_equipment(&self, query: &EquipmentQuery) -> ClientResult<Vec<EquipmentItem>> {
            self.record("GET /equipment".to_string());
            self.equipment_queries.lock().push(query.clone());
            next(&self.equipment, "equipment")
        }

        async fn equipment_categories(&self) -> ClientResult<Vec<String>> {
            self.record("GET /equipment/categories".to_string());
            next(&self.categories, "categories")
        }

        async fn send_contact(&self, _message: &ContactMessage) -> ClientResult<Option<String>> {
            self.record("POST /contact".to_string());
            next(&self.contacts, "contact")
        }

        async fn login(&self, _credentials: &Credentials) -> ClientResult<AuthResponse> {
            self.record("POST /auth/login".to_string());
            next(&self.auths, "login")
        }

        async fn register_account(&self, _registration: &Registration) -> ClientResult<AuthResponse> {
            self.record("POST /auth/register".to_string());
            next(&self.auths, "registration")
        }

        async fn profile(&self) -> ClientResult<User> {
            self.record("GET /auth/profile".to_string());
            Err(ClientError::MalformedResponse("not scripted".to_string()))
        }

        async fn health(&self) -> ClientResult<Value> {
            self.record("GET /health".to_string());
            Ok(Value::Null)
        }
    }
}
