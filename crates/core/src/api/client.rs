use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{ClientError, ClientResult},
    http::{ApiResponse, HttpClient, RequestOptions},
    models::{
        AuthResponse, ContactMessage, Credentials, EquipmentItem, EventItem, NewsItem,
        Registration, User,
    },
};

use super::{dto, ClubApi, EquipmentQuery, NewsPage};

fn decode(response: ApiResponse) -> ClientResult<Value> {
    response
        .json()
        .map_err(|err| ClientError::MalformedResponse(format!("invalid JSON payload: {err}")))
}

fn encode(value: &impl Serialize) -> ClientResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ClientError::Validation(format!("unable to encode request: {err}")))
}

fn require_token(client: &HttpClient) -> ClientResult<()> {
    if client.session().is_authenticated() {
        Ok(())
    } else {
        Err(ClientError::Precondition(
            "Veuillez vous connecter pour accéder à votre profil".to_string(),
        ))
    }
}

/// Unreserved characters of RFC 3986 stay as-is inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}

#[async_trait]
impl ClubApi for HttpClient {
    fn has_token(&self) -> bool {
        self.session().is_authenticated()
    }

    async fn list_news(&self, page: u32, limit: u32) -> ClientResult<NewsPage> {
        let options = RequestOptions::none()
            .param("page", Some(page))
            .param("limit", Some(limit));
        let body = decode(self.get("/news", options).await?)?;
        dto::news_page(body, page)
    }

    async fn get_news(&self, id: &str) -> ClientResult<NewsItem> {
        let path = format!("/news/{}", segment(id));
        let body = decode(self.get(&path, RequestOptions::none()).await?)?;
        dto::single(body, "news")
    }

    async fn list_events(&self) -> ClientResult<Vec<EventItem>> {
        let body = decode(self.get("/events", RequestOptions::none()).await?)?;
        dto::events(body)
    }

    async fn register_event(&self, id: &str) -> ClientResult<Option<String>> {
        let path = format!("/events/{}/register", segment(id));
        let body = decode(self.post(&path, RequestOptions::none()).await?)?;
        Ok(dto::message(&body))
    }

    async fn list_equipment(&self, query: &EquipmentQuery) -> ClientResult<Vec<EquipmentItem>> {
        let options = RequestOptions::none()
            .param("category", query.category.as_deref())
            .param("sort", query.sort.as_deref())
            .param("minPrice", query.min_price.as_deref())
            .param("maxPrice", query.max_price.as_deref())
            .param("brand", query.brand.as_deref());
        let body = decode(self.get("/equipment", options).await?)?;
        dto::equipment(body)
    }

    async fn equipment_categories(&self) -> ClientResult<Vec<String>> {
        let body = decode(self.get("/equipment/categories", RequestOptions::none()).await?)?;
        dto::categories(body)
    }

    async fn send_contact(&self, message: &ContactMessage) -> ClientResult<Option<String>> {
        let options = RequestOptions::none().json(encode(message)?);
        let body = decode(self.post("/contact", options).await?)?;
        Ok(dto::message(&body))
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        let options = RequestOptions::none().json(encode(credentials)?);
        let body = decode(self.post("/auth/login", options).await?)?;
        dto::auth(body)
    }

    async fn register_account(&self, registration: &Registration) -> ClientResult<AuthResponse> {
        let options = RequestOptions::none().json(encode(registration)?);
        let body = decode(self.post("/auth/register", options).await?)?;
        dto::auth(body)
    }

    async fn profile(&self) -> ClientResult<User> {
        require_token(self)?;
        let body = decode(self.get("/auth/profile", RequestOptions::none()).await?)?;
        dto::user(body)
    }

    async fn health(&self) -> ClientResult<Value> {
        decode(self.get("/health", RequestOptions::none()).await?)
    }
}
