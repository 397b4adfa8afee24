//! Paginated news listing.

use tracing::{error, info};

use crate::{
    api::{ClubApi, NewsPage},
    error::ClientResult,
    fetch::{FetchState, RequestTracker, Ticket},
    models::NewsItem,
};

const LOAD_FAILED: &str = "Erreur lors du chargement des actualités";

/// A news fetch that has been started but not yet executed.
#[derive(Debug, Clone)]
pub struct NewsRequest {
    ticket: Ticket,
    page: u32,
    limit: u32,
}

impl NewsRequest {
    /// Page this request asks for, always within the known bounds.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Run the request against `api`.
    pub async fn execute<A: ClubApi + ?Sized>(self, api: &A) -> NewsResponse {
        let result = api.list_news(self.page, self.limit).await;
        NewsResponse {
            ticket: self.ticket,
            result,
        }
    }
}

/// Outcome of a [`NewsRequest`].
#[derive(Debug)]
pub struct NewsResponse {
    ticket: Ticket,
    result: ClientResult<NewsPage>,
}

/// State of the news view.
#[derive(Debug)]
pub struct NewsController {
    page: u32,
    limit: u32,
    total_pages: u32,
    state: FetchState<NewsItem>,
    tracker: RequestTracker,
}

impl NewsController {
    /// Controller requesting `limit` items per page, starting at page 1.
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total_pages: 1,
            state: FetchState::Loading,
            tracker: RequestTracker::default(),
        }
    }

    /// Current page, 1-indexed.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of pages reported by the last successful fetch.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Current fetch state.
    pub fn state(&self) -> &FetchState<NewsItem> {
        &self.state
    }

    /// True when a previous page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// True when a next page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Enter `Loading` and describe the fetch for the current page.
    pub fn begin_reload(&mut self) -> NewsRequest {
        self.state = FetchState::Loading;
        NewsRequest {
            ticket: self.tracker.begin(),
            page: self.page,
            limit: self.limit,
        }
    }

    /// Move to `page`, clamped to `[1, total_pages]`. Returns the reload to
    /// run, or `None` when the clamped page is the current one.
    pub fn set_page(&mut self, page: u32) -> Option<NewsRequest> {
        let target = page.clamp(1, self.total_pages.max(1));
        if target == self.page {
            return None;
        }
        self.page = target;
        Some(self.begin_reload())
    }

    /// Advance one page, if possible.
    pub fn next_page(&mut self) -> Option<NewsRequest> {
        self.set_page(self.page.saturating_add(1))
    }

    /// Go back one page, if possible.
    pub fn previous_page(&mut self) -> Option<NewsRequest> {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Apply a response. Results of superseded requests are dropped and
    /// `false` is returned.
    pub fn apply(&mut self, response: NewsResponse) -> bool {
        if !self.tracker.is_current(response.ticket) {
            info!(
                generation = response.ticket.generation(),
                "discarding stale news response"
            );
            return false;
        }
        match response.result {
            Ok(page) => {
                self.total_pages = page.meta.total_pages.max(1);
                self.page = page.meta.page.clamp(1, self.total_pages);
                info!(page = self.page, total = self.total_pages, count = page.items.len(), "news loaded");
                self.state = FetchState::Success {
                    items: page.items,
                    meta: page.meta,
                };
            }
            Err(err) => {
                error!("news fetch failed: {err}");
                self.state = FetchState::Error(LOAD_FAILED.to_string());
            }
        }
        true
    }

    /// Fetch the current page and apply the result.
    pub async fn reload<A: ClubApi + ?Sized>(&mut self, api: &A) {
        let request = self.begin_reload();
        let response = request.execute(api).await;
        self.apply(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::fake::FakeApi, error::NetworkError, models::PageMeta};

    fn page(number: u32, total_pages: u32) -> NewsPage {
        NewsPage {
            items: vec![NewsItem {
                id: format!("n{number}"),
                title: format!("Actualité {number}"),
                content: "Texte".to_string(),
                excerpt: None,
                image: None,
                category: "club".to_string(),
                published_at: None,
                views: 3,
            }],
            meta: PageMeta {
                page: number,
                total_pages,
                total_items: None,
            },
        }
    }

    #[tokio::test]
    async fn pages_are_clamped_before_fetching() {
        let api = FakeApi::default();
        api.news.lock().push_back(Ok(page(1, 3)));
        let mut news = NewsController::new(6);
        news.reload(&api).await;
        assert_eq!(news.total_pages(), 3);
        assert!(!news.has_previous());

        assert!(news.previous_page().is_none());
        let request = news.set_page(99).expect("page change");
        assert_eq!(request.page(), 3);
        assert!(news.state().is_loading());

        api.news.lock().push_back(Ok(page(3, 3)));
        let response = request.execute(&api).await;
        assert!(news.apply(response));
        assert!(news.next_page().is_none());
        assert!(news.set_page(0).is_some());
        assert_eq!(news.page(), 1);

        assert_eq!(
            api.calls(),
            vec!["GET /news?page=1&limit=6", "GET /news?page=3&limit=6"]
        );
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_one() {
        let api = FakeApi::default();
        api.news.lock().push_back(Ok(page(1, 5)));
        let mut news = NewsController::new(6);
        news.reload(&api).await;

        let older = news.set_page(2).expect("page 2");
        let newer = news.set_page(3).expect("page 3");

        api.news.lock().push_back(Ok(page(3, 5)));
        api.news.lock().push_back(Ok(page(2, 5)));
        let newer_response = newer.execute(&api).await;
        let older_response = older.execute(&api).await;

        assert!(news.apply(newer_response));
        assert!(!news.apply(older_response));
        assert_eq!(news.page(), 3);
        assert_eq!(news.state().items()[0].id, "n3");
    }

    #[tokio::test]
    async fn failures_have_no_fallback() {
        let api = FakeApi::default();
        api.news
            .lock()
            .push_back(Err(NetworkError::no_response("refused").into()));
        let mut news = NewsController::new(6);
        news.reload(&api).await;
        assert_eq!(news.state().error(), Some(LOAD_FAILED));
        assert!(news.state().items().is_empty());
    }
}
