//! Equipment catalogue with category, price, brand and sort filters.

use tracing::{error, info, warn};

use crate::{
    api::{ClubApi, EquipmentQuery},
    cart::CartStore,
    config::FilterPolicy,
    error::{ClientError, ClientResult},
    fetch::{FetchState, RequestTracker, Ticket},
    filter::{derive, EquipmentFilters, SortKey},
    models::{EquipmentItem, PageMeta},
};

const LOAD_FAILED: &str = "Erreur lors du chargement des équipements";

/// An equipment fetch that has been started but not yet executed.
#[derive(Debug, Clone)]
pub struct EquipmentRequest {
    ticket: Ticket,
    query: EquipmentQuery,
    with_categories: bool,
}

impl EquipmentRequest {
    /// Query parameters this request sends.
    pub fn query(&self) -> &EquipmentQuery {
        &self.query
    }

    /// Run the request against `api`, fetching categories too when needed.
    pub async fn execute<A: ClubApi + ?Sized>(self, api: &A) -> EquipmentResponse {
        let items = api.list_equipment(&self.query).await;
        let categories = if self.with_categories {
            Some(api.equipment_categories().await)
        } else {
            None
        };
        EquipmentResponse {
            ticket: self.ticket,
            items,
            categories,
        }
    }
}

/// Outcome of an [`EquipmentRequest`].
#[derive(Debug)]
pub struct EquipmentResponse {
    ticket: Ticket,
    items: ClientResult<Vec<EquipmentItem>>,
    categories: Option<ClientResult<Vec<String>>>,
}

/// State of the equipment view.
#[derive(Debug)]
pub struct EquipmentController {
    policy: FilterPolicy,
    category: Option<String>,
    sort_by: SortKey,
    min_price: String,
    max_price: String,
    brand: String,
    categories: Vec<String>,
    state: FetchState<EquipmentItem>,
    display: Vec<EquipmentItem>,
    tracker: RequestTracker,
}

impl EquipmentController {
    /// Controller with default filters evaluated according to `policy`.
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            category: None,
            sort_by: SortKey::default(),
            min_price: String::new(),
            max_price: String::new(),
            brand: String::new(),
            categories: Vec::new(),
            state: FetchState::Loading,
            display: Vec::new(),
            tracker: RequestTracker::default(),
        }
    }

    /// Selected category; `None` is "all".
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Selected sort key.
    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    /// Raw lower price bound input.
    pub fn min_price(&self) -> &str {
        &self.min_price
    }

    /// Raw upper price bound input.
    pub fn max_price(&self) -> &str {
        &self.max_price
    }

    /// Raw brand filter input.
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Known category names.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Fetch state of the raw listing.
    pub fn state(&self) -> &FetchState<EquipmentItem> {
        &self.state
    }

    /// Items to display after local filtering and sorting.
    pub fn items(&self) -> &[EquipmentItem] {
        &self.display
    }

    /// Filters currently selected.
    pub fn filters(&self) -> EquipmentFilters {
        EquipmentFilters::from_inputs(self.sort_by, &self.min_price, &self.max_price, &self.brand)
    }

    /// Query parameters for the current selection.
    ///
    /// Price bounds are sent in their parsed form, so input the local filter
    /// ignores is never sent either.
    pub fn query(&self) -> EquipmentQuery {
        let mut query = EquipmentQuery {
            category: self.category.clone(),
            ..EquipmentQuery::default()
        };
        if self.policy == FilterPolicy::Server {
            let filters = self.filters();
            query.sort = Some(filters.sort_by.as_str().to_string());
            query.min_price = filters.min_price.map(|value| value.to_string());
            query.max_price = filters.max_price.map(|value| value.to_string());
            query.brand = (!filters.brand.is_empty()).then_some(filters.brand);
        }
        query
    }

    /// Enter `Loading` and describe the fetch.
    pub fn begin_reload(&mut self) -> EquipmentRequest {
        self.state = FetchState::Loading;
        self.display.clear();
        EquipmentRequest {
            ticket: self.tracker.begin(),
            query: self.query(),
            with_categories: self.categories.is_empty(),
        }
    }

    /// Select a category (`None` or `"all"` for every category) and reload.
    pub fn set_category(&mut self, category: Option<&str>) -> EquipmentRequest {
        self.category = category
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        self.begin_reload()
    }

    /// Cycle through "all" and the known categories, then reload.
    pub fn next_category(&mut self) -> EquipmentRequest {
        let next = match &self.category {
            None => self.categories.first().cloned(),
            Some(current) => self
                .categories
                .iter()
                .position(|category| category == current)
                .and_then(|index| self.categories.get(index + 1))
                .cloned(),
        };
        self.set_category(next.as_deref())
    }

    /// Change the sort key.
    pub fn set_sort(&mut self, sort_by: SortKey) -> Option<EquipmentRequest> {
        self.sort_by = sort_by;
        self.refine()
    }

    /// Change the raw lower price bound.
    pub fn set_min_price(&mut self, value: &str) -> Option<EquipmentRequest> {
        self.min_price = value.to_string();
        self.refine()
    }

    /// Change the raw upper price bound.
    pub fn set_max_price(&mut self, value: &str) -> Option<EquipmentRequest> {
        self.max_price = value.to_string();
        self.refine()
    }

    /// Change the brand substring.
    pub fn set_brand(&mut self, value: &str) -> Option<EquipmentRequest> {
        self.brand = value.to_string();
        self.refine()
    }

    /// Restore every filter to its default and reload.
    pub fn reset_filters(&mut self) -> EquipmentRequest {
        self.category = None;
        self.sort_by = SortKey::default();
        self.min_price.clear();
        self.max_price.clear();
        self.brand.clear();
        self.begin_reload()
    }

    /// Apply a response. Results of superseded requests are dropped and
    /// `false` is returned.
    pub fn apply(&mut self, response: EquipmentResponse) -> bool {
        if !self.tracker.is_current(response.ticket) {
            info!(
                generation = response.ticket.generation(),
                "discarding stale equipment response"
            );
            return false;
        }
        match response.categories {
            Some(Ok(categories)) => self.categories = categories,
            Some(Err(err)) => warn!("failed to load equipment categories: {err}"),
            None => {}
        }
        match response.items {
            Ok(items) => {
                info!(count = items.len(), category = ?self.category, "equipment loaded");
                self.state = FetchState::Success {
                    items,
                    meta: PageMeta::single(),
                };
                self.rederive();
            }
            Err(err) => {
                error!("equipment fetch failed: {err}");
                self.state = FetchState::Error(LOAD_FAILED.to_string());
                self.display.clear();
            }
        }
        true
    }

    /// Fetch with the current filters and apply the result.
    pub async fn reload<A: ClubApi + ?Sized>(&mut self, api: &A) {
        let request = self.begin_reload();
        let response = request.execute(api).await;
        self.apply(response);
    }

    /// Add one unit of a displayed item to `cart`, returning the new quantity.
    pub fn add_to_cart(&self, cart: &CartStore, item_id: &str) -> ClientResult<u32> {
        let item = self
            .display
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| ClientError::Precondition(format!("article {item_id} introuvable")))?;
        if !item.is_purchasable() {
            return Err(ClientError::Precondition(format!(
                "{} n'est pas disponible",
                item.name
            )));
        }
        Ok(cart.add_item(item)?)
    }

    /// Add to cart and head to checkout. Payment is not available yet, so
    /// this stops after the cart update.
    pub fn buy_now(&self, cart: &CartStore, item_id: &str) -> ClientResult<u32> {
        let quantity = self.add_to_cart(cart, item_id)?;
        info!(item_id, "checkout requested but payment is not available");
        Ok(quantity)
    }

    fn refine(&mut self) -> Option<EquipmentRequest> {
        match self.policy {
            FilterPolicy::Server => Some(self.begin_reload()),
            FilterPolicy::Client => {
                self.rederive();
                None
            }
        }
    }

    fn rederive(&mut self) {
        self.display = derive(self.state.items(), &self.filters());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::fake::FakeApi, storage::LocalStore};
    use tempfile::tempdir;

    fn item(id: &str, price: f64, brand: &str) -> EquipmentItem {
        EquipmentItem {
            id: id.to_string(),
            name: format!("Article {id}"),
            description: String::new(),
            category: "ballons".to_string(),
            brand: Some(brand.to_string()),
            price,
            stock: 12,
            is_available: true,
            images: Vec::new(),
            specifications: None,
            created_at: None,
        }
    }

    fn three_items() -> Vec<EquipmentItem> {
        vec![item("a", 10.0, "Nike"), item("b", 20.0, "Adidas"), item("c", 30.0, "Nike")]
    }

    #[tokio::test]
    async fn client_policy_refines_without_refetch() {
        let api = FakeApi::default();
        api.equipment.lock().push_back(Ok(three_items()));
        api.categories.lock().push_back(Ok(vec!["ballons".to_string()]));
        let mut equipment = EquipmentController::new(FilterPolicy::Client);
        equipment.reload(&api).await;
        assert_eq!(equipment.categories(), &["ballons".to_string()]);

        assert!(equipment.set_min_price("15").is_none());
        assert!(equipment.set_sort(SortKey::PriceDesc).is_none());
        let prices: Vec<f64> = equipment.items().iter().map(|item| item.price).collect();
        assert_eq!(prices, vec![30.0, 20.0]);

        assert!(equipment.set_brand("nik").is_none());
        assert_eq!(equipment.items().len(), 1);
        assert_eq!(api.calls(), vec!["GET /equipment", "GET /equipment/categories"]);
        assert_eq!(api.equipment_queries.lock()[0], EquipmentQuery::default());
    }

    #[tokio::test]
    async fn server_policy_refetches_with_every_filter() {
        let api = FakeApi::default();
        api.equipment.lock().push_back(Ok(three_items()));
        api.categories.lock().push_back(Ok(vec!["ballons".to_string()]));
        let mut equipment = EquipmentController::new(FilterPolicy::Server);
        equipment.reload(&api).await;

        let request = equipment.set_min_price("15").expect("server policy reloads");
        assert!(equipment.state().is_loading());
        assert_eq!(request.query().min_price.as_deref(), Some("15"));
        assert_eq!(request.query().sort.as_deref(), Some("name"));
        assert_eq!(request.query().brand, None);

        // Even if the server ignores the bound, the display honours it.
        api.equipment.lock().push_back(Ok(three_items()));
        equipment.apply(request.execute(&api).await);
        assert_eq!(equipment.items().len(), 2);
        assert_eq!(api.calls().len(), 3);
    }

    #[test]
    fn server_query_sends_only_parsed_price_bounds() {
        let mut equipment = EquipmentController::new(FilterPolicy::Server);
        let request = equipment.set_min_price("abc").expect("server policy reloads");
        assert_eq!(request.query().min_price, None);

        let request = equipment.set_max_price(" 12,5 ").expect("server policy reloads");
        assert_eq!(request.query().min_price, None);
        assert_eq!(request.query().max_price.as_deref(), Some("12.5"));
        assert_eq!(equipment.filters().max_price, Some(12.5));

        let request = equipment.set_brand("  ").expect("server policy reloads");
        assert_eq!(request.query().brand, None);
    }

    #[tokio::test]
    async fn category_changes_always_refetch() {
        let api = FakeApi::default();
        api.categories
            .lock()
            .push_back(Ok(vec!["ballons".to_string(), "textile".to_string()]));
        api.equipment.lock().push_back(Ok(Vec::new()));
        api.equipment.lock().push_back(Ok(Vec::new()));
        let mut equipment = EquipmentController::new(FilterPolicy::Client);
        equipment.reload(&api).await;

        let request = equipment.next_category();
        assert_eq!(request.query().category.as_deref(), Some("ballons"));
        equipment.apply(request.execute(&api).await);

        equipment.set_category(Some("textile"));
        assert_eq!(equipment.next_category().query().category, None);
        assert_eq!(equipment.reset_filters().query(), &EquipmentQuery::default());
    }

    #[tokio::test]
    async fn failure_is_an_error_without_fallback() {
        let api = FakeApi::default();
        let mut equipment = EquipmentController::new(FilterPolicy::Server);
        equipment.reload(&api).await;
        assert_eq!(equipment.state().error(), Some(LOAD_FAILED));
        assert!(equipment.items().is_empty());
    }

    #[tokio::test]
    async fn cart_accepts_only_purchasable_items() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let cart = CartStore::new(LocalStore::new(dir.path()));
        let mut sold_out = item("z", 5.0, "Decathlon");
        sold_out.stock = 0;

        let api = FakeApi::default();
        api.equipment.lock().push_back(Ok(vec![item("a", 10.0, "Nike"), sold_out]));
        api.categories.lock().push_back(Ok(Vec::new()));
        let mut equipment = EquipmentController::new(FilterPolicy::Client);
        equipment.reload(&api).await;

        assert_eq!(equipment.add_to_cart(&cart, "a")?, 1);
        assert_eq!(equipment.buy_now(&cart, "a")?, 2);
        assert!(matches!(
            equipment.add_to_cart(&cart, "z"),
            Err(ClientError::Precondition(_))
        ));
        assert_eq!(cart.entries()?.len(), 1);
        Ok(())
    }
}
