//! Event listing with sport filter, registration and offline demo data.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::{
    api::ClubApi,
    error::{ClientError, ClientResult},
    fetch::{FetchState, RequestTracker, Ticket},
    models::{EventItem, PageMeta},
};

/// Sport filter values offered by the view; `all` disables filtering.
pub const SPORTS: [&str; 6] = ["all", "football", "basketball", "tennis", "fitness", "athletics"];

/// Advisory shown when the server could not be reached.
pub const DEMO_ADVISORY: &str =
    "Mode démo: données simulées (le serveur n'est pas disponible)";
const LOGIN_REQUIRED: &str = "Veuillez vous connecter pour vous inscrire à un événement";
const REGISTERED: &str = "Inscription réussie !";
const REGISTER_FAILED: &str = "Erreur lors de l'inscription";
const LOAD_FAILED: &str = "Erreur lors du chargement des événements";

/// Display status derived from the wire status and the event date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Cancelled by the club.
    Cancelled,
    /// Took place before today.
    Completed,
    /// Takes place today.
    Today,
    /// Takes place after today.
    Upcoming,
}

impl EventStatus {
    /// Derive the status of `event` relative to `today` (local calendar day).
    pub fn derive(event: &EventItem, today: NaiveDate) -> Self {
        if event.status.eq_ignore_ascii_case("cancelled") {
            return Self::Cancelled;
        }
        let day = event.date.with_timezone(&Local).date_naive();
        if day < today {
            Self::Completed
        } else if day == today {
            Self::Today
        } else {
            Self::Upcoming
        }
    }

    /// Derive the status of `event` relative to the current local day.
    pub fn of(event: &EventItem) -> Self {
        Self::derive(event, Local::now().date_naive())
    }

    /// Stable machine name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Today => "today",
            Self::Upcoming => "upcoming",
        }
    }

    /// Label shown to club members.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cancelled => "annulé",
            Self::Completed => "terminé",
            Self::Today => "aujourd'hui",
            Self::Upcoming => "à venir",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration affordance for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Registration is possible.
    Open,
    /// Upcoming but at capacity; shown disabled as "full".
    Full,
    /// Not upcoming; no registration offered.
    Hidden,
}

impl RegistrationAction {
    /// Action for `event` relative to `today`.
    pub fn derive(event: &EventItem, today: NaiveDate) -> Self {
        if EventStatus::derive(event, today) != EventStatus::Upcoming {
            Self::Hidden
        } else if event.is_full() {
            Self::Full
        } else {
            Self::Open
        }
    }

    /// Button label, if a button is shown.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Open => Some("S'inscrire"),
            Self::Full => Some("Complet"),
            Self::Hidden => None,
        }
    }
}

/// An events fetch that has been started but not yet executed.
#[derive(Debug, Clone)]
pub struct EventsRequest {
    ticket: Ticket,
}

impl EventsRequest {
    /// Run the request against `api`.
    pub async fn execute<A: ClubApi + ?Sized>(self, api: &A) -> EventsResponse {
        EventsResponse {
            ticket: self.ticket,
            result: api.list_events().await,
        }
    }
}

/// Outcome of an [`EventsRequest`].
#[derive(Debug)]
pub struct EventsResponse {
    ticket: Ticket,
    result: ClientResult<Vec<EventItem>>,
}

/// State of the events view.
#[derive(Debug)]
pub struct EventsController {
    sport: String,
    state: FetchState<EventItem>,
    advisory: Option<String>,
    tracker: RequestTracker,
}

impl Default for EventsController {
    fn default() -> Self {
        Self::new()
    }
}

impl EventsController {
    /// Controller showing every sport.
    pub fn new() -> Self {
        Self {
            sport: SPORTS[0].to_string(),
            state: FetchState::Loading,
            advisory: None,
            tracker: RequestTracker::default(),
        }
    }

    /// Selected sport filter.
    pub fn sport(&self) -> &str {
        &self.sport
    }

    /// Current fetch state.
    pub fn state(&self) -> &FetchState<EventItem> {
        &self.state
    }

    /// Non-fatal advisory, set when demo data is displayed.
    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    /// Enter `Loading` and describe the fetch.
    pub fn begin_reload(&mut self) -> EventsRequest {
        self.state = FetchState::Loading;
        self.advisory = None;
        EventsRequest {
            ticket: self.tracker.begin(),
        }
    }

    /// Change the sport filter and reload.
    pub fn set_sport(&mut self, sport: &str) -> EventsRequest {
        let sport = sport.trim();
        self.sport = if sport.is_empty() {
            SPORTS[0].to_string()
        } else {
            sport.to_lowercase()
        };
        self.begin_reload()
    }

    /// Cycle to the next entry of [`SPORTS`] and reload.
    pub fn next_sport(&mut self) -> EventsRequest {
        let index = SPORTS
            .iter()
            .position(|sport| *sport == self.sport)
            .map(|index| (index + 1) % SPORTS.len())
            .unwrap_or(0);
        self.set_sport(SPORTS[index])
    }

    /// Clear the advisory and reload.
    pub fn retry(&mut self) -> EventsRequest {
        self.begin_reload()
    }

    /// Apply a response, falling back to demo data on failure. Results of
    /// superseded requests are dropped and `false` is returned.
    pub fn apply(&mut self, response: EventsResponse) -> bool {
        if !self.tracker.is_current(response.ticket) {
            info!(
                generation = response.ticket.generation(),
                "discarding stale events response"
            );
            return false;
        }
        let items = match response.result {
            Ok(events) => {
                info!(count = events.len(), sport = %self.sport, "events loaded");
                self.filter_and_sort(events)
            }
            Err(err) => {
                error!("events fetch failed, showing demo data: {err}");
                self.advisory = Some(if err.is_no_response() {
                    DEMO_ADVISORY.to_string()
                } else {
                    format!(
                        "{}. Affichage des données de démo.",
                        err.user_message(LOAD_FAILED)
                    )
                });
                self.filter_and_sort(sample_events(Utc::now()))
            }
        };
        self.state = FetchState::Success {
            items,
            meta: PageMeta::single(),
        };
        true
    }

    /// Fetch events and apply the result.
    pub async fn reload<A: ClubApi + ?Sized>(&mut self, api: &A) {
        let request = self.begin_reload();
        let response = request.execute(api).await;
        self.apply(response);
    }

    /// Check that a registration for `event_id` may be sent.
    pub fn check_registration(&self, authenticated: bool, event_id: &str) -> ClientResult<()> {
        if !authenticated {
            return Err(ClientError::Precondition(LOGIN_REQUIRED.to_string()));
        }
        let today = Local::now().date_naive();
        let event = self
            .state
            .items()
            .iter()
            .find(|event| event.id == event_id)
            .ok_or_else(|| ClientError::Precondition(format!("événement {event_id} introuvable")))?;
        match RegistrationAction::derive(event, today) {
            RegistrationAction::Open => Ok(()),
            RegistrationAction::Full => Err(ClientError::Precondition(
                "Cet événement est complet".to_string(),
            )),
            RegistrationAction::Hidden => Err(ClientError::Precondition(
                "Les inscriptions sont fermées pour cet événement".to_string(),
            )),
        }
    }

    /// Record the server's answer to a registration and return the message
    /// to show. On success the local participant count is incremented; on
    /// failure use [`registration_failure_message`] for the user-facing text.
    pub fn apply_registration(
        &mut self,
        event_id: &str,
        result: ClientResult<Option<String>>,
    ) -> ClientResult<String> {
        match result {
            Ok(message) => {
                if let Some(event) = self
                    .state
                    .items_mut()
                    .and_then(|items| items.iter_mut().find(|event| event.id == event_id))
                {
                    event.current_participants = event.current_participants.saturating_add(1);
                }
                info!(event_id, "registered for event");
                Ok(message.unwrap_or_else(|| REGISTERED.to_string()))
            }
            Err(err) => {
                warn!(event_id, "registration failed: {err}");
                Err(err)
            }
        }
    }

    /// Register the current user for `event_id`.
    ///
    /// Without a token this fails with [`ClientError::Precondition`] and
    /// sends nothing.
    pub async fn register<A: ClubApi + ?Sized>(
        &mut self,
        api: &A,
        event_id: &str,
    ) -> ClientResult<String> {
        self.check_registration(api.has_token(), event_id)?;
        let result = api.register_event(event_id).await;
        self.apply_registration(event_id, result)
    }

    fn filter_and_sort(&self, events: Vec<EventItem>) -> Vec<EventItem> {
        let mut selected: Vec<EventItem> = if self.sport == SPORTS[0] {
            events
        } else {
            events
                .into_iter()
                .filter(|event| event.sport.eq_ignore_ascii_case(&self.sport))
                .collect()
        };
        selected.sort_by_key(|event| event.date);
        selected
    }
}

/// Server-provided reason for a failed registration, or a generic one.
pub fn registration_failure_message(err: &ClientError) -> String {
    err.user_message(REGISTER_FAILED)
}

/// Built-in events shown when the API is unavailable, dated one, two and
/// three weeks after `now`.
pub fn sample_events(now: DateTime<Utc>) -> Vec<EventItem> {
    let event = |id: &str,
                 title: &str,
                 description: &str,
                 weeks: i64,
                 (start, end): (&str, &str),
                 location: &str,
                 sport: &str,
                 (max, current): (u32, u32),
                 price: f64| EventItem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        date: now + Duration::weeks(weeks),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        location: location.to_string(),
        sport: sport.to_string(),
        max_participants: Some(max),
        current_participants: current,
        price,
        status: "upcoming".to_string(),
    };

    vec![
        event(
            "1",
            "Tournoi de basketball 3x3",
            "Participez à notre tournoi de basketball 3x3 ouvert à tous les niveaux.",
            1,
            ("09:00", "18:00"),
            "Terrain extérieur",
            "basketball",
            (20, 15),
            0.0,
        ),
        event(
            "2",
            "Course d'orientation",
            "Découvrez la course d'orientation en forêt.",
            2,
            ("08:00", "12:00"),
            "Forêt de Fontainebleau",
            "athletics",
            (30, 22),
            10.0,
        ),
        event(
            "3",
            "Stage de tennis junior",
            "Stage d'une semaine pour les jeunes.",
            3,
            ("10:00", "16:00"),
            "Courts de tennis",
            "tennis",
            (15, 12),
            150.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::fake::FakeApi, error::NetworkError};
    use chrono::TimeZone;

    fn at_local_noon(day: NaiveDate) -> DateTime<Utc> {
        let noon = day.and_hms_opt(12, 0, 0).expect("valid time");
        Local
            .from_local_datetime(&noon)
            .earliest()
            .expect("representable local time")
            .with_timezone(&Utc)
    }

    fn event(id: &str, sport: &str, date: DateTime<Utc>) -> EventItem {
        EventItem {
            id: id.to_string(),
            title: format!("Événement {id}"),
            description: String::new(),
            date,
            start_time: None,
            end_time: None,
            location: "Gymnase".to_string(),
            sport: sport.to_string(),
            max_participants: None,
            current_participants: 0,
            price: 0.0,
            status: "upcoming".to_string(),
        }
    }

    #[test]
    fn status_derivation_uses_calendar_day() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let yesterday = today.pred_opt().expect("valid date");
        let tomorrow = today.succ_opt().expect("valid date");

        let past = event("a", "tennis", at_local_noon(yesterday));
        let present = event("b", "tennis", at_local_noon(today));
        let future = event("c", "tennis", at_local_noon(tomorrow));
        assert_eq!(EventStatus::derive(&past, today), EventStatus::Completed);
        assert_eq!(EventStatus::derive(&present, today), EventStatus::Today);
        assert_eq!(EventStatus::derive(&future, today), EventStatus::Upcoming);

        for mut cancelled in [past, present, future] {
            cancelled.status = "cancelled".to_string();
            assert_eq!(EventStatus::derive(&cancelled, today), EventStatus::Cancelled);
        }
    }

    #[test]
    fn registration_action_respects_capacity() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let mut upcoming = event("a", "football", at_local_noon(today + Duration::days(3)));
        assert_eq!(RegistrationAction::derive(&upcoming, today), RegistrationAction::Open);

        upcoming.max_participants = Some(10);
        upcoming.current_participants = 10;
        assert_eq!(RegistrationAction::derive(&upcoming, today), RegistrationAction::Full);
        assert_eq!(RegistrationAction::Full.label(), Some("Complet"));

        let same_day = event("b", "football", at_local_noon(today));
        assert_eq!(RegistrationAction::derive(&same_day, today), RegistrationAction::Hidden);
    }

    #[tokio::test]
    async fn offline_failure_falls_back_to_filtered_demo_data() {
        let api = FakeApi::default();
        api.events
            .lock()
            .push_back(Err(NetworkError::no_response("connection refused").into()));
        let mut events = EventsController::new();
        let request = events.set_sport("Tennis");
        let response = request.execute(&api).await;
        assert!(events.apply(response));

        assert_eq!(events.advisory(), Some(DEMO_ADVISORY));
        assert!(events.advisory().is_some_and(|text| text.contains("démo")));
        let items = events.state().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Stage de tennis junior");

        api.events
            .lock()
            .push_back(Err(NetworkError::no_response("connection refused").into()));
        let request = events.set_sport("all");
        let response = request.execute(&api).await;
        events.apply(response);
        assert_eq!(events.state().items().len(), 3);
    }

    #[tokio::test]
    async fn server_error_advisory_uses_user_message() {
        let api = FakeApi::default();
        api.events
            .lock()
            .push_back(Err(ClientError::MalformedResponse("missing `events` collection".to_string())));
        let mut events = EventsController::new();
        events.reload(&api).await;
        assert_eq!(
            events.advisory(),
            Some("Erreur lors du chargement des événements. Affichage des données de démo.")
        );

        api.events.lock().push_back(Err(NetworkError::HttpStatus {
            status: 503,
            body: r#"{"message":"Maintenance en cours"}"#.to_string(),
        }
        .into()));
        let request = events.retry();
        events.apply(request.execute(&api).await);
        assert_eq!(
            events.advisory(),
            Some("Maintenance en cours. Affichage des données de démo.")
        );

        api.events.lock().push_back(Ok(Vec::new()));
        let request = events.retry();
        assert!(events.advisory().is_none());
        events.apply(request.execute(&api).await);
        assert!(events.state().items().is_empty());
    }

    #[tokio::test]
    async fn success_filters_by_sport_and_sorts_by_date() {
        let now = Utc::now();
        let api = FakeApi::default();
        api.events.lock().push_back(Ok(vec![
            event("late", "Football", now + Duration::days(9)),
            event("other", "tennis", now + Duration::days(1)),
            event("early", "football", now + Duration::days(2)),
        ]));
        let mut events = EventsController::new();
        let request = events.set_sport("football");
        events.apply(request.execute(&api).await);

        let ids: Vec<_> = events.state().items().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert!(events.advisory().is_none());
    }

    #[tokio::test]
    async fn register_without_token_sends_nothing() {
        let api = FakeApi::default();
        let mut events = EventsController::new();
        let err = events.register(&api, "1").await.expect_err("no token");
        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn register_increments_participants_locally() -> anyhow::Result<()> {
        let api = FakeApi {
            token: true,
            ..FakeApi::default()
        };
        api.events.lock().push_back(Ok(sample_events(Utc::now())));
        api.registrations.lock().push_back(Ok(None));
        api.registrations.lock().push_back(Err(NetworkError::HttpStatus {
            status: 400,
            body: r#"{"message":"Déjà inscrit"}"#.to_string(),
        }
        .into()));

        let mut events = EventsController::new();
        events.reload(&api).await;
        assert_eq!(events.register(&api, "1").await?, REGISTERED);
        let basketball = &events.state().items()[0];
        assert_eq!(basketball.current_participants, 16);

        let err = events.register(&api, "1").await.expect_err("duplicate");
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(registration_failure_message(&err), "Déjà inscrit");
        assert_eq!(
            registration_failure_message(&NetworkError::no_response("down").into()),
            REGISTER_FAILED
        );
        assert_eq!(events.state().items()[0].current_participants, 16);
        assert_eq!(
            api.calls(),
            vec!["GET /events", "POST /events/1/register", "POST /events/1/register"]
        );
        Ok(())
    }
}
