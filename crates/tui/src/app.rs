use std::{future::Future, io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info, warn};
use sportpro_core::{
    api::ClubApi,
    cart::{CartEntry, CartStore},
    check_connection,
    contact::{ContactController, ContactField},
    error::ClientResult,
    fetch::FetchState,
    http::HttpClient,
    models::{AuthResponse, NewsItem, User},
    session::Session,
    views::{
        registration_failure_message, AuthController, AuthField, AuthMode, AuthRequest,
        EquipmentController, EquipmentRequest, EquipmentResponse, EventStatus, EventsController,
        EventsRequest, EventsResponse, NewsController, NewsRequest, NewsResponse,
        RegistrationAction,
    },
    AppConfig,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const CART_ADD_FAILED: &str = "Impossible d'ajouter l'article au panier";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    News,
    Events,
    Equipment,
    Cart,
    Contact,
    Login,
}

impl Screen {
    const MENU: [Screen; 6] = [
        Screen::News,
        Screen::Events,
        Screen::Equipment,
        Screen::Cart,
        Screen::Contact,
        Screen::Login,
    ];

    fn title(&self) -> &'static str {
        match self {
            Self::Home => "Accueil",
            Self::News => "Actualités",
            Self::Events => "Événements",
            Self::Equipment => "Équipements",
            Self::Cart => "Panier",
            Self::Contact => "Contact",
            Self::Login => "Compte",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Self::Home => "↑/↓ naviguer · Entrée ouvrir · q quitter",
            Self::News => "↑/↓ sélection · ←/→ page · Entrée détail · r recharger · Échap retour",
            Self::Events => "↑/↓ sélection · s sport · Entrée s'inscrire · r réessayer · Échap retour",
            Self::Equipment => {
                "↑/↓ · c catégorie · o tri · m/M prix · b marque · x réinitialiser · a panier · Entrée acheter"
            }
            Self::Cart => "↑/↓ sélection · c vider le panier · Échap retour",
            Self::Contact => "Tab champ suivant · Entrée envoyer · Échap retour",
            Self::Login => "Tab champ suivant · Entrée valider · F2 connexion/inscription · Échap retour",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EquipmentField {
    MinPrice,
    MaxPrice,
    Brand,
}

impl EquipmentField {
    fn label(&self) -> &'static str {
        match self {
            Self::MinPrice => "Prix min",
            Self::MaxPrice => "Prix max",
            Self::Brand => "Marque",
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    Health(bool),
    News(NewsResponse),
    NewsDetail(ClientResult<NewsItem>),
    Events(EventsResponse),
    Registered {
        event_id: String,
        result: ClientResult<Option<String>>,
    },
    Equipment(EquipmentResponse),
    ContactSent(ClientResult<Option<String>>),
    Authenticated {
        request: AuthRequest,
        result: ClientResult<AuthResponse>,
    },
    Profile(ClientResult<User>),
}

/// Terminal frontend for the SportPro club API.
pub struct SportProApp {
    api: Arc<HttpClient>,
    session: Session,
    cart: CartStore,
    cart_entries: Vec<CartEntry>,
    screen: Screen,
    state: UiState,
    news: NewsController,
    news_detail: Option<NewsItem>,
    events: EventsController,
    equipment: EquipmentController,
    editing: Option<EquipmentField>,
    contact: ContactController,
    contact_focus: usize,
    auth: AuthController,
    auth_focus: usize,
    online: Option<bool>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl SportProApp {
    pub fn new(config: &AppConfig, api: HttpClient, cart: CartStore) -> Self {
        let session = api.session().clone();
        Self {
            api: Arc::new(api),
            session,
            cart,
            cart_entries: Vec::new(),
            screen: Screen::Home,
            state: UiState::default(),
            news: NewsController::new(config.news_page_size),
            news_detail: None,
            events: EventsController::new(),
            equipment: EquipmentController::new(config.filter_policy),
            editing: None,
            contact: ContactController::new(),
            contact_focus: 0,
            auth: AuthController::new(),
            auth_focus: 0,
            online: None,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        if let Err(err) = self.refresh_cart() {
            self.state.set_status(format!("Panier illisible: {err}"));
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.check_health();
        self.load_profile();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn dispatch<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            debug!("event loop not running; task dropped");
            return;
        };
        spawn(async move {
            let event = task.await;
            if sender.send(event).await.is_err() {
                debug!("event loop closed before task completed");
            }
        });
    }

    fn check_health(&self) {
        let api = Arc::clone(&self.api);
        self.dispatch(async move { AppEvent::Health(check_connection(&*api).await) });
    }

    fn load_profile(&self) {
        if !self.session.is_authenticated() {
            return;
        }
        let api = Arc::clone(&self.api);
        self.dispatch(async move { AppEvent::Profile(api.profile().await) });
    }

    fn start_news(&self, request: NewsRequest) {
        let api = Arc::clone(&self.api);
        self.dispatch(async move { AppEvent::News(request.execute(&*api).await) });
    }

    fn start_events(&self, request: EventsRequest) {
        let api = Arc::clone(&self.api);
        self.dispatch(async move { AppEvent::Events(request.execute(&*api).await) });
    }

    fn start_equipment(&self, request: EquipmentRequest) {
        let api = Arc::clone(&self.api);
        self.dispatch(async move { AppEvent::Equipment(request.execute(&*api).await) });
    }

    fn refresh_cart(&mut self) -> Result<()> {
        self.cart_entries = self.cart.entries()?;
        self.state.cart.clamp(self.cart_entries.len());
        Ok(())
    }

    fn enter_screen(&mut self, screen: Screen) {
        info!(screen = screen.title(), "screen opened");
        self.screen = screen;
        self.editing = None;
        match screen {
            Screen::News => {
                self.news_detail = None;
                let request = self.news.begin_reload();
                self.start_news(request);
            }
            Screen::Events => {
                let request = self.events.begin_reload();
                self.start_events(request);
            }
            Screen::Equipment => {
                let request = self.equipment.begin_reload();
                self.start_equipment(request);
            }
            Screen::Cart => {
                if let Err(err) = self.refresh_cart() {
                    error!("failed to read cart: {err:#}");
                    self.state.set_status(format!("Panier illisible: {err}"));
                }
            }
            Screen::Home | Screen::Contact | Screen::Login => {}
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Erreur: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.contact.tick(Utc::now());
                true
            }
            Some(AppEvent::Health(online)) => {
                self.online = Some(online);
                if !online {
                    self.state
                        .set_status("Serveur injoignable: certaines données seront simulées".to_string());
                }
                true
            }
            Some(AppEvent::News(response)) => {
                if self.news.apply(response) {
                    self.state.news.clamp(self.news.state().items().len());
                }
                true
            }
            Some(AppEvent::NewsDetail(result)) => {
                match result {
                    Ok(item) => self.news_detail = Some(item),
                    Err(err) => {
                        warn!("news detail failed: {err}");
                        self.state
                            .set_status(err.user_message("Impossible de charger l'article"));
                    }
                }
                true
            }
            Some(AppEvent::Events(response)) => {
                if self.events.apply(response) {
                    self.state.events.clamp(self.events.state().items().len());
                }
                true
            }
            Some(AppEvent::Registered { event_id, result }) => {
                let message = match self.events.apply_registration(&event_id, result) {
                    Ok(message) => message,
                    Err(err) => registration_failure_message(&err),
                };
                self.state.set_status(message);
                true
            }
            Some(AppEvent::Equipment(response)) => {
                if self.equipment.apply(response) {
                    self.state.equipment.clamp(self.equipment.items().len());
                }
                true
            }
            Some(AppEvent::ContactSent(result)) => {
                self.contact.finish(result, Utc::now());
                match self.contact.error() {
                    Some(message) => self.state.set_status(message.to_string()),
                    None => self.state.set_status("Message envoyé".to_string()),
                }
                true
            }
            Some(AppEvent::Authenticated { request, result }) => {
                match self.auth.finish(&self.session, &request, result) {
                    Ok(()) => {
                        self.auth_focus = 0;
                        self.state.set_status("Connexion réussie".to_string());
                        if self.auth.user().is_none() {
                            self.load_profile();
                        }
                    }
                    Err(_) => {
                        let message = self.auth.error().unwrap_or("Échec de la connexion");
                        self.state.set_status(message.to_string());
                    }
                }
                true
            }
            Some(AppEvent::Profile(result)) => {
                match result {
                    Ok(user) => {
                        info!(user = %user.email, "profile loaded");
                        self.auth.set_user(user);
                    }
                    Err(err) => warn!("profile fetch failed: {err}"),
                }
                true
            }
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::News => self.handle_news_key(key),
            Screen::Events => self.handle_events_key(key),
            Screen::Equipment => self.handle_equipment_key(key)?,
            Screen::Cart => self.handle_cart_key(key)?,
            Screen::Contact => self.handle_contact_key(key),
            Screen::Login => self.handle_login_key(key)?,
        }
        Ok(())
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        let options = Screen::MENU.len() + 1;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.menu_cursor = (self.state.menu_cursor + 1).min(options - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.menu_cursor = self.state.menu_cursor.saturating_sub(1);
            }
            KeyCode::Enter => match Screen::MENU.get(self.state.menu_cursor) {
                Some(screen) => self.enter_screen(*screen),
                None => self.state.should_quit = true,
            },
            _ => {}
        }
    }

    fn handle_news_key(&mut self, key: KeyEvent) {
        let total = self.news.state().items().len();
        let page_change = match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Home;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.news.move_by(1, total);
                self.news_detail = None;
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.news.move_by(-1, total);
                self.news_detail = None;
                None
            }
            KeyCode::Char('n') | KeyCode::Right => self.news.next_page(),
            KeyCode::Char('p') | KeyCode::Left => self.news.previous_page(),
            KeyCode::Char('r') => Some(self.news.begin_reload()),
            KeyCode::Enter => {
                if let Some(item) = self.news.state().items().get(self.state.news.cursor) {
                    let api = Arc::clone(&self.api);
                    let id = item.id.clone();
                    self.dispatch(async move { AppEvent::NewsDetail(api.get_news(&id).await) });
                }
                None
            }
            _ => None,
        };
        if let Some(request) = page_change {
            self.state.news.reset();
            self.news_detail = None;
            self.start_news(request);
        }
    }

    fn handle_events_key(&mut self, key: KeyEvent) {
        let total = self.events.state().items().len();
        match key.code {
            KeyCode::Esc => self.screen = Screen::Home,
            KeyCode::Char('j') | KeyCode::Down => self.state.events.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.events.move_by(-1, total),
            KeyCode::Char('s') => {
                let request = self.events.next_sport();
                self.state.events.reset();
                self.start_events(request);
            }
            KeyCode::Char('r') => {
                let request = self.events.retry();
                self.start_events(request);
            }
            KeyCode::Enter => self.register_selected_event(),
            _ => {}
        }
    }

    fn register_selected_event(&mut self) {
        let Some(event) = self.events.state().items().get(self.state.events.cursor) else {
            return;
        };
        let event_id = event.id.clone();
        if let Err(err) = self
            .events
            .check_registration(self.session.is_authenticated(), &event_id)
        {
            self.state.set_status(registration_failure_message(&err));
            return;
        }
        self.state.set_status("Inscription en cours…".to_string());
        let api = Arc::clone(&self.api);
        self.dispatch(async move {
            let result = api.register_event(&event_id).await;
            AppEvent::Registered { event_id, result }
        });
    }

    fn handle_equipment_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(field) = self.editing {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => self.editing = None,
                KeyCode::Backspace => self.edit_equipment_field(field, |value| {
                    value.pop();
                }),
                KeyCode::Char(ch) => self.edit_equipment_field(field, |value| value.push(ch)),
                _ => {}
            }
            return Ok(());
        }

        let total = self.equipment.items().len();
        let reload = match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Home;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.equipment.move_by(1, total);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.equipment.move_by(-1, total);
                None
            }
            KeyCode::Char('c') => Some(self.equipment.next_category()),
            KeyCode::Char('o') => {
                let next = self.equipment.sort_by().next();
                self.equipment.set_sort(next)
            }
            KeyCode::Char('m') => {
                self.editing = Some(EquipmentField::MinPrice);
                None
            }
            KeyCode::Char('M') => {
                self.editing = Some(EquipmentField::MaxPrice);
                None
            }
            KeyCode::Char('b') => {
                self.editing = Some(EquipmentField::Brand);
                None
            }
            KeyCode::Char('x') => Some(self.equipment.reset_filters()),
            KeyCode::Char('r') => Some(self.equipment.begin_reload()),
            KeyCode::Char('a') => {
                self.add_selected_to_cart(false)?;
                None
            }
            KeyCode::Enter => {
                self.add_selected_to_cart(true)?;
                None
            }
            _ => None,
        };
        if let Some(request) = reload {
            self.state.equipment.reset();
            self.start_equipment(request);
        } else {
            self.state.equipment.clamp(self.equipment.items().len());
        }
        Ok(())
    }

    fn edit_equipment_field(&mut self, field: EquipmentField, edit: impl FnOnce(&mut String)) {
        let mut value = match field {
            EquipmentField::MinPrice => self.equipment.min_price().to_string(),
            EquipmentField::MaxPrice => self.equipment.max_price().to_string(),
            EquipmentField::Brand => self.equipment.brand().to_string(),
        };
        edit(&mut value);
        let request = match field {
            EquipmentField::MinPrice => self.equipment.set_min_price(&value),
            EquipmentField::MaxPrice => self.equipment.set_max_price(&value),
            EquipmentField::Brand => self.equipment.set_brand(&value),
        };
        match request {
            Some(request) => {
                self.state.equipment.reset();
                self.start_equipment(request);
            }
            None => self.state.equipment.clamp(self.equipment.items().len()),
        }
    }

    fn add_selected_to_cart(&mut self, checkout: bool) -> Result<()> {
        let Some(item) = self.equipment.items().get(self.state.equipment.cursor) else {
            return Ok(());
        };
        let (id, name) = (item.id.clone(), item.name.clone());
        let outcome = if checkout {
            self.equipment.buy_now(&self.cart, &id)
        } else {
            self.equipment.add_to_cart(&self.cart, &id)
        };
        match outcome {
            Ok(quantity) => {
                self.refresh_cart()?;
                let message = if checkout {
                    format!("{name} ajouté au panier (x{quantity}). Le paiement en ligne n'est pas encore disponible.")
                } else {
                    format!("{name} ajouté au panier (x{quantity})")
                };
                self.state.set_status(message);
            }
            Err(err) => {
                error!("add to cart failed: {err}");
                self.state.set_status(err.user_message(CART_ADD_FAILED));
            }
        }
        Ok(())
    }

    fn handle_cart_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.cart_entries.len();
        match key.code {
            KeyCode::Esc => self.screen = Screen::Home,
            KeyCode::Char('j') | KeyCode::Down => self.state.cart.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.cart.move_by(-1, total),
            KeyCode::Char('c') => {
                self.cart.clear()?;
                self.refresh_cart()?;
                self.state.set_status("Panier vidé".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_contact_key(&mut self, key: KeyEvent) {
        let field = ContactField::ALL[self.contact_focus];
        match key.code {
            KeyCode::Esc => self.screen = Screen::Home,
            KeyCode::Tab | KeyCode::Down => {
                self.contact_focus = (self.contact_focus + 1) % ContactField::ALL.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.contact_focus =
                    (self.contact_focus + ContactField::ALL.len() - 1) % ContactField::ALL.len();
            }
            KeyCode::Backspace => {
                self.contact.form.field_mut(field).pop();
            }
            KeyCode::Char(ch) => self.contact.form.field_mut(field).push(ch),
            KeyCode::Enter => {
                if self.contact.is_sending() {
                    return;
                }
                match self.contact.prepare() {
                    Some(message) => {
                        self.state.set_status("Envoi du message…".to_string());
                        let api = Arc::clone(&self.api);
                        self.dispatch(async move {
                            AppEvent::ContactSent(api.send_contact(&message).await)
                        });
                    }
                    None => {
                        let message = self.contact.error().unwrap_or_default().to_string();
                        self.state.set_status(message);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.session.is_authenticated() {
            match key.code {
                KeyCode::Esc => self.screen = Screen::Home,
                KeyCode::Char('l') => {
                    self.auth.logout(&self.session)?;
                    self.state.set_status("Déconnecté".to_string());
                }
                _ => {}
            }
            return Ok(());
        }

        let fields = self.auth.fields();
        self.auth_focus = self.auth_focus.min(fields.len() - 1);
        let field = fields[self.auth_focus];
        match key.code {
            KeyCode::Esc => self.screen = Screen::Home,
            KeyCode::F(2) => {
                self.auth.toggle_mode();
                self.auth_focus = 0;
            }
            KeyCode::Tab | KeyCode::Down => self.auth_focus = (self.auth_focus + 1) % fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.auth_focus = (self.auth_focus + fields.len() - 1) % fields.len();
            }
            KeyCode::Backspace => {
                self.auth.field_mut(field).pop();
            }
            KeyCode::Char(ch) => self.auth.field_mut(field).push(ch),
            KeyCode::Enter => {
                if self.auth.is_pending() {
                    return Ok(());
                }
                match self.auth.prepare() {
                    Some(request) => {
                        self.state.set_status("Connexion…".to_string());
                        let api = Arc::clone(&self.api);
                        self.dispatch(async move {
                            let result = request.clone().execute(&*api).await;
                            AppEvent::Authenticated { request, result }
                        });
                    }
                    None => {
                        let message = self.auth.error().unwrap_or_default().to_string();
                        self.state.set_status(message);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(frame.size());

        self.render_tabs(frame, chunks[0]);
        match self.screen {
            Screen::Home => self.draw_home(frame, chunks[1]),
            Screen::News => self.draw_news(frame, chunks[1]),
            Screen::Events => self.draw_events(frame, chunks[1]),
            Screen::Equipment => self.draw_equipment(frame, chunks[1]),
            Screen::Cart => self.draw_cart(frame, chunks[1]),
            Screen::Contact => self.draw_contact(frame, chunks[1]),
            Screen::Login => self.draw_login(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            "SportPro ",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )];
        for screen in std::iter::once(Screen::Home).chain(Screen::MENU) {
            let style = if screen == self.screen {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(self.theme.muted)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(screen.title(), style));
        }
        let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn draw_home(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(area);

        let (api_label, api_color) = match self.online {
            None => ("vérification…", self.theme.muted),
            Some(true) => ("en ligne", self.theme.success),
            Some(false) => ("hors ligne", self.theme.danger),
        };
        let banner = Paragraph::new(vec![
            Line::from(Span::styled(
                "SportPro · club omnisports",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw("API: "),
                Span::styled(api_label, Style::default().fg(api_color)),
            ]),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(banner, layout[0]);

        let labels: Vec<&str> = Screen::MENU
            .iter()
            .map(Screen::title)
            .chain(std::iter::once("Quitter"))
            .collect();
        let menu_height = (labels.len() as u16).saturating_add(2).min(layout[1].height);
        let menu_area = centered_rect(30, menu_height, layout[1]);
        let lines: Vec<Line> = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {label}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {label}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, menu_area);
    }

    fn draw_news(&mut self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let title = format!(
            "Actualités · page {}/{}",
            self.news.page(),
            self.news.total_pages()
        );

        if let Some(placeholder) = placeholder(&self.theme, self.news.state(), &title) {
            frame.render_widget(placeholder, area);
            return;
        }

        let rows: Vec<Line<'static>> = self
            .news
            .state()
            .items()
            .iter()
            .map(|item| {
                let date = item.published_at.map(format_date).unwrap_or_default();
                Line::from(vec![
                    Span::styled(item.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" · {date}"), Style::default().fg(self.theme.muted)),
                ])
            })
            .collect();
        render_cursor_list(&self.theme, frame, columns[0], &title, &mut self.state.news, rows);

        let block = Block::default().borders(Borders::ALL).title("Article");
        let selected = self.news.state().items().get(self.state.news.cursor);
        let Some(item) = self.news_detail.as_ref().or(selected) else {
            frame.render_widget(Paragraph::new("Aucune actualité").block(block), columns[1]);
            return;
        };
        let body = if self.news_detail.is_some() {
            item.content.clone()
        } else {
            item.summary()
        };
        let mut lines = vec![
            Line::from(Span::styled(
                item.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} · {} vues", item.category, item.views),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
        ];
        lines.extend(body.lines().map(|line| Line::from(line.to_string())));
        if let Some(image) = &item.image {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Image: {image}"),
                Style::default().fg(self.theme.muted),
            )));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[1]);
    }

    fn draw_events(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!("Événements · sport: {}", self.events.sport());
        let (advisory_area, area) = match self.events.advisory() {
            Some(advisory) => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Min(3)])
                    .split(area);
                let line = Paragraph::new(Span::styled(
                    advisory.to_string(),
                    Style::default().fg(self.theme.warning),
                ));
                (Some((line, rows[0])), rows[1])
            }
            None => (None, area),
        };
        if let Some((line, line_area)) = advisory_area {
            frame.render_widget(line, line_area);
        }

        if let Some(placeholder) = placeholder(&self.theme, self.events.state(), &title) {
            frame.render_widget(placeholder, area);
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let today = Local::now().date_naive();
        let rows: Vec<Line<'static>> = self
            .events
            .state()
            .items()
            .iter()
            .map(|event| {
                let status = EventStatus::derive(event, today);
                Line::from(vec![
                    Span::styled(format_date(event.date), Style::default().fg(self.theme.muted)),
                    Span::raw(" "),
                    Span::styled(event.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!(" [{}]", status.label()),
                        Style::default().fg(self.status_color(status)),
                    ),
                ])
            })
            .collect();
        render_cursor_list(&self.theme, frame, columns[0], &title, &mut self.state.events, rows);

        let block = Block::default().borders(Borders::ALL).title("Détails");
        let Some(event) = self.events.state().items().get(self.state.events.cursor) else {
            frame.render_widget(
                Paragraph::new("Aucun événement pour ce sport").block(block),
                columns[1],
            );
            return;
        };
        let participants = match event.max_participants {
            Some(max) => format!("{}/{max} participants", event.current_participants),
            None => format!("{} participants", event.current_participants),
        };
        let mut lines = vec![
            Line::from(Span::styled(
                event.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("{} · {}", format_date(event.date), event.time_range())),
            Line::from(format!("Lieu: {}", event.location)),
            Line::from(format!("Sport: {}", event.sport)),
            Line::from(participants),
            Line::from(format!("Tarif: {}", format_price(event.price))),
            Line::from(""),
            Line::from(event.description.clone()),
        ];
        if let Some(label) = RegistrationAction::derive(event, today).label() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("[Entrée] {label}"),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[1]);
    }

    fn status_color(&self, status: EventStatus) -> Color {
        match status {
            EventStatus::Cancelled => self.theme.danger,
            EventStatus::Completed => self.theme.muted,
            EventStatus::Today => self.theme.warning,
            EventStatus::Upcoming => self.theme.success,
        }
    }

    fn draw_equipment(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let mut filters = vec![
            Span::raw(format!(
                "Catégorie: {}  Tri: {}  ",
                self.equipment.category().unwrap_or("toutes"),
                self.equipment.sort_by().label()
            )),
        ];
        for (field, value) in [
            (EquipmentField::MinPrice, self.equipment.min_price()),
            (EquipmentField::MaxPrice, self.equipment.max_price()),
            (EquipmentField::Brand, self.equipment.brand()),
        ] {
            let style = if self.editing == Some(field) {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let cursor = if self.editing == Some(field) { "▏" } else { "" };
            filters.push(Span::styled(
                format!("{}: {value}{cursor}  ", field.label()),
                style,
            ));
        }
        let filter_bar = Paragraph::new(Line::from(filters))
            .block(Block::default().borders(Borders::ALL).title("Filtres"));
        frame.render_widget(filter_bar, rows[0]);

        let title = format!("Équipements ({})", self.equipment.items().len());
        if let Some(placeholder) = placeholder(&self.theme, self.equipment.state(), &title) {
            frame.render_widget(placeholder, rows[1]);
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        let list_rows: Vec<Line<'static>> = self
            .equipment
            .items()
            .iter()
            .map(|item| {
                let stock_style = if !item.is_purchasable() {
                    Style::default().fg(self.theme.danger)
                } else if item.is_low_stock() {
                    Style::default().fg(self.theme.warning)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Line::from(vec![
                    Span::styled(item.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(" · {}", format_price(item.price))),
                    Span::styled(format!(" · stock {}", item.stock), stock_style),
                ])
            })
            .collect();
        render_cursor_list(
            &self.theme,
            frame,
            columns[0],
            &title,
            &mut self.state.equipment,
            list_rows,
        );

        let block = Block::default().borders(Borders::ALL).title("Fiche produit");
        let Some(item) = self.equipment.items().get(self.state.equipment.cursor) else {
            frame.render_widget(
                Paragraph::new("Aucun équipement ne correspond aux filtres").block(block),
                columns[1],
            );
            return;
        };
        let availability = if !item.is_purchasable() {
            Span::styled("Rupture de stock", Style::default().fg(self.theme.danger))
        } else if item.is_low_stock() {
            Span::styled(
                format!("Plus que {} en stock", item.stock),
                Style::default().fg(self.theme.warning),
            )
        } else {
            Span::styled("En stock", Style::default().fg(self.theme.success))
        };
        let mut lines = vec![
            Line::from(Span::styled(
                item.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{} · {}",
                item.brand.as_deref().unwrap_or("sans marque"),
                item.category
            )),
            Line::from(format_price(item.price)),
            Line::from(availability),
            Line::from(""),
            Line::from(item.description.clone()),
        ];
        if let Some(specifications) = &item.specifications {
            lines.push(Line::from(""));
            for key in specifications.keys() {
                if let Some(value) = item.specification(key) {
                    lines.push(Line::from(format!("{key}: {value}")));
                }
            }
        }
        if let Some(image) = item.primary_image() {
            lines.push(Line::from(Span::styled(
                format!("Image: {image}"),
                Style::default().fg(self.theme.muted),
            )));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[1]);
    }

    fn draw_cart(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);
        let title = format!("Panier ({} article(s))", cart_quantity(&self.cart_entries));
        if self.cart_entries.is_empty() {
            let paragraph = Paragraph::new("Votre panier est vide")
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, rows[0]);
        } else {
            let lines: Vec<Line<'static>> = self
                .cart_entries
                .iter()
                .map(|entry| {
                    Line::from(vec![
                        Span::raw(format!("{} × ", entry.quantity)),
                        Span::styled(
                            entry.item.name.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!(" · {}", format_price(entry.subtotal())),
                            Style::default().fg(self.theme.muted),
                        ),
                    ])
                })
                .collect();
            render_cursor_list(&self.theme, frame, rows[0], &title, &mut self.state.cart, lines);
        }
        let total: f64 = self.cart_entries.iter().map(CartEntry::subtotal).sum();
        let summary = Paragraph::new(Line::from(Span::styled(
            format!("Total: {total:.2} €"),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(summary, rows[1]);
    }

    fn draw_contact(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = ContactField::ALL
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                form_line(
                    &self.theme,
                    field.label(),
                    self.contact.form.field(*field),
                    idx == self.contact_focus,
                )
            })
            .collect();
        lines.push(Line::from(""));
        if self.contact.is_sending() {
            lines.push(Line::from(Span::styled(
                "Envoi en cours…",
                Style::default().fg(self.theme.muted),
            )));
        } else if self.contact.confirmation_visible(Utc::now()) {
            lines.push(Line::from(Span::styled(
                "Message envoyé avec succès ! Nous vous répondrons rapidement.",
                Style::default().fg(self.theme.success),
            )));
        } else if let Some(error) = self.contact.error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(self.theme.danger),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Nous contacter"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_login(&mut self, frame: &mut Frame, area: Rect) {
        let form_area = centered_rect(60, 12, area);
        if self.session.is_authenticated() {
            let mut lines = vec![Line::from(Span::styled(
                "Connecté",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            ))];
            match self.auth.user() {
                Some(user) => {
                    lines.push(Line::from(format!("Nom: {}", user.name)));
                    lines.push(Line::from(format!("Email: {}", user.email)));
                    if let Some(role) = &user.role {
                        lines.push(Line::from(format!("Rôle: {role}")));
                    }
                }
                None => lines.push(Line::from("Profil en cours de chargement…")),
            }
            lines.push(Line::from(""));
            lines.push(Line::from("l: se déconnecter"));
            let paragraph = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Mon compte"));
            frame.render_widget(paragraph, form_area);
            return;
        }

        let title = match self.auth.mode {
            AuthMode::Login => "Connexion",
            AuthMode::Register => "Créer un compte",
        };
        let mut lines: Vec<Line> = self
            .auth
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let value = match field {
                    AuthField::Password => "•".repeat(self.auth.password.chars().count()),
                    _ => self.auth.field(*field).to_string(),
                };
                form_line(&self.theme, field.label(), &value, idx == self.auth_focus)
            })
            .collect();
        lines.push(Line::from(""));
        if self.auth.is_pending() {
            lines.push(Line::from(Span::styled(
                "Connexion en cours…",
                Style::default().fg(self.theme.muted),
            )));
        } else if let Some(error) = self.auth.error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(self.theme.danger),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, form_area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Statut");
        let account = match self.auth.user() {
            Some(user) => user.name.clone(),
            None if self.session.is_authenticated() => "connecté".to_string(),
            None => "invité".to_string(),
        };
        let secondary = format!(
            "Panier: {} · Compte: {account} · {}",
            cart_quantity(&self.cart_entries),
            self.screen.help()
        );
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    news: ListCursor,
    events: ListCursor,
    equipment: ListCursor,
    cart: ListCursor,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Bienvenue".to_string(),
            should_quit: false,
            menu_cursor: 0,
            news: ListCursor::default(),
            events: ListCursor::default(),
            equipment: ListCursor::default(),
            cart: ListCursor::default(),
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

/// Selection and scroll position of one list.
#[derive(Debug, Clone, Copy)]
struct ListCursor {
    cursor: usize,
    offset: usize,
    height: usize,
}

impl Default for ListCursor {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            height: 1,
        }
    }
}

impl ListCursor {
    fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_by(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.reset();
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, total as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(total);
    }

    fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.reset();
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
        self.ensure_visible(total);
    }

    fn ensure_visible(&mut self, total: usize) {
        if total == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        let max_offset = total.saturating_sub(self.height);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

fn render_cursor_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    cursor: &mut ListCursor,
    rows: Vec<Line<'static>>,
) {
    cursor.height = area.height.saturating_sub(2).max(1) as usize;
    cursor.clamp(rows.len());

    let mut list_state = ListState::default();
    let items: Vec<ListItem> = rows
        .into_iter()
        .enumerate()
        .skip(cursor.offset)
        .take(cursor.height)
        .map(|(idx, row)| {
            let marker = if idx == cursor.cursor {
                Span::styled(
                    "▶ ",
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw("  ")
            };
            let mut spans = vec![marker];
            spans.extend(row.spans);
            ListItem::new(Line::from(spans))
        })
        .collect();
    if !items.is_empty() {
        list_state.select(Some(cursor.cursor.saturating_sub(cursor.offset)));
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(Style::default().bg(theme.selection_bg));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn placeholder<'a, T>(theme: &Theme, state: &FetchState<T>, title: &str) -> Option<Paragraph<'a>> {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    match state {
        FetchState::Loading => Some(
            Paragraph::new(Span::styled("Chargement…", Style::default().fg(theme.muted)))
                .block(block),
        ),
        FetchState::Error(message) => Some(
            Paragraph::new(vec![
                Line::from(Span::styled(message.clone(), Style::default().fg(theme.danger))),
                Line::from("r: réessayer"),
            ])
            .block(block),
        ),
        FetchState::Success { .. } => None,
    }
}

fn form_line<'a>(theme: &Theme, label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    };
    let cursor = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:<14}"), label_style),
        Span::raw(format!("{value}{cursor}")),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn cart_quantity(entries: &[CartEntry]) -> u32 {
    entries
        .iter()
        .fold(0u32, |total, entry| total.saturating_add(entry.quantity))
}

fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "Gratuit".to_string()
    } else {
        format!("{price:.2} €")
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_scrolls_to_stay_visible() {
        let mut cursor = ListCursor {
            height: 3,
            ..ListCursor::default()
        };
        cursor.move_by(4, 10);
        assert_eq!((cursor.cursor, cursor.offset), (4, 2));
        cursor.move_by(-4, 10);
        assert_eq!((cursor.cursor, cursor.offset), (0, 0));
        cursor.move_by(50, 10);
        assert_eq!((cursor.cursor, cursor.offset), (9, 7));
        cursor.clamp(2);
        assert_eq!((cursor.cursor, cursor.offset), (1, 0));
        cursor.clamp(0);
        assert_eq!(cursor.cursor, 0);
    }

    #[test]
    fn prices_are_formatted_in_euros() {
        assert_eq!(format_price(0.0), "Gratuit");
        assert_eq!(format_price(10.0), "10.00 €");
        assert_eq!(format_price(149.5), "149.50 €");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(40, 40, area), area);
    }
}
