//! Application state management for GameShelf.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, fetched data, the session store, and background task coordination.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use gameshelf_core::api::{is_unauthorized, user_message};
use gameshelf_core::auth::SessionStorage;
use gameshelf_core::catalog::{
    admin_filter_games, all_categories, filter_games, filter_users, review_eligibility,
    ReviewEligibility,
};
use gameshelf_core::forms::LoginForm;
use gameshelf_core::models::{Game, GameUpdate, LoginResponse, User, UserDashboard};
use gameshelf_core::{ApiClient, Config, Identity, SessionStore};

use crate::form::{FormKind, FormOverlay};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Shown on the login overlay when the server rejects the stored token
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Games,
    Dashboard,
    Users,
    ManageGames,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Games, Tab::Dashboard, Tab::Users, Tab::ManageGames];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Games => "Games",
            Tab::Dashboard => "Dashboard",
            Tab::Users => "Users",
            Tab::ManageGames => "Manage Games",
        }
    }

    pub fn requires_login(&self) -> bool {
        !matches!(self, Tab::Games)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Tab::Users | Tab::ManageGames)
    }

    pub fn is_available(&self, authenticated: bool, admin: bool) -> bool {
        (!self.requires_login() || authenticated) && (!self.requires_admin() || admin)
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Next available tab (wrapping around)
    pub fn next(&self, authenticated: bool, admin: bool) -> Self {
        self.step(1, authenticated, admin)
    }

    /// Previous available tab (wrapping around)
    pub fn prev(&self, authenticated: bool, admin: bool) -> Self {
        self.step(Self::ALL.len() - 1, authenticated, admin)
    }

    fn step(&self, by: usize, authenticated: bool, admin: bool) -> Self {
        let mut index = self.index();
        for _ in 0..Self::ALL.len() {
            index = (index + by) % Self::ALL.len();
            let tab = Self::ALL[index];
            if tab.is_available(authenticated, admin) {
                return tab;
            }
        }
        Tab::Games
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
    Register,
}

/// Record awaiting delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    User { id: String, name: String },
    Game { id: String, name: String },
}

impl DeleteTarget {
    pub fn description(&self) -> String {
        match self {
            DeleteTarget::User { name, .. } => format!("user \"{}\"", name),
            DeleteTarget::Game { name, .. } => format!("game \"{}\"", name),
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background tasks.
///
/// Sent through an MPSC channel from spawned tasks back to the main
/// application and drained once per UI tick. Session-bound results carry the
/// session generation that requested them and are dropped once it changes.
enum RefreshResult {
    /// Catalog fetched
    Games { generation: u64, games: Vec<Game> },
    /// Signed-in user's dashboard fetched
    Dashboard {
        generation: u64,
        dashboard: UserDashboard,
    },
    /// All accounts (admin)
    Users { generation: u64, users: Vec<User> },
    LoginSucceeded {
        email: String,
        response: LoginResponse,
    },
    LoginFailed(String),
    /// The server rejected the token
    Unauthorized { generation: u64 },
    /// Signal that all refresh tasks have completed
    RefreshComplete,
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionStore<Box<dyn SessionStorage>>,
    pub api: ApiClient,
    /// Where config changes are written; `None` keeps them in memory
    config_file: Option<PathBuf>,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub category_filter: Option<String>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,

    // Dialogs
    pub form: Option<FormOverlay>,
    pub pending_delete: Option<DeleteTarget>,

    // Selection indices
    pub games_selection: usize,
    pub review_selection: usize,
    pub dashboard_selection: usize,
    pub users_selection: usize,
    pub manage_selection: usize,

    // Fetched data
    pub games: Vec<Game>,
    /// Full record of the game open in the detail panel
    pub game_detail: Option<Game>,
    pub dashboard: Option<UserDashboard>,
    pub users: Vec<User>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    pub refreshing: bool,
    /// Bumped on every login and logout
    session_generation: u64,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance, restoring any persisted session
    pub fn new(config: Config, storage: Box<dyn SessionStorage>) -> Result<Self> {
        let config_file = match Config::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "No config directory, settings will not be saved");
                None
            }
        };
        Self::with_config_file(config, storage, config_file)
    }

    pub(crate) fn with_config_file(
        config: Config,
        storage: Box<dyn SessionStorage>,
        config_file: Option<PathBuf>,
    ) -> Result<Self> {
        let session = SessionStore::open(storage);
        let mut api = ApiClient::new(&config.api_base_url())?;
        debug!(base_url = api.base_url(), status = %session.status(), "App starting");

        if let Some(token) = session.token() {
            api.set_token(token);
            debug!("Token set on API client");
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.default_email().unwrap_or_default();
        let login_password = Config::env_password().unwrap_or_default();

        Ok(Self {
            config,
            session,
            api,
            config_file,

            state: AppState::Normal,
            current_tab: Tab::Games,
            focus: Focus::List,
            search_query: String::new(),
            category_filter: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,

            form: None,
            pending_delete: None,

            games_selection: 0,
            review_selection: 0,
            dashboard_selection: 0,
            users_selection: 0,
            manage_selection: 0,

            games: Vec::new(),
            game_detail: None,
            dashboard: None,
            users: Vec::new(),

            refresh_rx: rx,
            refresh_tx: tx,
            refreshing: false,
            session_generation: 0,

            status_message: None,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.session.clear_error();
    }

    /// Called whenever a login field changes
    pub fn on_login_edit(&mut self) {
        self.session.clear_error();
    }

    /// Validate the login form and authenticate in the background
    pub fn attempt_login(&mut self) {
        if self.session.is_loading() {
            return;
        }

        let form = LoginForm {
            email: self.login_email.clone(),
            password: self.login_password.clone(),
        };
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.session.fail_login(e.to_string());
                return;
            }
        };

        self.session.begin_login();
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let result = match api.login(&request).await {
                Ok(response) => RefreshResult::LoginSucceeded {
                    email: request.email,
                    response,
                },
                Err(e) => {
                    warn!(error = %e, "Login failed");
                    RefreshResult::LoginFailed(user_message(&e))
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    fn complete_login(&mut self, email: String, response: LoginResponse) {
        let (identity, token) = match response.into_parts() {
            Ok(parts) => parts,
            Err(e) => {
                warn!(error = %e, "Login response rejected");
                self.session.fail_login(e.user_message());
                return;
            }
        };
        self.api.set_token(&token);
        self.session.login(identity, token);
        self.session_generation += 1;

        self.config.last_email = Some(email);
        self.save_config();

        self.login_password.clear();
        self.state = AppState::Normal;
        self.status_message = self
            .identity()
            .map(|i| format!("Welcome back, {}!", i.name));
        info!("Login successful");
        self.refresh_all_background();
    }

    /// Log out and drop everything fetched on the user's behalf
    pub fn logout(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        self.session.logout();
        self.api.clear_token();
        self.session_generation += 1;
        self.clear_private_data();
        self.status_message = Some("Logged out".to_string());
        self.refresh_all_background();
    }

    /// The server rejected our token: drop the session and ask to log in again
    fn handle_unauthorized(&mut self) {
        warn!("Token rejected by server, ending session");
        self.api.clear_token();
        self.session_generation += 1;
        self.clear_private_data();
        self.form = None;
        self.pending_delete = None;
        self.start_login();
        self.session.fail_login(SESSION_EXPIRED_MESSAGE);
    }

    fn clear_private_data(&mut self) {
        self.dashboard = None;
        self.users.clear();
        if self.current_tab.requires_login() {
            self.current_tab = Tab::Games;
            self.focus = Focus::List;
        }
    }

    /// Route an API failure to the right place
    fn handle_api_error(&mut self, e: anyhow::Error, action: &str) {
        if is_unauthorized(&e) && self.is_authenticated() {
            self.handle_unauthorized();
            return;
        }
        error!(error = %e, action = action, "Request failed");
        let message = user_message(&e);
        match self.form.as_mut() {
            Some(form) => form.error = Some(message),
            None => self.status_message = Some(format!("{}: {}", action, message)),
        }
    }

    fn save_config(&self) {
        if let Some(ref path) = self.config_file {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to refresh everything the user can see
    pub fn refresh_all_background(&mut self) {
        info!("Starting background refresh");
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        let authenticated = self.is_authenticated();
        let admin = self.is_admin();
        let generation = self.session_generation;

        tokio::spawn(async move {
            Self::execute_background_refresh(tx, api, generation, authenticated, admin).await;
        });

        self.refreshing = true;
        self.status_message = Some("Refreshing data...".to_string());
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    async fn send_failure(
        tx: &mpsc::Sender<RefreshResult>,
        generation: u64,
        e: anyhow::Error,
        what: &str,
    ) {
        let result = if is_unauthorized(&e) {
            RefreshResult::Unauthorized { generation }
        } else {
            warn!(error = %e, what = what, "Background fetch failed");
            RefreshResult::Error(format!("Failed to load {}: {}", what, user_message(&e)))
        };
        Self::send_result(tx, result).await;
    }

    /// Fetch the catalog, and the dashboard and user list when allowed.
    async fn execute_background_refresh(
        tx: mpsc::Sender<RefreshResult>,
        api: ApiClient,
        generation: u64,
        authenticated: bool,
        admin: bool,
    ) {
        let games = async {
            // The detailed listing carries play time; it needs a token
            if authenticated {
                api.fetch_detailed_games().await
            } else {
                api.fetch_games().await
            }
        };
        let dashboard = async {
            if authenticated {
                Some(api.fetch_dashboard().await)
            } else {
                None
            }
        };
        let users = async {
            if admin {
                Some(api.fetch_users().await)
            } else {
                None
            }
        };

        let (games, dashboard, users) = futures::join!(games, dashboard, users);

        match games {
            Ok(games) => {
                Self::send_result(&tx, RefreshResult::Games { generation, games }).await
            }
            Err(e) => Self::send_failure(&tx, generation, e, "games").await,
        }
        match dashboard {
            Some(Ok(dashboard)) => {
                let result = RefreshResult::Dashboard {
                    generation,
                    dashboard,
                };
                Self::send_result(&tx, result).await
            }
            Some(Err(e)) => Self::send_failure(&tx, generation, e, "dashboard").await,
            None => {}
        }
        match users {
            Some(Ok(users)) => {
                Self::send_result(&tx, RefreshResult::Users { generation, users }).await
            }
            Some(Err(e)) => Self::send_failure(&tx, generation, e, "users").await,
            None => {}
        }

        Self::send_result(&tx, RefreshResult::RefreshComplete).await;
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Games { generation, games } => {
                // Detailed listings carry the requesting user's play time
                if generation != self.session_generation {
                    debug!("Dropping games fetched for an earlier session");
                    return;
                }
                debug!(count = games.len(), "Games refreshed");
                self.games = games;
                self.clamp_selections();
            }
            RefreshResult::Dashboard {
                generation,
                dashboard,
            } => {
                if generation == self.session_generation && self.is_authenticated() {
                    self.dashboard = Some(dashboard);
                } else {
                    debug!("Dropping dashboard fetched for an earlier session");
                }
            }
            RefreshResult::Users { generation, users } => {
                if generation == self.session_generation && self.is_admin() {
                    self.users = users;
                    self.clamp_selections();
                } else {
                    debug!("Dropping user list fetched for an earlier session");
                }
            }
            RefreshResult::LoginSucceeded { email, response } => {
                self.complete_login(email, response);
            }
            RefreshResult::LoginFailed(message) => {
                self.session.fail_login(message);
            }
            RefreshResult::Unauthorized { generation } => {
                // Only the token that was rejected may end the session
                if generation == self.session_generation && self.is_authenticated() {
                    self.handle_unauthorized();
                }
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                if self.status_message.as_deref() == Some("Refreshing data...") {
                    self.status_message = None;
                }
            }
            RefreshResult::Error(message) => {
                self.status_message = Some(message);
            }
        }
    }

    fn clamp_selections(&mut self) {
        let games = self.visible_games().len();
        let admin_games = self.visible_admin_games().len();
        let users = self.visible_users().len();
        self.games_selection = self.games_selection.min(games.saturating_sub(1));
        self.manage_selection = self.manage_selection.min(admin_games.saturating_sub(1));
        self.users_selection = self.users_selection.min(users.saturating_sub(1));
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub fn visible_games(&self) -> Vec<&Game> {
        filter_games(&self.games, &self.search_query, self.category_filter.as_deref())
    }

    pub fn visible_admin_games(&self) -> Vec<&Game> {
        admin_filter_games(&self.games, &self.search_query)
    }

    pub fn visible_users(&self) -> Vec<&User> {
        filter_users(&self.users, &self.search_query)
    }

    pub fn selected_game(&self) -> Option<&Game> {
        let listed = self.visible_games().get(self.games_selection).copied()?;
        match self.game_detail {
            Some(ref detail) if detail.id == listed.id => Some(detail),
            _ => Some(listed),
        }
    }

    pub fn selected_admin_game(&self) -> Option<&Game> {
        self.visible_admin_games().get(self.manage_selection).copied()
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.visible_users().get(self.users_selection).copied()
    }

    /// Step the category filter through "all" and each known category
    pub fn cycle_category(&mut self) {
        let categories = all_categories(&self.games);
        self.category_filter = match self.category_filter.take() {
            None => categories.first().cloned(),
            Some(current) => categories
                .iter()
                .position(|c| *c == current)
                .and_then(|i| categories.get(i + 1))
                .cloned(),
        };
        self.games_selection = 0;
    }

    /// Minutes the signed-in user has logged on `game`
    pub fn play_minutes(game: &Game) -> u32 {
        game.current_user_play_time.unwrap_or(0)
    }

    pub fn review_eligibility(&self, game: &Game) -> ReviewEligibility {
        review_eligibility(game, self.identity(), Self::play_minutes(game))
    }

    /// Load the full record for the selected game
    pub async fn fetch_game_detail(&mut self) {
        let Some(id) = self.selected_game().map(|g| g.id.clone()) else {
            return;
        };
        match self.api.fetch_game(&id).await {
            Ok(game) => {
                self.review_selection = 0;
                self.game_detail = Some(game);
            }
            Err(e) => self.handle_api_error(e, "Failed to load game"),
        }
    }

    fn replace_game(&mut self, game: Game) {
        if let Some(existing) = self.games.iter_mut().find(|g| g.id == game.id) {
            // Per-user fields are only present on the detailed listing
            let play_time = existing.current_user_play_time;
            *existing = game.clone();
            if existing.current_user_play_time.is_none() {
                existing.current_user_play_time = play_time;
            }
        }
        if self.game_detail.as_ref().is_some_and(|d| d.id == game.id) {
            self.game_detail = Some(game);
        }
    }

    fn record_play_time(&mut self, game_id: &str, total: u32) {
        for game in self.games.iter_mut().chain(self.game_detail.as_mut()) {
            if game.id == game_id {
                game.current_user_play_time = Some(total);
            }
        }
    }

    // =========================================================================
    // Dialogs
    // =========================================================================

    fn open_form(&mut self, form: FormOverlay) {
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub fn open_register_form(&mut self) {
        let form = FormOverlay::register(self.login_email.trim());
        self.session.clear_error();
        self.open_form(form);
    }

    /// Require a session before an action; opens the login overlay if missing
    fn require_login(&mut self, reason: &str) -> bool {
        if self.is_authenticated() {
            return true;
        }
        self.status_message = Some(reason.to_string());
        self.start_login();
        false
    }

    pub fn open_play_form(&mut self) {
        if !self.require_login("Log in to record play time") {
            return;
        }
        if let Some(form) = self.selected_game().map(FormOverlay::play) {
            self.open_form(form);
        }
    }

    pub fn open_review_form(&mut self) {
        let Some(game) = self.selected_game() else {
            return;
        };
        match self.review_eligibility(game) {
            ReviewEligibility::Eligible => {
                let form = FormOverlay::review(game);
                self.open_form(form);
            }
            ReviewEligibility::SignInRequired => {
                self.require_login("Log in to leave a review");
            }
            other => {
                self.status_message = other.message();
            }
        }
    }

    pub fn open_profile_form(&mut self) {
        if let Some(form) = self.identity().map(FormOverlay::profile) {
            self.open_form(form);
        }
    }

    pub fn open_user_edit_form(&mut self) {
        if let Some(form) = self.selected_user().map(FormOverlay::user_edit) {
            self.open_form(form);
        }
    }

    pub fn open_game_editor(&mut self, new_game: bool) {
        let form = if new_game {
            FormOverlay::game_editor(None)
        } else {
            match self.selected_admin_game() {
                Some(game) => FormOverlay::game_editor(Some(game)),
                None => return,
            }
        };
        self.open_form(form);
    }

    pub fn request_delete(&mut self) {
        let target = match self.current_tab {
            Tab::Users => self.selected_user().map(|u| DeleteTarget::User {
                id: u.id.clone(),
                name: u.name.clone(),
            }),
            Tab::ManageGames => self.selected_admin_game().map(|g| DeleteTarget::Game {
                id: g.id.clone(),
                name: g.name.clone(),
            }),
            _ => None,
        };
        if let Some(target) = target {
            if let DeleteTarget::User { ref id, .. } = target {
                if self.identity().is_some_and(|i| &i.id == id) {
                    self.status_message = Some("You cannot delete your own account".to_string());
                    return;
                }
            }
            self.pending_delete = Some(target);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub async fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(target) = self.pending_delete.take() else {
            return;
        };
        let result = match target {
            DeleteTarget::User { ref id, .. } => self.api.delete_user(id).await,
            DeleteTarget::Game { ref id, .. } => self.api.delete_game(id).await,
        };
        match result {
            Ok(message) => {
                match target {
                    DeleteTarget::User { ref id, .. } => self.users.retain(|u| &u.id != id),
                    DeleteTarget::Game { ref id, .. } => self.games.retain(|g| &g.id != id),
                }
                self.clamp_selections();
                info!(target = %target.description(), "Deleted");
                self.status_message = Some(if message.is_empty() {
                    format!("Deleted {}", target.description())
                } else {
                    message
                });
            }
            Err(e) => self.handle_api_error(e, "Delete failed"),
        }
    }

    pub async fn toggle_game_flag(&mut self, rating: bool) {
        let Some(game) = self.selected_admin_game() else {
            return;
        };
        let update = if rating {
            GameUpdate::toggle_rating(game)
        } else {
            GameUpdate::toggle_commenting(game)
        };
        let id = game.id.clone();
        match self.api.update_game(&id, &update).await {
            Ok(game) => {
                let what = if rating { "Ratings" } else { "Comments" };
                let enabled = if rating {
                    !game.disable_rating
                } else {
                    !game.disable_commenting
                };
                self.status_message = Some(format!(
                    "{} {} for {}",
                    what,
                    if enabled { "enabled" } else { "disabled" },
                    game.name
                ));
                self.replace_game(game);
            }
            Err(e) => self.handle_api_error(e, "Update failed"),
        }
    }

    /// Validate and submit the open form
    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let outcome = match form.kind {
            FormKind::Register => self.submit_register(&form).await,
            FormKind::Review { ref game_id } => self.submit_review(&form, game_id).await,
            FormKind::Play { ref game_id } => self.submit_play(&form, game_id).await,
            FormKind::Profile => self.submit_profile(&form).await,
            FormKind::UserEdit { ref user_id } => self.submit_user_edit(&form, user_id).await,
            FormKind::GameEditor { ref game_id } => {
                self.submit_game(&form, game_id.as_deref()).await
            }
        };
        match outcome {
            Ok(Some(next_state)) => {
                self.form = None;
                self.state = next_state;
            }
            // Handled elsewhere (e.g. session expired)
            Ok(None) => {}
            Err(message) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(message);
                }
            }
        }
    }

    /// Turn a request failure into a form error, or end the session on 401
    fn form_failure(&mut self, e: anyhow::Error) -> std::result::Result<Option<AppState>, String> {
        if is_unauthorized(&e) && self.is_authenticated() {
            self.handle_unauthorized();
            return Ok(None);
        }
        warn!(error = %e, "Form submission failed");
        Err(user_message(&e))
    }

    async fn submit_register(
        &mut self,
        form: &FormOverlay,
    ) -> std::result::Result<Option<AppState>, String> {
        let request = form.register_form().validate().map_err(|e| e.to_string())?;
        match self.api.register(&request).await {
            Ok(_) => {
                info!("Registration successful");
                self.login_email = request.email;
                self.login_password.clear();
                self.login_focus = LoginFocus::Password;
                self.status_message =
                    Some("Registration successful! Please log in.".to_string());
                Ok(Some(AppState::LoggingIn))
            }
            Err(e) => self.form_failure(e),
        }
    }

    async fn submit_review(
        &mut self,
        form: &FormOverlay,
        game_id: &str,
    ) -> std::result::Result<Option<AppState>, String> {
        let request = form.review_form().validate().map_err(|e| e.to_string())?;
        match self.api.review_game(game_id, &request).await {
            Ok(_) => {
                self.status_message = Some("Review submitted successfully!".to_string());
                // Re-fetch so the new review and rating show up
                match self.api.fetch_game(game_id).await {
                    Ok(game) => self.replace_game(game),
                    Err(e) => warn!(error = %e, "Failed to reload game after review"),
                }
                Ok(Some(AppState::Normal))
            }
            Err(e) => self.form_failure(e),
        }
    }

    async fn submit_play(
        &mut self,
        form: &FormOverlay,
        game_id: &str,
    ) -> std::result::Result<Option<AppState>, String> {
        let request = form.play_form().validate().map_err(|e| e.to_string())?;
        match self.api.play_game(game_id, &request).await {
            Ok(response) => {
                let name = self
                    .games
                    .iter()
                    .find(|g| g.id == game_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                let total = match response.play_time {
                    Some(total) => total,
                    None => {
                        let previous = self
                            .games
                            .iter()
                            .find(|g| g.id == game_id)
                            .map(Self::play_minutes)
                            .unwrap_or(0);
                        previous + request.time
                    }
                };
                self.record_play_time(game_id, total);
                self.status_message = Some(response.message.unwrap_or_else(|| {
                    format!("You played {} for {} minutes!", name, request.time)
                }));
                Ok(Some(AppState::Normal))
            }
            Err(e) => self.form_failure(e),
        }
    }

    async fn submit_profile(
        &mut self,
        form: &FormOverlay,
    ) -> std::result::Result<Option<AppState>, String> {
        let update = form.profile_form().validate().map_err(|e| e.to_string())?;
        match self.api.update_profile(&update).await {
            Ok(user) => {
                if let Some(mut identity) = self.identity().cloned() {
                    if !user.name.is_empty() {
                        identity.name = user.name;
                    }
                    if !user.email.is_empty() {
                        identity.email = user.email;
                    }
                    self.session.update_identity(identity);
                }
                self.status_message = Some("Profile updated successfully".to_string());
                self.refresh_all_background();
                Ok(Some(AppState::Normal))
            }
            Err(e) => self.form_failure(e),
        }
    }

    async fn submit_user_edit(
        &mut self,
        form: &FormOverlay,
        user_id: &str,
    ) -> std::result::Result<Option<AppState>, String> {
        let update = form.user_edit_form().validate().map_err(|e| e.to_string())?;
        match self.api.update_user(user_id, &update).await {
            Ok(user) => {
                if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
                    *existing = user;
                }
                self.status_message = Some("User updated successfully".to_string());
                Ok(Some(AppState::Normal))
            }
            Err(e) => self.form_failure(e),
        }
    }

    async fn submit_game(
        &mut self,
        form: &FormOverlay,
        game_id: Option<&str>,
    ) -> std::result::Result<Option<AppState>, String> {
        let data = form.game_form().validate().map_err(|e| e.to_string())?;
        let result = match game_id {
            Some(id) => self
                .api
                .update_game(id, &GameUpdate::from(data))
                .await
                .map(|game| {
                    let name = game.name.clone();
                    self.replace_game(game);
                    format!("Updated {}", name)
                }),
            None => self
                .api
                .create_game(&data)
                .await
                .map(|created| format!("Created {}", created.name)),
        };
        match result {
            Ok(message) => {
                self.status_message = Some(message);
                if game_id.is_none() {
                    self.refresh_all_background();
                }
                Ok(Some(AppState::Normal))
            }
            Err(e) => self.form_failure(e),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Switch tabs, prompting for login or refusing when not allowed
    pub fn select_tab(&mut self, tab: Tab) {
        if tab.requires_login() && !self.is_authenticated() {
            self.require_login("Log in to view your dashboard");
            return;
        }
        if tab.requires_admin() && !self.is_admin() {
            self.status_message = Some("Admin access required".to_string());
            return;
        }
        if tab != self.current_tab {
            self.search_query.clear();
        }
        self.current_tab = tab;
        self.focus = Focus::List;
    }

    pub fn next_tab(&mut self) {
        let tab = self.current_tab.next(self.is_authenticated(), self.is_admin());
        self.select_tab(tab);
    }

    pub fn prev_tab(&mut self) {
        let tab = self.current_tab.prev(self.is_authenticated(), self.is_admin());
        self.select_tab(tab);
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gameshelf_core::auth::{MemoryStorage, TOKEN_KEY, USER_KEY};
    use gameshelf_core::SessionStatus;

    fn app_with(storage: MemoryStorage) -> App {
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9/api".to_string()),
            ..Default::default()
        };
        App::with_config_file(config, Box::new(storage), None).unwrap()
    }

    fn signed_in_storage(is_admin: bool) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        let identity = Identity::new("u1", "Ann", "ann@example.com", is_admin);
        storage
            .set(USER_KEY, &serde_json::to_string(&identity).unwrap())
            .unwrap();
        storage.set(TOKEN_KEY, "tok-1").unwrap();
        storage
    }

    fn games() -> Vec<Game> {
        serde_json::from_value(serde_json::json!([
            {"_id": "g1", "name": "Celeste", "brand": "EXOK", "category": ["Platformer"], "currentUserPlayTime": 90},
            {"_id": "g2", "name": "Hades", "brand": "Supergiant", "category": ["Roguelike"]},
            {"_id": "g3", "name": "Dead Cells", "brand": "Motion Twin", "category": ["Roguelike"]}
        ]))
        .unwrap()
    }

    fn login_response() -> LoginResponse {
        serde_json::from_value(serde_json::json!({
            "_id": "u1", "name": "Ann", "email": "ann@example.com", "isAdmin": false, "token": "tok-9"
        }))
        .unwrap()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_cycle_anonymous() {
        assert_eq!(Tab::Games.next(false, false), Tab::Games);
        assert_eq!(Tab::Games.prev(false, false), Tab::Games);
    }

    #[test]
    fn test_tab_cycle_user() {
        assert_eq!(Tab::Games.next(true, false), Tab::Dashboard);
        assert_eq!(Tab::Dashboard.next(true, false), Tab::Games);
        assert_eq!(Tab::Games.prev(true, false), Tab::Dashboard);
    }

    #[test]
    fn test_tab_cycle_admin() {
        assert_eq!(Tab::Dashboard.next(true, true), Tab::Users);
        assert_eq!(Tab::Users.next(true, true), Tab::ManageGames);
        assert_eq!(Tab::ManageGames.next(true, true), Tab::Games);
        assert_eq!(Tab::Games.prev(true, true), Tab::ManageGames);
    }

    // -------------------------------------------------------------------------
    // Session Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_restored_session_sets_token() {
        let app = app_with(signed_in_storage(false));
        assert!(app.is_authenticated());
        assert!(app.api.has_token());
    }

    #[test]
    fn test_select_tab_requires_login() {
        let mut app = app_with(MemoryStorage::new());
        app.select_tab(Tab::Dashboard);
        assert_eq!(app.current_tab, Tab::Games);
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_select_tab_requires_admin() {
        let mut app = app_with(signed_in_storage(false));
        app.select_tab(Tab::Users);
        assert_eq!(app.current_tab, Tab::Games);
        assert_eq!(app.status_message.as_deref(), Some("Admin access required"));
    }

    #[test]
    fn test_login_validation_error_is_shown() {
        let mut app = app_with(MemoryStorage::new());
        app.login_email.clear();
        app.attempt_login();
        assert_eq!(app.session.status(), SessionStatus::AuthenticationFailed);
        assert_eq!(app.session.error(), Some("Email and password are required"));

        app.on_login_edit();
        assert_eq!(app.session.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_login_success_result() {
        let mut app = app_with(MemoryStorage::new());
        app.start_login();
        app.login_password = "pw".to_string();
        app.process_refresh_result(RefreshResult::LoginSucceeded {
            email: "ann@example.com".to_string(),
            response: login_response(),
        });

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.session.token(), Some("tok-9"));
        assert!(app.api.has_token());
        assert!(app.login_password.is_empty());
        assert_eq!(app.config.last_email.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_login_failure_result() {
        let mut app = app_with(MemoryStorage::new());
        app.start_login();
        app.session.begin_login();
        app.process_refresh_result(RefreshResult::LoginFailed(
            "Invalid email or password".to_string(),
        ));
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.session.error(), Some("Invalid email or password"));
        assert!(!app.session.is_loading());
    }

    #[tokio::test]
    async fn test_logout_clears_private_data() {
        let mut app = app_with(signed_in_storage(true));
        app.current_tab = Tab::Users;
        app.users = vec![serde_json::from_str(
            r#"{"_id": "u2", "name": "Bo", "email": "bo@example.com"}"#,
        )
        .unwrap()];

        app.logout();
        assert!(!app.is_authenticated());
        assert!(!app.api.has_token());
        assert!(app.users.is_empty());
        assert_eq!(app.current_tab, Tab::Games);
    }

    #[test]
    fn test_unauthorized_result_opens_login() {
        let mut app = app_with(signed_in_storage(false));
        app.current_tab = Tab::Dashboard;
        app.process_refresh_result(RefreshResult::Unauthorized { generation: 0 });

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
        assert!(!app.api.has_token());
        assert_eq!(app.session.error(), Some(SESSION_EXPIRED_MESSAGE));
        assert_eq!(app.current_tab, Tab::Games);
    }

    #[test]
    fn test_late_dashboard_after_logout_is_dropped() {
        let mut app = app_with(MemoryStorage::new());
        let dashboard: UserDashboard = serde_json::from_str(
            r#"{"user": {"_id": "u1", "name": "Ann", "email": "ann@example.com"}}"#,
        )
        .unwrap();
        app.process_refresh_result(RefreshResult::Dashboard {
            generation: 0,
            dashboard,
        });
        assert!(app.dashboard.is_none());
    }

    #[tokio::test]
    async fn test_results_from_previous_session_are_dropped() {
        let mut app = app_with(signed_in_storage(true));
        let ann_generation = app.session_generation;

        app.logout();
        app.start_login();
        app.process_refresh_result(RefreshResult::LoginSucceeded {
            email: "bo@example.com".to_string(),
            response: serde_json::from_value(serde_json::json!({
                "_id": "u2", "name": "Bo", "email": "bo@example.com", "isAdmin": true, "token": "tok-bo"
            }))
            .unwrap(),
        });
        assert_eq!(app.identity().map(|i| i.name.as_str()), Some("Bo"));

        let ann_dashboard: UserDashboard = serde_json::from_str(
            r#"{"user": {"_id": "u1", "name": "Ann", "email": "ann@example.com"}}"#,
        )
        .unwrap();
        app.process_refresh_result(RefreshResult::Dashboard {
            generation: ann_generation,
            dashboard: ann_dashboard,
        });
        app.process_refresh_result(RefreshResult::Users {
            generation: ann_generation,
            users: vec![serde_json::from_str(
                r#"{"_id": "u3", "name": "Cy", "email": "cy@example.com"}"#,
            )
            .unwrap()],
        });
        app.process_refresh_result(RefreshResult::Unauthorized {
            generation: ann_generation,
        });

        assert!(app.dashboard.is_none());
        assert!(app.users.is_empty());
        assert!(app.is_authenticated());
        assert_eq!(app.session.token(), Some("tok-bo"));
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_current_session_results_are_applied() {
        let mut app = app_with(signed_in_storage(true));
        let generation = app.session_generation;
        app.process_refresh_result(RefreshResult::Users {
            generation,
            users: vec![serde_json::from_str(
                r#"{"_id": "u3", "name": "Cy", "email": "cy@example.com"}"#,
            )
            .unwrap()],
        });
        assert_eq!(app.users.len(), 1);
    }

    #[test]
    fn test_login_response_without_token_fails_login() {
        let mut app = app_with(MemoryStorage::new());
        app.start_login();
        app.session.begin_login();
        app.process_refresh_result(RefreshResult::LoginSucceeded {
            email: "ann@example.com".to_string(),
            response: serde_json::from_value(serde_json::json!({
                "_id": "u1", "name": "Ann", "email": "ann@example.com", "token": ""
            }))
            .unwrap(),
        });

        assert_eq!(app.session.status(), SessionStatus::AuthenticationFailed);
        assert_eq!(
            app.session.error(),
            Some("Received an unexpected response format from the server.")
        );
        assert!(!app.api.has_token());
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.config.last_email.is_none());
    }

    // -------------------------------------------------------------------------
    // Catalog Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_visible_games_and_category_cycle() {
        let mut app = app_with(MemoryStorage::new());
        app.process_refresh_result(RefreshResult::Games {
            generation: 0,
            games: games(),
        });
        assert_eq!(app.visible_games().len(), 3);

        app.cycle_category();
        assert_eq!(app.category_filter.as_deref(), Some("Platformer"));
        assert_eq!(app.visible_games().len(), 1);

        app.cycle_category();
        assert_eq!(app.category_filter.as_deref(), Some("Roguelike"));
        assert_eq!(app.visible_games().len(), 2);

        app.cycle_category();
        assert_eq!(app.category_filter, None);
    }

    #[test]
    fn test_open_review_form_checks_eligibility() {
        let mut app = app_with(signed_in_storage(false));
        app.games = games();

        // Hades has no play time yet
        app.games_selection = 1;
        app.open_review_form();
        assert!(app.form.is_none());
        assert!(app
            .status_message
            .as_deref()
            .unwrap_or_default()
            .contains("at least 1 hour"));

        app.games_selection = 0;
        app.open_review_form();
        assert_eq!(app.state, AppState::EditingForm);
    }

    #[test]
    fn test_record_play_time_updates_list_and_detail() {
        let mut app = app_with(signed_in_storage(false));
        app.games = games();
        app.game_detail = Some(app.games[1].clone());
        app.record_play_time("g2", 75);
        assert_eq!(app.games[1].current_user_play_time, Some(75));
        assert_eq!(app.game_detail.as_ref().unwrap().current_user_play_time, Some(75));
    }

    #[test]
    fn test_cannot_delete_self() {
        let mut app = app_with(signed_in_storage(true));
        app.current_tab = Tab::Users;
        app.users = vec![serde_json::from_str(
            r#"{"_id": "u1", "name": "Ann", "email": "ann@example.com", "isAdmin": true}"#,
        )
        .unwrap()];
        app.request_delete();
        assert!(app.pending_delete.is_none());
        assert_eq!(app.state, AppState::Normal);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(99, '@'));
        assert!(!can_add_email_char(100, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
