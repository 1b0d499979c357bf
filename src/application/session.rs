// Dashboard session - One actor per open dashboard, observed through snapshots
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::dashboard_repository::DashboardRepository;
use crate::application::providers::{
    ChatProvider, LocationSearchProvider, ProviderError, ReadingProvider,
};
use crate::application::refresh_controller::{DEFAULT_REFRESH_PERIOD, RefreshController};
use crate::application::search_controller::{
    SearchController, SearchEffect, SearchPhase, SearchTiming, SubmitAction,
};
use crate::application::session_registry::DEFAULT_IDLE_TIMEOUT;
use crate::domain::advisory::{Advisory, advise};
use crate::domain::aqi::AqiCategory;
use crate::domain::chat::{CHAT_APOLOGY, CHAT_GREETING, ChatMessage, chat_context};
use crate::domain::location::LocationCandidate;
use crate::domain::profile::{ActivityLevel, AgeGroup, HealthCondition, UserProfile};
use crate::domain::reading::{Location, Reading};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Failed to fetch air quality data.")]
    FetchFailed,
    #[error("Could not find location: \"{query}\". Please try another search term.")]
    LocationNotFound { query: String },
    #[error("Failed to search for location. Please check your network.")]
    SearchFailed,
    #[error("Geolocation failed. Showing default location.")]
    GeolocationUnavailable,
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::FetchFailed => "fetchFailed",
            SessionError::LocationNotFound { .. } => "locationNotFound",
            SessionError::SearchFailed => "searchFailed",
            SessionError::GeolocationUnavailable => "geolocationUnavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub kind: &'static str,
    pub message: String,
}

impl From<&SessionError> for ErrorBanner {
    fn from(err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SessionDeps {
    pub readings: Arc<dyn ReadingProvider>,
    pub geocoder: Arc<dyn LocationSearchProvider>,
    pub chat: Arc<dyn ChatProvider>,
    pub repository: Arc<dyn DashboardRepository>,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub search: SearchTiming,
    pub refresh_period: Duration,
    /// Shown when the client cannot supply a position.
    pub default_location: Location,
    /// Sessions untouched for this long are closed by the registry.
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            search: SearchTiming::default(),
            refresh_period: DEFAULT_REFRESH_PERIOD,
            default_location: Location::new("Los Angeles, CA", 34.0522, -118.2437),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    InputText(String),
    Blur,
    Submit,
    SelectSuggestion(usize),
    MapClick { lat: f64, lng: f64 },
    DismissError,
    ToggleCondition(HealthCondition),
    SetAgeGroup(AgeGroup),
    SetActivityLevel(ActivityLevel),
    AskChat(String),
}

#[derive(Debug)]
enum SessionEvent {
    DebounceElapsed(u64),
    SuggestionsLoaded {
        generation: u64,
        result: Result<Vec<LocationCandidate>, ProviderError>,
    },
    BlurGraceElapsed(u64),
    PlaceNamed {
        intent: u64,
        location: Location,
    },
    FallbackSearched {
        intent: u64,
        query: String,
        result: Result<Vec<LocationCandidate>, ProviderError>,
    },
    ReadingLoaded {
        generation: u64,
        result: Result<Reading, ProviderError>,
    },
    ChatReplied(Result<String, ProviderError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Foreground,
    /// Periodic refresh: no loading indicator, no banner reset.
    Silent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub version: u64,
    pub location: Option<Location>,
    pub search_text: String,
    pub search_phase: SearchPhase,
    pub suggestions: Vec<LocationCandidate>,
    pub reading: Option<Arc<Reading>>,
    pub category: Option<&'static AqiCategory>,
    pub advisory: Option<Advisory>,
    pub profile: UserProfile,
    pub loading: bool,
    pub fetch_in_flight: bool,
    pub error: Option<ErrorBanner>,
    pub chat: Vec<ChatMessage>,
    pub chat_pending: bool,
}

#[derive(Debug, Error)]
#[error("session {0} has ended")]
pub struct SessionClosed(pub Uuid);

/// Cheap, cloneable access to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    user_id: String,
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
    last_active: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    /// Start a session for `user_id`. `initial_position` is the client's
    /// geolocation fix, if it has one.
    pub async fn spawn(
        user_id: impl Into<String>,
        initial_position: Option<(f64, f64)>,
        deps: SessionDeps,
        settings: SessionSettings,
    ) -> Self {
        let user_id = user_id.into();
        let profile = match deps.repository.get_profile(&user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default(),
            Err(e) => {
                warn!("Failed to load profile for {}: {}", user_id, e);
                UserProfile::default()
            }
        };

        let id = Uuid::new_v4();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let state = SessionState {
            location: None,
            reading: None,
            search: SearchController::new(settings.search),
            profile,
            loading: true,
            fetch_generation: 0,
            fetch_in_flight: None,
            intent: 0,
            location_pending: false,
            error: None,
            chat: vec![ChatMessage::bot(CHAT_GREETING)],
            chat_pending: false,
        };
        let initial = state.snapshot(id, 0);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let actor = SessionActor {
            id,
            user_id: user_id.clone(),
            refresh: RefreshController::new(settings.refresh_period),
            settings,
            deps,
            state,
            version: 0,
            commands: commands_rx,
            events: events_rx,
            events_tx,
            snapshot_tx,
            cancel: cancel.clone(),
            debounce_task: None,
        };
        tokio::spawn(actor.run(initial_position));

        Self {
            id,
            user_id,
            commands: commands_tx,
            snapshots: snapshot_rx,
            cancel,
            last_active: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.touch();
        self.commands.send(command).map_err(|_| SessionClosed(self.id))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.touch();
        self.snapshots.clone()
    }

    /// Mark the session as in use by a client.
    pub fn touch(&self) {
        let mut last = self.last_active.lock().unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    /// Time since a client last sent a command, subscribed or looked the
    /// session up.
    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    /// Tear the session down: the refresh loop, timers and outstanding
    /// provider calls are all dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }
}

struct SessionState {
    location: Option<Location>,
    reading: Option<Arc<Reading>>,
    search: SearchController,
    profile: UserProfile,
    loading: bool,
    fetch_generation: u64,
    fetch_in_flight: Option<u64>,
    /// Bumped by every location change the user asks for; completions of
    /// superseded reverse geocodes and fallback searches are dropped.
    intent: u64,
    /// A reverse geocode or fallback search has not yet started its fetch.
    location_pending: bool,
    error: Option<SessionError>,
    chat: Vec<ChatMessage>,
    chat_pending: bool,
}

impl SessionState {
    fn snapshot(&self, session_id: Uuid, version: u64) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            version,
            location: self.location.clone(),
            search_text: self.search.text().to_string(),
            search_phase: self.search.phase(),
            suggestions: self.search.suggestions().to_vec(),
            reading: self.reading.clone(),
            category: self.reading.as_ref().map(|r| r.category()),
            advisory: self.reading.as_ref().map(|r| advise(r, &self.profile)),
            profile: self.profile.clone(),
            loading: self.loading,
            fetch_in_flight: self.fetch_in_flight.is_some(),
            error: self.error.as_ref().map(ErrorBanner::from),
            chat: self.chat.clone(),
            chat_pending: self.chat_pending,
        }
    }
}

/// Commands and completions of the session's own timers and provider calls
/// are applied one at a time, each one a discrete transition.
struct SessionActor {
    id: Uuid,
    user_id: String,
    settings: SessionSettings,
    deps: SessionDeps,
    state: SessionState,
    refresh: RefreshController,
    version: u64,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
    debounce_task: Option<JoinHandle<()>>,
}

impl SessionActor {
    async fn run(mut self, initial_position: Option<(f64, f64)>) {
        info!(session = %self.id, user = %self.user_id, "session started");
        self.start(initial_position);
        self.publish();

        let mut ticker = self.refresh.ticker();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.on_refresh_tick(),
                command = self.commands.recv() => match command {
                    None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
            }
            self.publish();
        }

        self.cancel.cancel();
        info!(
            session = %self.id,
            refreshes = self.refresh.fired(),
            skipped_ticks = self.refresh.skipped(),
            "session ended"
        );
    }

    fn publish(&mut self) {
        self.version += 1;
        self.snapshot_tx
            .send_replace(self.state.snapshot(self.id, self.version));
    }

    /// Run `work` off the actor and feed its outcome back as an event.
    /// Dropped without reporting once the session is cancelled.
    fn spawn_event<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = SessionEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                event = work => {
                    let _ = tx.send(event);
                }
            }
        })
    }

    fn start(&mut self, initial_position: Option<(f64, f64)>) {
        match initial_position {
            Some((lat, lng)) => self.locate(lat, lng),
            None => {
                let fallback = self.settings.default_location.clone();
                self.state.search.set_text_programmatic(fallback.name.clone());
                self.state.intent += 1;
                self.begin_fetch(fallback, FetchMode::Foreground);
                self.state.error = Some(SessionError::GeolocationUnavailable);
            }
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        debug!(session = %self.id, ?command, "command");
        match command {
            SessionCommand::InputText(text) => {
                let effect = self.state.search.user_input(text);
                self.cancel_debounce();
                if let Some(effect) = effect {
                    self.run_search_effect(effect);
                }
            }
            SessionCommand::Blur => {
                let effect = self.state.search.blur();
                self.run_search_effect(effect);
            }
            SessionCommand::Submit => self.submit(),
            SessionCommand::SelectSuggestion(index) => {
                if let Some(candidate) = self.state.search.select(index) {
                    self.cancel_debounce();
                    self.state.intent += 1;
                    self.begin_fetch(candidate.to_location(), FetchMode::Foreground);
                }
            }
            SessionCommand::MapClick { lat, lng } => self.locate(lat, lng),
            SessionCommand::DismissError => self.state.error = None,
            SessionCommand::ToggleCondition(condition) => {
                self.state.profile.health_conditions.toggle(condition);
                self.persist_profile().await;
            }
            SessionCommand::SetAgeGroup(age_group) => {
                self.state.profile.age_group = age_group;
                self.persist_profile().await;
            }
            SessionCommand::SetActivityLevel(level) => {
                self.state.profile.activity_level = level;
                self.persist_profile().await;
            }
            SessionCommand::AskChat(message) => self.ask_chat(message),
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DebounceElapsed(generation) => {
                if let Some(effect) = self.state.search.debounce_elapsed(generation) {
                    self.run_search_effect(effect);
                }
            }
            SessionEvent::SuggestionsLoaded { generation, result } => {
                self.state.search.lookup_completed(generation, result);
            }
            SessionEvent::BlurGraceElapsed(generation) => {
                self.state.search.blur_grace_elapsed(generation);
            }
            SessionEvent::PlaceNamed { intent, location } => {
                if intent != self.state.intent {
                    debug!(session = %self.id, "superseded reverse geocode ignored");
                    return;
                }
                self.state.search.set_text_programmatic(location.name.clone());
                self.begin_fetch(location, FetchMode::Foreground);
            }
            SessionEvent::FallbackSearched {
                intent,
                query,
                result,
            } => {
                if intent != self.state.intent {
                    debug!(session = %self.id, "superseded fallback search ignored");
                    return;
                }
                self.finish_fallback_search(query, result);
            }
            SessionEvent::ReadingLoaded { generation, result } => {
                self.finish_fetch(generation, result);
            }
            SessionEvent::ChatReplied(result) => {
                let reply = match result {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(session = %self.id, "Chat provider failed: {}", e);
                        CHAT_APOLOGY.to_string()
                    }
                };
                self.state.chat.push(ChatMessage::bot(reply));
                self.state.chat_pending = false;
            }
        }
    }

    fn run_search_effect(&mut self, effect: SearchEffect) {
        match effect {
            SearchEffect::ScheduleDebounce { generation, delay } => {
                self.cancel_debounce();
                self.debounce_task = Some(self.spawn_event(async move {
                    tokio::time::sleep(delay).await;
                    SessionEvent::DebounceElapsed(generation)
                }));
            }
            SearchEffect::Lookup {
                generation,
                query,
                limit,
            } => {
                let geocoder = self.deps.geocoder.clone();
                self.spawn_event(async move {
                    let result = geocoder.search(&query, limit).await;
                    SessionEvent::SuggestionsLoaded { generation, result }
                });
            }
            SearchEffect::ScheduleBlurClear { generation, delay } => {
                self.spawn_event(async move {
                    tokio::time::sleep(delay).await;
                    SessionEvent::BlurGraceElapsed(generation)
                });
            }
        }
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
    }

    fn submit(&mut self) {
        match self.state.search.submit() {
            SubmitAction::Select(candidate) => {
                self.cancel_debounce();
                self.state.intent += 1;
                self.begin_fetch(candidate.to_location(), FetchMode::Foreground);
            }
            SubmitAction::Lookup(query) => {
                self.cancel_debounce();
                self.state.intent += 1;
                self.state.location_pending = true;
                self.state.loading = true;
                self.state.error = None;

                let intent = self.state.intent;
                let geocoder = self.deps.geocoder.clone();
                self.spawn_event(async move {
                    let result = geocoder.search(&query, 1).await;
                    SessionEvent::FallbackSearched {
                        intent,
                        query,
                        result,
                    }
                });
            }
            SubmitAction::Ignore => {}
        }
    }

    fn finish_fallback_search(
        &mut self,
        query: String,
        result: Result<Vec<LocationCandidate>, ProviderError>,
    ) {
        self.state.location_pending = false;
        match result {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(candidate) => {
                    self.state.search.set_text_programmatic(candidate.name.clone());
                    self.begin_fetch(candidate.to_location(), FetchMode::Foreground);
                }
                None => {
                    self.state.loading = self.state.fetch_in_flight.is_some();
                    self.state.error = Some(SessionError::LocationNotFound { query });
                }
            },
            Err(e) => {
                warn!(session = %self.id, "Location search for {:?} failed: {}", query, e);
                self.state.loading = self.state.fetch_in_flight.is_some();
                self.state.error = Some(SessionError::SearchFailed);
            }
        }
    }

    /// Map click or geolocation fix: name the point, then fetch it.
    fn locate(&mut self, lat: f64, lng: f64) {
        self.state.intent += 1;
        self.state.location_pending = true;
        self.state.location = Some(Location::new(Location::coordinate_label(lat, lng), lat, lng));

        let intent = self.state.intent;
        let geocoder = self.deps.geocoder.clone();
        self.spawn_event(async move {
            let name = match geocoder.reverse_geocode(lat, lng).await {
                Ok(Some(name)) if !name.trim().is_empty() => name,
                Ok(_) => Location::coordinate_label(lat, lng),
                Err(e) => {
                    debug!("Reverse geocoding failed, using coordinates: {}", e);
                    Location::coordinate_label(lat, lng)
                }
            };
            SessionEvent::PlaceNamed {
                intent,
                location: Location::new(name, lat, lng),
            }
        });
    }

    fn begin_fetch(&mut self, location: Location, mode: FetchMode) {
        self.state.fetch_generation += 1;
        let generation = self.state.fetch_generation;
        self.state.fetch_in_flight = Some(generation);
        self.state.location = Some(location.clone());
        if mode == FetchMode::Foreground {
            self.state.location_pending = false;
            self.state.loading = true;
            self.state.error = None;
        }
        debug!(session = %self.id, generation, ?mode, location = %location.name, "fetching reading");

        let readings = self.deps.readings.clone();
        self.spawn_event(async move {
            let result = readings.fetch(location.lat, location.lng, &location.name).await;
            SessionEvent::ReadingLoaded { generation, result }
        });
    }

    fn finish_fetch(&mut self, generation: u64, result: Result<Reading, ProviderError>) {
        if generation != self.state.fetch_generation {
            debug!(
                session = %self.id,
                generation,
                current = self.state.fetch_generation,
                "stale reading ignored"
            );
            return;
        }

        self.state.fetch_in_flight = None;
        self.state.loading = false;
        match result {
            Ok(reading) => {
                debug!(session = %self.id, aqi = reading.aqi(), "reading loaded");
                self.state.reading = Some(Arc::new(reading));
            }
            Err(e) => {
                warn!(session = %self.id, "Failed to fetch air quality data: {}", e);
                self.state.error = Some(SessionError::FetchFailed);
            }
        }
    }

    fn on_refresh_tick(&mut self) {
        let busy = self.state.fetch_in_flight.is_some() || self.state.location_pending;
        let due = self.refresh.on_tick(self.state.reading.as_deref(), busy);
        if let Some(location) = due {
            self.begin_fetch(location, FetchMode::Silent);
        }
    }

    async fn persist_profile(&self) {
        if let Err(e) = self
            .deps
            .repository
            .save_profile(&self.user_id, &self.state.profile)
            .await
        {
            warn!(session = %self.id, "Failed to save profile for {}: {}", self.user_id, e);
        }
    }

    fn ask_chat(&mut self, message: String) {
        let message = message.trim().to_string();
        if message.is_empty() || self.state.chat_pending {
            return;
        }
        self.state.chat.push(ChatMessage::user(message.clone()));
        self.state.chat_pending = true;

        let context = chat_context(self.state.reading.as_deref());
        let chat = self.deps.chat.clone();
        self.spawn_event(async move {
            SessionEvent::ChatReplied(chat.ask(&message, &context).await)
        });
    }
}
