// Scripted providers for exercising sessions and services
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::providers::{
    ChatProvider, LocationSearchProvider, ProviderError, ReadingProvider,
};
use crate::application::session::{SessionDeps, SessionHandle, SessionSettings, SessionSnapshot};
use crate::domain::location::LocationCandidate;
use crate::domain::reading::{ForecastDay, Location, Phenomenon, PhenomenonKind, Reading};
use crate::infrastructure::file_repository::JsonFileRepository;

pub fn sample_reading(name: &str, lat: f64, lng: f64, aqi: u32) -> Reading {
    Reading::new(
        Location::new(name, lat, lng),
        aqi,
        "PM2.5",
        Vec::new(),
        ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
            .iter()
            .map(|day| ForecastDay {
                day: day.to_string(),
                aqi: 40,
            })
            .collect(),
        Vec::new(),
        Phenomenon::of(PhenomenonKind::Seasonal),
        Vec::new(),
    )
}

pub struct ScriptedReadings {
    default_delay: Mutex<Duration>,
    delays: Mutex<VecDeque<Duration>>,
    fail: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedReadings {
    pub fn new() -> Self {
        Self {
            default_delay: Mutex::new(Duration::from_millis(100)),
            delays: Mutex::new(VecDeque::new()),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delays for the next fetches, in call order.
    pub fn push_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.delays.lock().unwrap().extend(delays);
    }

    pub fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.lock().unwrap() = delay;
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadingProvider for ScriptedReadings {
    async fn fetch(&self, lat: f64, lng: f64, name: &str) -> Result<Reading, ProviderError> {
        self.calls.lock().unwrap().push(name.to_string());
        let delay = self
            .delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.default_delay.lock().unwrap());
        tokio::time::sleep(delay).await;

        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("connection reset".into()));
        }
        Ok(sample_reading(name, lat, lng, 42))
    }
}

pub struct ScriptedGeocoder {
    places: Vec<LocationCandidate>,
    fail_search: AtomicBool,
    fail_reverse: AtomicBool,
    search_delay: Mutex<Duration>,
    reverse_delay: Mutex<Duration>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        let place = |id: &str, name: &str, lat: f64, lng: f64| LocationCandidate {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
        };
        Self {
            places: vec![
                place("1", "Seattle, WA", 47.61, -122.33),
                place("2", "Portland, OR", 45.52, -122.68),
                place("3", "Portland, ME", 43.66, -70.26),
                place("4", "Boise, ID", 43.62, -116.2),
            ],
            fail_search: AtomicBool::new(false),
            fail_reverse: AtomicBool::new(false),
            search_delay: Mutex::new(Duration::from_millis(50)),
            reverse_delay: Mutex::new(Duration::ZERO),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reverse(&self, fail: bool) {
        self.fail_reverse.store(fail, Ordering::SeqCst);
    }

    pub fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.lock().unwrap() = delay;
    }

    pub fn set_reverse_delay(&self, delay: Duration) {
        *self.reverse_delay.lock().unwrap() = delay;
    }

    /// Every forward search issued so far, suggestion or fallback.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationSearchProvider for ScriptedGeocoder {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<LocationCandidate>, ProviderError> {
        self.queries.lock().unwrap().push(text.to_string());
        let delay = *self.search_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("dns failure".into()));
        }
        let needle = text.to_lowercase();
        Ok(self
            .places
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, ProviderError> {
        let delay = *self.reverse_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reverse.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("geocoder down".into()));
        }
        Ok(Some(format!("Place {:.2},{:.2}", lat, lng)))
    }
}

pub struct EchoChat {
    fail: AtomicBool,
}

impl EchoChat {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatProvider for EchoChat {
    async fn ask(&self, prompt: &str, context: &str) -> Result<String, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("503 Service Unavailable".into()));
        }
        Ok(format!("echo: {} | {}", prompt, context))
    }
}

pub struct Fixture {
    pub readings: Arc<ScriptedReadings>,
    pub search: Arc<ScriptedGeocoder>,
    pub chat: Arc<EchoChat>,
    pub repository: Arc<JsonFileRepository>,
    pub settings: SessionSettings,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            readings: Arc::new(ScriptedReadings::new()),
            search: Arc::new(ScriptedGeocoder::new()),
            chat: Arc::new(EchoChat::new()),
            repository: Arc::new(JsonFileRepository::in_memory()),
            settings: SessionSettings::default(),
        }
    }

    pub fn with_refresh_period(period: Duration) -> Self {
        let mut fixture = Self::new();
        fixture.settings.refresh_period = period;
        fixture
    }

    pub fn deps(&self) -> SessionDeps {
        SessionDeps {
            readings: self.readings.clone(),
            geocoder: self.search.clone(),
            chat: self.chat.clone(),
            repository: self.repository.clone(),
        }
    }

    pub async fn spawn(&self, position: Option<(f64, f64)>) -> SessionHandle {
        SessionHandle::spawn("tester", position, self.deps(), self.settings.clone()).await
    }
}

/// Wait until a published snapshot satisfies `predicate`.
pub async fn wait_for<F>(session: &SessionHandle, mut predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let mut snapshots = session.subscribe();
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            {
                let snapshot = snapshots.borrow_and_update();
                if predicate(&snapshot) {
                    return snapshot.clone();
                }
            }
            snapshots
                .changed()
                .await
                .expect("session ended while waiting");
        }
    })
    .await
    .expect("timed out waiting for session state")
}
