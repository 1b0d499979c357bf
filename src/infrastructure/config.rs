use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::search_controller::SearchTiming;
use crate::application::session::SessionSettings;
use crate::domain::reading::Location;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub readings: ReadingSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    /// JSON file backing profiles, saved locations and history. In-memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReadingSettings {
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Fixed RNG seed for reproducible simulated data.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatSettings {
    #[serde(default = "default_chat_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Sessions with no client activity for this long are closed.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_location")]
    pub default_location: Location,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_latency_ms() -> u64 {
    1000
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("aura-quality/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_chat_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_chat_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_blur_grace_ms() -> u64 {
    150
}

fn default_max_suggestions() -> usize {
    5
}

fn default_refresh_secs() -> u64 {
    300
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_location() -> Location {
    Location::new("Los Angeles, CA", 34.0522, -118.2437)
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for ReadingSettings {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            seed: None,
        }
    }
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: default_chat_url(),
            model: default_chat_model(),
            api_key: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            blur_grace_ms: default_blur_grace_ms(),
            max_suggestions: default_max_suggestions(),
            refresh_secs: default_refresh_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            default_location: default_location(),
        }
    }
}

impl SessionConfig {
    pub fn to_session_settings(&self) -> SessionSettings {
        SessionSettings {
            search: SearchTiming {
                debounce: Duration::from_millis(self.debounce_ms),
                blur_grace: Duration::from_millis(self.blur_grace_ms),
                max_suggestions: self.max_suggestions,
            },
            refresh_period: Duration::from_secs(self.refresh_secs),
            default_location: self.default_location.clone(),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

impl Settings {
    /// Session timers cannot run with a zero period.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session.refresh_secs == 0 {
            anyhow::bail!("session.refresh_secs must be greater than zero");
        }
        if self.session.idle_timeout_secs == 0 {
            anyhow::bail!("session.idle_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    fn from_config(config: config::Config) -> anyhow::Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// `config/aura.{toml,yaml,json}` if present, then `AURA__SECTION__KEY`
/// environment overrides.
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/aura").required(false))
        .add_source(
            config::Environment::with_prefix("AURA")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Settings::from_config(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_behaviour() {
        let settings: Settings = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let session = settings.session.to_session_settings();

        assert_eq!(session.search.debounce, Duration::from_millis(300));
        assert_eq!(session.search.blur_grace, Duration::from_millis(150));
        assert_eq!(session.search.max_suggestions, 5);
        assert_eq!(session.refresh_period, Duration::from_secs(300));
        assert_eq!(session.idle_timeout, Duration::from_secs(1800));
        assert_eq!(session.default_location.name, "Los Angeles, CA");
        assert_eq!(settings.server.bind.port(), 8080);
        assert!(settings.chat.api_key.is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [session]
            debounce_ms = 500
            refresh_secs = 60

            [chat]
            api_key = "secret"
        "#;
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.session.debounce_ms, 500);
        assert_eq!(settings.session.refresh_secs, 60);
        assert_eq!(settings.session.blur_grace_ms, 150);
        assert_eq!(settings.chat.api_key.as_deref(), Some("secret"));
    }

    fn from_toml(toml: &str) -> anyhow::Result<Settings> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Settings::from_config(config)
    }

    #[test]
    fn test_zero_refresh_period_rejected() {
        let err = from_toml("[session]\nrefresh_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("refresh_secs"), "{err}");
    }

    #[test]
    fn test_zero_idle_timeout_rejected() {
        let err = from_toml("[session]\nidle_timeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("idle_timeout_secs"), "{err}");
        assert!(from_toml("[session]\nidle_timeout_secs = 60\n").is_ok());
    }
}
