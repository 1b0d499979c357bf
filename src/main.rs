// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_repository::DashboardRepository;
use crate::application::session::SessionDeps;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::file_repository::JsonFileRepository;
use crate::infrastructure::gemini::GeminiChatProvider;
use crate::infrastructure::nominatim::NominatimClient;
use crate::infrastructure::simulated_readings::SimulatedReadingProvider;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Create repository and providers (infrastructure layer)
    let repository: Arc<dyn DashboardRepository> = match &settings.store.path {
        Some(path) => Arc::new(JsonFileRepository::open(path).await?),
        None => {
            tracing::warn!("No store path configured; profiles and history are kept in memory");
            Arc::new(JsonFileRepository::in_memory())
        }
    };
    let chat = GeminiChatProvider::new(
        settings.chat.base_url.clone(),
        settings.chat.model.clone(),
        settings.chat.api_key.clone(),
    );
    if !chat.is_configured() {
        tracing::warn!("No chat api key configured; assistant replies will fail");
    }
    let deps = SessionDeps {
        readings: Arc::new(SimulatedReadingProvider::new(
            Duration::from_millis(settings.readings.latency_ms),
            settings.readings.seed,
        )),
        geocoder: Arc::new(NominatimClient::new(
            settings.geocoder.base_url.clone(),
            settings.geocoder.user_agent.clone(),
        )),
        chat: Arc::new(chat),
        repository,
    };

    // Create services and session registry (application layer)
    let state = Arc::new(AppState::new(deps, settings.session.to_session_settings()));
    let reaper = state.sessions.spawn_reaper();

    // Build router (presentation layer)
    let router = presentation::router(state.clone());

    // Start server
    let addr = settings.server.bind;
    tracing::info!("Starting aura-quality service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    reaper.abort();
    tracing::info!("Closing {} open sessions", state.sessions.len().await);
    state.sessions.shutdown_all().await;
    tracing::info!("Server stopped");

    Ok(())
}
