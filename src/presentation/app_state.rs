// Application state for HTTP handlers
use crate::application::air_quality_service::AirQualityService;
use crate::application::chat_service::ChatService;
use crate::application::profile_service::ProfileService;
use crate::application::session::{SessionDeps, SessionSettings};
use crate::application::session_registry::SessionRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub air_quality_service: AirQualityService,
    pub chat_service: ChatService,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Services and sessions share one set of providers and one store.
    pub fn new(deps: SessionDeps, settings: SessionSettings) -> Self {
        Self {
            profile_service: ProfileService::new(deps.repository.clone()),
            air_quality_service: AirQualityService::new(deps.readings.clone(), deps.repository.clone()),
            chat_service: ChatService::new(deps.chat.clone()),
            sessions: Arc::new(SessionRegistry::new(deps, settings)),
        }
    }
}
