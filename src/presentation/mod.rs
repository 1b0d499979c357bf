// Presentation layer - HTTP routing and handlers
pub mod app_state;
pub mod handlers;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::app_state::AppState;
use self::handlers::*;

// Compression is handled in the response builders; no CompressionLayer.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route(
            "/api/users/:user_id/profile",
            get(get_profile).post(save_profile),
        )
        .route(
            "/api/users/:user_id/locations",
            get(list_locations).post(add_location),
        )
        .route(
            "/api/users/:user_id/locations/:location_id",
            delete(delete_location),
        )
        .route("/api/aqi/history", get(query_history).post(record_history))
        .route("/api/aqi/current", get(current_aqi))
        .route("/api/aqi/advice", get(aqi_advice))
        .route("/api/chat", post(chat))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        .route("/api/sessions/:id/events", get(session_events))
        .route("/api/sessions/:id/input", post(session_input))
        .route("/api/sessions/:id/blur", post(session_blur))
        .route("/api/sessions/:id/submit", post(session_submit))
        .route("/api/sessions/:id/select", post(session_select))
        .route("/api/sessions/:id/map-click", post(session_map_click))
        .route("/api/sessions/:id/dismiss-error", post(session_dismiss_error))
        .route("/api/sessions/:id/chat", post(session_chat))
        .route(
            "/api/sessions/:id/profile/conditions",
            post(session_toggle_condition),
        )
        .route("/api/sessions/:id/profile/age-group", post(session_age_group))
        .route(
            "/api/sessions/:id/profile/activity-level",
            post(session_activity_level),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
