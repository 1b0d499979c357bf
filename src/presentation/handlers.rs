// HTTP request handlers
use crate::application::session::SessionCommand;
use crate::domain::history::NewAqiHistoryEntry;
use crate::domain::location::NewSavedLocation;
use crate::domain::profile::{ActivityLevel, AgeGroup, HealthCondition, UserProfile};
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct HistoryParams {
    pub location: Option<String>,
    pub days: Option<u32>,
}

#[derive(Deserialize)]
pub struct PointParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Deserialize)]
pub struct TextBody {
    pub text: String,
}

#[derive(Deserialize)]
pub struct IndexBody {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct CoordinateBody {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Profile field value, by display label or short alias.
#[derive(Deserialize)]
pub struct ValueBody {
    pub value: String,
}

const ANONYMOUS_USER: &str = "anonymous";

async fn respond<T: Serialize + ?Sized>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn error_response(status: StatusCode, message: &str, compress: bool) -> Response {
    respond(status, &json!({ "error": message }), compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_profile(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.profile_service.get_profile(&user_id).await {
        Ok(Some(profile)) => respond(StatusCode::OK, &profile, compress).await,
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found", compress).await,
        Err(e) => {
            tracing::error!("Error fetching user profile: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user profile", compress).await
        }
    }
}

pub async fn save_profile(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.profile_service.save_profile(&user_id, &profile).await {
        Ok(()) => respond(StatusCode::OK, &json!({ "success": true, "message": "Profile saved" }), compress).await,
        Err(e) => {
            tracing::error!("Error saving user profile: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save profile", compress).await
        }
    }
}

pub async fn list_locations(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.profile_service.list_locations(&user_id).await {
        Ok(locations) => respond(StatusCode::OK, &locations, compress).await,
        Err(e) => {
            tracing::error!("Error fetching saved locations: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch locations", compress).await
        }
    }
}

pub async fn add_location(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(location): Json<NewSavedLocation>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.profile_service.add_location(&user_id, location).await {
        Ok(id) => {
            respond(
                StatusCode::OK,
                &json!({ "success": true, "id": id, "message": "Location saved" }),
                compress,
            )
            .await
        }
        Err(e) => {
            tracing::error!("Error saving location: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save location", compress).await
        }
    }
}

pub async fn delete_location(
    Path((user_id, location_id)): Path<(String, u64)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.profile_service.delete_location(&user_id, location_id).await {
        Ok(true) => {
            respond(StatusCode::OK, &json!({ "success": true, "message": "Location deleted" }), compress).await
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Location not found", compress).await,
        Err(e) => {
            tracing::error!("Error deleting location: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete location", compress).await
        }
    }
}

pub async fn record_history(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(entry): Json<NewAqiHistoryEntry>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.air_quality_service.record_history(entry).await {
        Ok(id) => {
            respond(
                StatusCode::OK,
                &json!({ "success": true, "id": id, "message": "AQI data saved" }),
                compress,
            )
            .await
        }
        Err(e) => {
            tracing::error!("Error saving AQI history: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save AQI data", compress).await
        }
    }
}

pub async fn query_history(
    Query(params): Query<HistoryParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let location = params.location.unwrap_or_default();
    match state.air_quality_service.query_history(&location, params.days).await {
        Ok(entries) => respond(StatusCode::OK, &entries, compress).await,
        Err(e) => {
            tracing::error!("Error fetching AQI history: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch AQI history", compress).await
        }
    }
}

pub async fn current_aqi(
    Query(params): Query<PointParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return error_response(StatusCode::BAD_REQUEST, "Latitude and longitude required", compress).await;
    };
    match state
        .air_quality_service
        .current(lat, lng, params.location.as_deref())
        .await
    {
        Ok(reading) => respond(StatusCode::OK, &reading, compress).await,
        Err(e) => {
            tracing::error!("Error fetching current AQI: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch air quality data", compress).await
        }
    }
}

pub async fn aqi_advice(
    Query(params): Query<PointParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return error_response(StatusCode::BAD_REQUEST, "Latitude and longitude required", compress).await;
    };
    match state
        .air_quality_service
        .advice(lat, lng, params.location.as_deref(), params.user_id.as_deref())
        .await
    {
        Ok(report) => respond(StatusCode::OK, &report, compress).await,
        Err(e) => {
            tracing::error!("Error building advice: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch air quality data", compress).await
        }
    }
}

pub async fn chat(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state
        .chat_service
        .ask(&request.message, request.context.as_deref())
        .await
    {
        Ok(reply) => respond(StatusCode::OK, &json!({ "reply": reply }), compress).await,
        Err(e) => {
            tracing::error!("Error calling chat provider: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get response from AI", compress).await
        }
    }
}

pub async fn create_session(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let user_id = request
        .user_id
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());
    let position = request.lat.zip(request.lng);

    let session = state.sessions.create(&user_id, position).await;
    respond(StatusCode::CREATED, &session.snapshot(), compress).await
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.sessions.get(id).await {
        Some(session) => respond(StatusCode::OK, &session.snapshot(), compress).await,
        None => error_response(StatusCode::NOT_FOUND, "Session not found", compress).await,
    }
}

/// Snapshot stream for a session (current state first, then every change)
pub async fn session_events(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.sessions.get(id).await {
        Some(session) => stream_from_watch(session.subscribe(), compress).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Session not found", compress).await,
    }
}

pub async fn close_session(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "Session not found", accepts_brotli(&headers)).await
    }
}

async fn dispatch(state: &AppState, id: Uuid, command: SessionCommand, compress: bool) -> Response {
    let Some(session) = state.sessions.get(id).await else {
        return error_response(StatusCode::NOT_FOUND, "Session not found", compress).await;
    };
    match session.send(command) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::warn!("Dropping command: {}", e);
            error_response(StatusCode::GONE, "Session has ended", compress).await
        }
    }
}

async fn dispatch_parsed<T, F>(state: &AppState, id: Uuid, value: &str, make: F, compress: bool) -> Response
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: FnOnce(T) -> SessionCommand,
{
    match value.parse::<T>() {
        Ok(parsed) => dispatch(state, id, make(parsed), compress).await,
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string(), compress).await,
    }
}

pub async fn session_input(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextBody>,
) -> Response {
    dispatch(&state, id, SessionCommand::InputText(body.text), accepts_brotli(&headers)).await
}

pub async fn session_blur(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    dispatch(&state, id, SessionCommand::Blur, accepts_brotli(&headers)).await
}

pub async fn session_submit(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    dispatch(&state, id, SessionCommand::Submit, accepts_brotli(&headers)).await
}

pub async fn session_select(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<IndexBody>,
) -> Response {
    dispatch(&state, id, SessionCommand::SelectSuggestion(body.index), accepts_brotli(&headers)).await
}

pub async fn session_map_click(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CoordinateBody>,
) -> Response {
    let command = SessionCommand::MapClick {
        lat: body.lat,
        lng: body.lng,
    };
    dispatch(&state, id, command, accepts_brotli(&headers)).await
}

pub async fn session_dismiss_error(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    dispatch(&state, id, SessionCommand::DismissError, accepts_brotli(&headers)).await
}

pub async fn session_chat(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<MessageBody>,
) -> Response {
    dispatch(&state, id, SessionCommand::AskChat(body.message), accepts_brotli(&headers)).await
}

pub async fn session_toggle_condition(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValueBody>,
) -> Response {
    dispatch_parsed::<HealthCondition, _>(
        &state,
        id,
        &body.value,
        SessionCommand::ToggleCondition,
        accepts_brotli(&headers),
    )
    .await
}

pub async fn session_age_group(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValueBody>,
) -> Response {
    dispatch_parsed::<AgeGroup, _>(&state, id, &body.value, SessionCommand::SetAgeGroup, accepts_brotli(&headers)).await
}

pub async fn session_activity_level(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValueBody>,
) -> Response {
    dispatch_parsed::<ActivityLevel, _>(
        &state,
        id,
        &body.value,
        SessionCommand::SetActivityLevel,
        accepts_brotli(&headers),
    )
    .await
}
