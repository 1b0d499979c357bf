// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod file_repository;
pub mod gemini;
pub mod http_response;
pub mod nominatim;
pub mod simulated_readings;
