// Application layer - Use cases, session orchestration and provider contracts
pub mod air_quality_service;
pub mod chat_service;
pub mod dashboard_repository;
pub mod profile_service;
pub mod providers;
pub mod refresh_controller;
pub mod search_controller;
pub mod session;
pub mod session_registry;

#[cfg(test)]
pub mod test_support;
