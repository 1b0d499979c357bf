// Domain layer - Pure models and rules, no I/O
pub mod advisory;
pub mod aqi;
pub mod chat;
pub mod history;
pub mod location;
pub mod profile;
pub mod reading;
