// Contracts for the external services a dashboard session talks to
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::location::LocationCandidate;
use crate::domain::reading::Reading;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure: unreachable host, timeout, non-success status
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered but the payload was unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait ReadingProvider: Send + Sync {
    /// Resolves with a complete reading or fails; never partial.
    async fn fetch(&self, lat: f64, lng: f64, name: &str) -> Result<Reading, ProviderError>;
}

#[async_trait]
pub trait LocationSearchProvider: Send + Sync {
    /// Candidates in provider order, at most `limit`. May be empty.
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<LocationCandidate>, ProviderError>;

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, ProviderError>;
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn ask(&self, prompt: &str, context: &str) -> Result<String, ProviderError>;
}
