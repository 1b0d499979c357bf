// Nominatim geocoder - forward search and reverse lookup
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::providers::{LocationSearchProvider, ProviderError};
use crate::domain::location::LocationCandidate;

#[derive(Debug, Clone)]
pub struct NominatimClient {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    place_id: Option<serde_json::Value>,
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimClient {
    pub fn new(base_url: String, user_agent: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
            client: reqwest::Client::new(),
        }
    }

    fn search_url(&self, text: &str, limit: usize) -> String {
        format!(
            "{}/search?q={}&format=json&limit={}",
            self.base_url,
            urlencoding::encode(text),
            limit
        )
    }

    fn reverse_url(&self, lat: f64, lng: f64) -> String {
        format!("{}/reverse?format=json&lat={}&lon={}", self.base_url, lat, lng)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Network(format!(
                "geocoder returned status {}",
                status
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

fn to_candidates(hits: Vec<SearchHit>) -> Vec<LocationCandidate> {
    hits.into_iter()
        .filter_map(|hit| {
            let lat = hit.lat.parse::<f64>().ok()?;
            let lng = hit.lon.parse::<f64>().ok()?;
            let id = match hit.place_id {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => format!("{:.5},{:.5}", lat, lng),
            };
            Some(LocationCandidate {
                id,
                name: hit.display_name,
                lat,
                lng,
            })
        })
        .collect()
}

#[async_trait]
impl LocationSearchProvider for NominatimClient {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<LocationCandidate>, ProviderError> {
        let url = self.search_url(text, limit);
        tracing::debug!("Geocoder search: {}", url);
        let hits: Vec<SearchHit> = self.get_json(&url).await?;
        let mut candidates = to_candidates(hits);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, ProviderError> {
        let result: ReverseResult = self.get_json(&self.reverse_url(lat, lng)).await?;
        if let Some(error) = result.error {
            tracing::debug!("Reverse geocode of {},{} returned error: {}", lat, lng, error);
            return Ok(None);
        }
        Ok(result.display_name.filter(|name| !name.trim().is_empty()))
    }
}
