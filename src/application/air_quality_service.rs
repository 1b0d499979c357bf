// Air quality service - Use cases for one-shot readings, advice and history
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::providers::ReadingProvider;
use crate::domain::advisory::{Advisory, advise};
use crate::domain::aqi::AqiCategory;
use crate::domain::history::{AqiHistoryEntry, HistoryQuery, NewAqiHistoryEntry};
use crate::domain::profile::UserProfile;
use crate::domain::reading::{Location, Reading};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceReport {
    pub reading: Reading,
    pub category: &'static AqiCategory,
    pub profile: UserProfile,
    pub advisory: Advisory,
}

#[derive(Clone)]
pub struct AirQualityService {
    readings: Arc<dyn ReadingProvider>,
    repository: Arc<dyn DashboardRepository>,
}

impl AirQualityService {
    pub fn new(readings: Arc<dyn ReadingProvider>, repository: Arc<dyn DashboardRepository>) -> Self {
        Self {
            readings,
            repository,
        }
    }

    /// Unnamed points are labelled by their coordinates.
    pub async fn current(&self, lat: f64, lng: f64, name: Option<&str>) -> anyhow::Result<Reading> {
        let location = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Location::new(name, lat, lng),
            None => Location::new(Location::coordinate_label(lat, lng), lat, lng),
        };
        let reading = self
            .readings
            .fetch(location.lat, location.lng, &location.name)
            .await
            .with_context(|| format!("Failed to fetch reading for {}", location.name))?;
        Ok(reading)
    }

    pub async fn advice(
        &self,
        lat: f64,
        lng: f64,
        name: Option<&str>,
        user_id: Option<&str>,
    ) -> anyhow::Result<AdviceReport> {
        let profile = match user_id {
            Some(user_id) => self.repository.get_profile(user_id).await?.unwrap_or_default(),
            None => UserProfile::default(),
        };
        let reading = self.current(lat, lng, name).await?;
        let advisory = advise(&reading, &profile);
        Ok(AdviceReport {
            category: reading.category(),
            reading,
            profile,
            advisory,
        })
    }

    pub async fn record_history(&self, entry: NewAqiHistoryEntry) -> anyhow::Result<u64> {
        self.repository.record_history(entry).await
    }

    pub async fn query_history(&self, location: &str, days: Option<u32>) -> anyhow::Result<Vec<AqiHistoryEntry>> {
        let query = HistoryQuery {
            location: location.to_string(),
            days: days.unwrap_or(HistoryQuery::DEFAULT_DAYS),
        };
        self.repository.query_history(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::ScriptedReadings;
    use crate::domain::profile::HealthCondition;
    use crate::infrastructure::file_repository::JsonFileRepository;
    use pretty_assertions::assert_eq;

    fn service() -> (AirQualityService, Arc<JsonFileRepository>) {
        let repository = Arc::new(JsonFileRepository::in_memory());
        let service = AirQualityService::new(Arc::new(ScriptedReadings::new()), repository.clone());
        (service, repository)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unnamed_point_gets_coordinate_label() {
        let (service, _) = service();
        let reading = service.current(12.3456, -7.891, None).await.unwrap();
        assert_eq!(reading.location.name, "Lat: 12.35, Lng: -7.89");

        let named = service.current(1.0, 2.0, Some("Quito")).await.unwrap();
        assert_eq!(named.location.name, "Quito");
    }

    #[tokio::test(start_paused = true)]
    async fn test_advice_uses_stored_profile() {
        let (service, repository) = service();
        let mut profile = UserProfile::default();
        profile.health_conditions.toggle(HealthCondition::Asthma);
        repository.save_profile("alice", &profile).await.unwrap();

        let report = service.advice(1.0, 2.0, Some("Here"), Some("alice")).await.unwrap();
        assert_eq!(report.profile, profile);
        assert_eq!(report.category.name, "Good");
        assert_eq!(report.advisory, advise(&report.reading, &profile));

        let anonymous = service.advice(1.0, 2.0, Some("Here"), None).await.unwrap();
        assert_eq!(anonymous.profile, UserProfile::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_round_trip() {
        let (service, _) = service();
        let reading = service.current(1.0, 2.0, Some("Austin, TX")).await.unwrap();
        service
            .record_history(NewAqiHistoryEntry::from(&reading))
            .await
            .unwrap();

        let entries = service.query_history("austin", None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].aqi, reading.aqi());
        assert!(service.query_history("dallas", Some(7)).await.unwrap().is_empty());
    }
}
