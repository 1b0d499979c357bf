// JSON file repository - profiles, saved locations and AQI history
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::history::{AqiHistoryEntry, HistoryQuery, NewAqiHistoryEntry};
use crate::domain::location::{NewSavedLocation, SavedLocation};
use crate::domain::profile::UserProfile;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    next_location_id: u64,
    #[serde(default)]
    next_history_id: u64,
    #[serde(default)]
    profiles: HashMap<String, UserProfile>,
    #[serde(default)]
    locations: Vec<SavedLocation>,
    #[serde(default)]
    history: Vec<AqiHistoryEntry>,
}

pub struct JsonFileRepository {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl JsonFileRepository {
    /// Nothing is written to disk; contents go away with the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    /// Load `path` if it exists, otherwise start empty and create it on the
    /// first write.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse store file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store file {}", path.display()));
            }
        };
        tracing::info!("Opened store at {}", path.display());
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    async fn persist(&self, data: &StoreData) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for JsonFileRepository {
    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        Ok(self.data.lock().await.profiles.get(user_id).cloned())
    }

    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> anyhow::Result<()> {
        let mut data = self.data.lock().await;
        data.profiles.insert(user_id.to_string(), profile.clone());
        self.persist(&data).await
    }

    async fn list_locations(&self, user_id: &str) -> anyhow::Result<Vec<SavedLocation>> {
        let data = self.data.lock().await;
        let mut locations: Vec<SavedLocation> = data
            .locations
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        locations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(locations)
    }

    async fn add_location(&self, user_id: &str, location: NewSavedLocation) -> anyhow::Result<u64> {
        let mut data = self.data.lock().await;
        data.next_location_id += 1;
        let id = data.next_location_id;
        data.locations.push(SavedLocation {
            id,
            user_id: user_id.to_string(),
            location_name: location.location_name,
            latitude: location.latitude,
            longitude: location.longitude,
            created_at: Utc::now(),
        });
        self.persist(&data).await?;
        Ok(id)
    }

    async fn delete_location(&self, user_id: &str, location_id: u64) -> anyhow::Result<bool> {
        let mut data = self.data.lock().await;
        let before = data.locations.len();
        data.locations
            .retain(|l| !(l.id == location_id && l.user_id == user_id));
        let removed = data.locations.len() != before;
        if removed {
            self.persist(&data).await?;
        }
        Ok(removed)
    }

    async fn record_history(&self, entry: NewAqiHistoryEntry) -> anyhow::Result<u64> {
        let mut data = self.data.lock().await;
        data.next_history_id += 1;
        let id = data.next_history_id;
        data.history.push(AqiHistoryEntry {
            id,
            location_name: entry.location_name,
            latitude: entry.latitude,
            longitude: entry.longitude,
            aqi: entry.aqi,
            category: entry.category,
            primary_pollutant: entry.primary_pollutant,
            pollutants: entry.pollutants,
            timestamp: Utc::now(),
        });
        self.persist(&data).await?;
        Ok(id)
    }

    async fn query_history(&self, query: &HistoryQuery) -> anyhow::Result<Vec<AqiHistoryEntry>> {
        let cutoff = query.cutoff(Utc::now());
        let data = self.data.lock().await;
        let mut entries: Vec<AqiHistoryEntry> = data
            .history
            .iter()
            .filter(|e| query.matches(e, cutoff))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries.truncate(HistoryQuery::MAX_RESULTS);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{ActivityLevel, HealthCondition};
    use pretty_assertions::assert_eq;

    fn new_location(name: &str) -> NewSavedLocation {
        NewSavedLocation {
            location_name: name.to_string(),
            latitude: 1.0,
            longitude: 2.0,
        }
    }

    fn new_entry(name: &str, aqi: u32) -> NewAqiHistoryEntry {
        NewAqiHistoryEntry {
            location_name: name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            aqi,
            category: "Good".to_string(),
            primary_pollutant: "PM2.5".to_string(),
            pollutants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_locations_newest_first_and_scoped_by_user() {
        let repo = JsonFileRepository::in_memory();
        let first = repo.add_location("alice", new_location("Home")).await.unwrap();
        let second = repo.add_location("alice", new_location("Work")).await.unwrap();
        let other = repo.add_location("bob", new_location("Gym")).await.unwrap();

        let names: Vec<String> = repo
            .list_locations("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.location_name)
            .collect();
        assert_eq!(names, vec!["Work".to_string(), "Home".to_string()]);
        assert!(second > first);

        assert!(!repo.delete_location("alice", other).await.unwrap());
        assert_eq!(repo.list_locations("bob").await.unwrap().len(), 1);
        assert!(repo.delete_location("alice", first).await.unwrap());
        assert_eq!(repo.list_locations("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_filter_and_order() {
        let repo = JsonFileRepository::in_memory();
        repo.record_history(new_entry("Los Angeles, CA", 80)).await.unwrap();
        repo.record_history(new_entry("Boston, MA", 30)).await.unwrap();
        repo.record_history(new_entry("Los Angeles, CA", 120)).await.unwrap();

        let query = HistoryQuery {
            location: "los angeles".to_string(),
            days: HistoryQuery::DEFAULT_DAYS,
        };
        let entries = repo.query_history(&query).await.unwrap();
        assert_eq!(entries.iter().map(|e| e.aqi).collect::<Vec<_>>(), vec![120, 80]);

        let everything = HistoryQuery {
            location: String::new(),
            days: 1,
        };
        assert_eq!(repo.query_history(&everything).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_history_with_unbounded_days() {
        let repo = JsonFileRepository::in_memory();
        repo.record_history(new_entry("Reno, NV", 55)).await.unwrap();
        let query = HistoryQuery {
            location: "reno".to_string(),
            days: u32::MAX,
        };
        let entries = repo.query_history(&query).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_history_capped() {
        let repo = JsonFileRepository::in_memory();
        for i in 0..(HistoryQuery::MAX_RESULTS as u32 + 10) {
            repo.record_history(new_entry("Denver", i)).await.unwrap();
        }
        let query = HistoryQuery {
            location: "denver".to_string(),
            days: 30,
        };
        let entries = repo.query_history(&query).await.unwrap();
        assert_eq!(entries.len(), HistoryQuery::MAX_RESULTS);
        assert_eq!(entries[0].aqi, HistoryQuery::MAX_RESULTS as u32 + 9);
    }

    #[tokio::test]
    async fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut profile = UserProfile::default();
        profile.health_conditions.toggle(HealthCondition::Asthma);
        profile.activity_level = ActivityLevel::High;

        {
            let repo = JsonFileRepository::open(&path).await.unwrap();
            repo.save_profile("alice", &profile).await.unwrap();
            repo.add_location("alice", new_location("Home")).await.unwrap();
        }

        let reopened = JsonFileRepository::open(&path).await.unwrap();
        assert_eq!(reopened.get_profile("alice").await.unwrap(), Some(profile));
        assert_eq!(reopened.get_profile("bob").await.unwrap(), None);
        let next = reopened.add_location("alice", new_location("Work")).await.unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(JsonFileRepository::open(&path).await.is_err());
    }
}
