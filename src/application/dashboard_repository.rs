// Repository trait for profile, saved-location and history persistence
use crate::domain::history::{AqiHistoryEntry, HistoryQuery, NewAqiHistoryEntry};
use crate::domain::location::{NewSavedLocation, SavedLocation};
use crate::domain::profile::UserProfile;
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Stored profile for a user, if one was ever saved
    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>>;

    /// Insert or replace a user's profile
    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> anyhow::Result<()>;

    /// Saved locations for a user, newest first
    async fn list_locations(&self, user_id: &str) -> anyhow::Result<Vec<SavedLocation>>;

    /// Returns the id assigned to the new location
    async fn add_location(&self, user_id: &str, location: NewSavedLocation) -> anyhow::Result<u64>;

    /// Deletes only when the location belongs to `user_id`; returns whether a row went away
    async fn delete_location(&self, user_id: &str, location_id: u64) -> anyhow::Result<bool>;

    async fn record_history(&self, entry: NewAqiHistoryEntry) -> anyhow::Result<u64>;

    /// Matching entries, newest first, capped at `HistoryQuery::MAX_RESULTS`
    async fn query_history(&self, query: &HistoryQuery) -> anyhow::Result<Vec<AqiHistoryEntry>>;
}
