// Profile service - Use cases for user profiles and saved locations
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::location::{NewSavedLocation, SavedLocation};
use crate::domain::profile::UserProfile;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn DashboardRepository>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn DashboardRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        self.repository.get_profile(user_id).await
    }

    pub async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> anyhow::Result<()> {
        self.repository.save_profile(user_id, profile).await?;
        tracing::debug!("Saved profile for {}", user_id);
        Ok(())
    }

    pub async fn list_locations(&self, user_id: &str) -> anyhow::Result<Vec<SavedLocation>> {
        self.repository.list_locations(user_id).await
    }

    pub async fn add_location(&self, user_id: &str, location: NewSavedLocation) -> anyhow::Result<u64> {
        if location.location_name.trim().is_empty() {
            anyhow::bail!("location_name must not be empty");
        }
        self.repository.add_location(user_id, location).await
    }

    pub async fn delete_location(&self, user_id: &str, location_id: u64) -> anyhow::Result<bool> {
        self.repository.delete_location(user_id, location_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::AgeGroup;
    use crate::infrastructure::file_repository::JsonFileRepository;

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(JsonFileRepository::in_memory()))
    }

    #[tokio::test]
    async fn test_profile_saved_then_found() {
        let service = service();
        assert_eq!(service.get_profile("nobody").await.unwrap(), None);

        let profile = UserProfile {
            age_group: AgeGroup::Seniors,
            ..UserProfile::default()
        };
        service.save_profile("nobody", &profile).await.unwrap();
        assert_eq!(service.get_profile("nobody").await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_blank_location_name_rejected() {
        let service = service();
        let result = service
            .add_location(
                "alice",
                NewSavedLocation {
                    location_name: "  ".to_string(),
                    latitude: 0.0,
                    longitude: 0.0,
                },
            )
            .await;
        assert!(result.is_err());
        assert!(service.list_locations("alice").await.unwrap().is_empty());
    }
}
