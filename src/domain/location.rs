// Location search and saved-location domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading::Location;

/// A geocoder match offered as a search suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl LocationCandidate {
    pub fn to_location(&self) -> Location {
        Location::new(self.name.clone(), self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: u64,
    pub user_id: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSavedLocation {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
}
