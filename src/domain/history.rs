// Recorded AQI observations
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::reading::{Pollutant, Reading};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiHistoryEntry {
    pub id: u64,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: u32,
    pub category: String,
    pub primary_pollutant: String,
    pub pollutants: Vec<Pollutant>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAqiHistoryEntry {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: u32,
    pub category: String,
    pub primary_pollutant: String,
    #[serde(default)]
    pub pollutants: Vec<Pollutant>,
}

impl From<&Reading> for NewAqiHistoryEntry {
    fn from(reading: &Reading) -> Self {
        Self {
            location_name: reading.location.name.clone(),
            latitude: reading.location.lat,
            longitude: reading.location.lng,
            aqi: reading.current.aqi,
            category: reading.current.category.clone(),
            primary_pollutant: reading.current.primary_pollutant.clone(),
            pollutants: reading.current.pollutants.clone(),
        }
    }
}

/// Filter for history lookups: case-insensitive substring on the location
/// name, restricted to the last `days` days.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub location: String,
    pub days: u32,
}

impl HistoryQuery {
    pub const DEFAULT_DAYS: u32 = 30;
    pub const MAX_RESULTS: usize = 100;

    /// Oldest timestamp still inside the window; `None` when the window
    /// reaches past the representable range, which means no lower bound.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_days(i64::from(self.days)).and_then(|span| now.checked_sub_signed(span))
    }

    pub fn matches(&self, entry: &AqiHistoryEntry, cutoff: Option<DateTime<Utc>>) -> bool {
        cutoff.is_none_or(|cutoff| entry.timestamp >= cutoff)
            && entry
                .location_name
                .to_lowercase()
                .contains(&self.location.to_lowercase())
    }
}
