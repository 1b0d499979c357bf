// Air quality reading domain model
use serde::{Deserialize, Serialize};

use super::aqi::{AqiCategory, resolve_category};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Label used when a coordinate cannot be reverse-geocoded.
    pub fn coordinate_label(lat: f64, lng: f64) -> String {
        format!("Lat: {:.2}, Lng: {:.2}", lat, lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pollutant {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: String,
    pub aqi: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub aqi: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhenomenonKind {
    Inversion,
    Stagnant,
    Wildfire,
    Seasonal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phenomenon {
    pub key: PhenomenonKind,
    pub title: String,
    pub explanation: String,
}

impl Phenomenon {
    pub fn of(key: PhenomenonKind) -> Self {
        let (title, explanation) = match key {
            PhenomenonKind::Inversion => (
                "Atmospheric Inversion",
                "A temperature inversion is occurring, trapping pollutants close to the ground and increasing concentrations. This typically happens in calm weather conditions, especially overnight and in the early morning.",
            ),
            PhenomenonKind::Stagnant => (
                "Stagnant Air Mass",
                "A slow-moving high-pressure system is causing the air to stagnate. This lack of wind prevents pollutants from dispersing, leading to a gradual buildup of poor air quality over the area.",
            ),
            PhenomenonKind::Wildfire => (
                "Wildfire Smoke",
                "Smoke from distant wildfires is being transported into the region. This smoke contains high levels of fine particulate matter (PM2.5), significantly impacting air quality.",
            ),
            PhenomenonKind::Seasonal => (
                "Seasonal Ozone",
                "Warm temperatures and sunlight are reacting with pollutants like NOx to form ground-level ozone, a common issue during summer months. Ozone levels are typically highest in the afternoon.",
            ),
        };
        Self {
            key,
            title: title.to_string(),
            explanation: explanation.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "Wildfire Smoke")]
    WildfireSmoke,
    #[serde(rename = "Ozone Action Day")]
    OzoneAction,
    #[serde(rename = "Particle Pollution")]
    ParticlePollution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    pub fn of(kind: AlertKind) -> Self {
        let (severity, message) = match kind {
            AlertKind::WildfireSmoke => (
                AlertSeverity::High,
                "Air quality is heavily impacted by wildfire smoke. Sensitive groups and the general public should avoid outdoor activities.",
            ),
            AlertKind::OzoneAction => (
                AlertSeverity::Moderate,
                "High ozone levels are expected. Limit strenuous outdoor activity, especially during the afternoon.",
            ),
            AlertKind::ParticlePollution => (
                AlertSeverity::High,
                "High levels of particle pollution detected. All individuals should reduce exposure by staying indoors.",
            ),
        };
        Self {
            kind,
            severity,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub aqi: u32,
    pub category: String,
    pub color: String,
    pub primary_pollutant: String,
    pub pollutants: Vec<Pollutant>,
}

/// A complete snapshot for one location. Never mutated after construction;
/// a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub location: Location,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub historical: Vec<HistoricalPoint>,
    pub phenomenon: Phenomenon,
    pub alerts: Vec<Alert>,
}

impl Reading {
    /// Builds a reading whose category label and colour are derived from `aqi`.
    pub fn new(
        location: Location,
        aqi: u32,
        primary_pollutant: impl Into<String>,
        pollutants: Vec<Pollutant>,
        forecast: Vec<ForecastDay>,
        historical: Vec<HistoricalPoint>,
        phenomenon: Phenomenon,
        alerts: Vec<Alert>,
    ) -> Self {
        let category = resolve_category(aqi);
        Self {
            location,
            current: CurrentConditions {
                aqi,
                category: category.name.to_string(),
                color: category.class_name.to_string(),
                primary_pollutant: primary_pollutant.into(),
                pollutants,
            },
            forecast,
            historical,
            phenomenon,
            alerts,
        }
    }

    pub fn aqi(&self) -> u32 {
        self.current.aqi
    }

    pub fn category(&self) -> &'static AqiCategory {
        resolve_category(self.current.aqi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_label() {
        assert_eq!(Location::coordinate_label(34.0522, -118.2437), "Lat: 34.05, Lng: -118.24");
    }

    #[test]
    fn test_category_follows_index() {
        let reading = Reading::new(
            Location::new("Fresno", 36.7, -119.8),
            162,
            "PM2.5",
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Phenomenon::of(PhenomenonKind::Wildfire),
            vec![Alert::of(AlertKind::WildfireSmoke)],
        );
        assert_eq!(reading.current.category, "Unhealthy");
        assert_eq!(reading.current.color, "bg-red-500");
        assert_eq!(reading.category().name, "Unhealthy");
    }

    #[test]
    fn test_alert_wire_format() {
        let json = serde_json::to_value(Alert::of(AlertKind::OzoneAction)).unwrap();
        assert_eq!(json["type"], "Ozone Action Day");
        assert_eq!(json["severity"], "Moderate");
    }
}
