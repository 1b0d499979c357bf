// Simulated reading provider - stands in for a real sensor network
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::providers::{ProviderError, ReadingProvider};
use crate::domain::reading::{
    Alert, AlertKind, ForecastDay, HistoricalPoint, Location, Phenomenon, PhenomenonKind,
    Pollutant, Reading,
};

const FORECAST_DAYS: i64 = 7;
const HISTORY_DAYS: i64 = 30;
const MIN_SERIES_AQI: i64 = 10;

pub struct SimulatedReadingProvider {
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedReadingProvider {
    pub fn new(latency: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            latency,
            rng: Mutex::new(rng),
        }
    }

    fn generate(&self, lat: f64, lng: f64, name: &str) -> Result<Reading, ProviderError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ProviderError::InvalidResponse("simulator state poisoned".into()))?;
        Ok(generate_reading(&mut *rng, Location::new(name, lat, lng)))
    }
}

#[async_trait]
impl ReadingProvider for SimulatedReadingProvider {
    async fn fetch(&self, lat: f64, lng: f64, name: &str) -> Result<Reading, ProviderError> {
        tokio::time::sleep(self.latency).await;
        let reading = self.generate(lat, lng, name)?;
        tracing::debug!("Simulated reading for {}: AQI {}", name, reading.aqi());
        Ok(reading)
    }
}

/// Inclusive integer draw whose upper bound may be fractional; collapses to
/// `min` when the range is empty.
fn draw<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let lo = min.floor() as i64;
    let hi = max.floor() as i64;
    if hi <= lo {
        return lo as f64;
    }
    rng.random_range(lo..=hi) as f64
}

fn pollutants<R: Rng + ?Sized>(rng: &mut R, aqi: u32) -> Vec<Pollutant> {
    let aqi = f64::from(aqi);
    let elevated = aqi > 50.0;
    let ozone_elevated = aqi > 100.0;
    let entry = |name: &str, value: f64, unit: &str| Pollutant {
        name: name.to_string(),
        value,
        unit: unit.to_string(),
    };

    vec![
        entry(
            "PM2.5",
            if elevated { draw(rng, 12.0, aqi / 4.0) } else { draw(rng, 0.0, 12.0) },
            "µg/m³",
        ),
        entry(
            "PM10",
            if elevated { draw(rng, 55.0, aqi / 2.0) } else { draw(rng, 0.0, 54.0) },
            "µg/m³",
        ),
        entry(
            "O3",
            if ozone_elevated { draw(rng, 71.0, aqi / 2.5) } else { draw(rng, 0.0, 70.0) },
            "ppb",
        ),
        entry("NO2", draw(rng, 0.0, aqi / 5.0), "ppb"),
        entry("SO2", draw(rng, 0.0, aqi / 8.0), "ppb"),
        entry("CO", draw(rng, 0.0, aqi / 20.0), "ppm"),
    ]
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, aqi: u32, spread: i64) -> u32 {
    let value = i64::from(aqi) + rng.random_range(-spread..=spread);
    value.max(MIN_SERIES_AQI) as u32
}

pub fn generate_reading<R: Rng + ?Sized>(rng: &mut R, location: Location) -> Reading {
    let aqi: u32 = rng.random_range(10..=350);
    let today = Utc::now();

    let forecast = (1..=FORECAST_DAYS)
        .map(|offset| ForecastDay {
            day: (today + ChronoDuration::days(offset)).format("%a").to_string(),
            aqi: jitter(rng, aqi, 30),
        })
        .collect();

    let historical = (0..HISTORY_DAYS)
        .map(|i| HistoricalPoint {
            date: (today - ChronoDuration::days(HISTORY_DAYS - i))
                .format("%b %-d")
                .to_string(),
            aqi: jitter(rng, aqi, 50),
        })
        .collect();

    let phenomenon = if aqi > 150 {
        let kinds = [
            PhenomenonKind::Inversion,
            PhenomenonKind::Stagnant,
            PhenomenonKind::Wildfire,
        ];
        Phenomenon::of(kinds[rng.random_range(0..kinds.len())])
    } else {
        Phenomenon::of(PhenomenonKind::Seasonal)
    };

    let mut alerts = Vec::new();
    if aqi > 150 && rng.random_bool(0.7) {
        let kinds = [
            AlertKind::WildfireSmoke,
            AlertKind::OzoneAction,
            AlertKind::ParticlePollution,
        ];
        alerts.push(Alert::of(kinds[rng.random_range(0..kinds.len())]));
    }

    let measured = pollutants(rng, aqi);
    Reading::new(
        location,
        aqi,
        "PM2.5",
        measured,
        forecast,
        historical,
        phenomenon,
        alerts,
    )
}
