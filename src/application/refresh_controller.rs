// Periodic silent re-fetch of the loaded location
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::domain::reading::{Location, Reading};

pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct RefreshController {
    period: Duration,
    fired: u64,
    skipped: u64,
}

impl RefreshController {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            fired: 0,
            skipped: 0,
        }
    }

    /// First tick one full period from now; late ticks are dropped, not bunched.
    pub fn ticker(&self) -> Interval {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }

    /// Decide what a tick should do: the location to re-fetch, or nothing when
    /// no reading is loaded yet or a fetch or location change is still
    /// outstanding.
    pub fn on_tick(&mut self, reading: Option<&Reading>, busy: bool) -> Option<Location> {
        match reading {
            Some(reading) if !busy => {
                self.fired += 1;
                Some(reading.location.clone())
            }
            _ => {
                self.skipped += 1;
                tracing::debug!(
                    loaded = reading.is_some(),
                    busy,
                    skipped = self.skipped,
                    "refresh tick skipped"
                );
                None
            }
        }
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_PERIOD)
    }
}
