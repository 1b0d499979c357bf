// Health advisory - Personalized tips from a reading and a user profile
use serde::Serialize;

use super::profile::{ActivityLevel, UserProfile};
use super::reading::Reading;

const SENSITIVE_THRESHOLD: u32 = 100;
const UNHEALTHY_THRESHOLD: u32 = 150;
const VERY_UNHEALTHY_THRESHOLD: u32 = 200;

pub const TIP_SENSITIVE_REDUCE_EXERTION: &str =
    "As a member of a sensitive group, you should reduce prolonged or heavy outdoor exertion.";
pub const TIP_SENSITIVE_MASK: &str =
    "Consider wearing a N95 mask if you must be outdoors for an extended period.";
pub const TIP_RESCHEDULE_EXERCISE: &str = "It's highly recommended to reschedule strenuous exercise to a time when air quality is better, or move it indoors.";
pub const TIP_REDUCE_EXERTION_CLOSE_WINDOWS: &str =
    "Everyone should reduce heavy outdoor exertion. Keep windows and doors closed.";
pub const TIP_HEPA_PURIFIER: &str =
    "Use air purifiers with HEPA filters if available to improve indoor air quality.";
pub const TIP_AVOID_OUTDOORS: &str =
    "Avoid all outdoor physical activity. Keep sensitive individuals indoors as much as possible.";
pub const TIP_GOOD_AIR: &str = "Air quality is good. It's a great time for outdoor activities!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub tips: Vec<String>,
    pub proactive_tip: Option<String>,
}

/// Every current-conditions threshold that applies adds its tip, in a fixed
/// order. The proactive tip looks only at the forecast.
pub fn advise(reading: &Reading, profile: &UserProfile) -> Advisory {
    let aqi = reading.aqi();
    let sensitive = profile.is_sensitive();
    let active = profile.activity_level == ActivityLevel::High;

    let mut tips: Vec<&'static str> = Vec::new();
    if aqi > SENSITIVE_THRESHOLD {
        if sensitive {
            tips.push(TIP_SENSITIVE_REDUCE_EXERTION);
            if aqi > UNHEALTHY_THRESHOLD {
                tips.push(TIP_SENSITIVE_MASK);
            }
        }
        if active {
            tips.push(TIP_RESCHEDULE_EXERCISE);
        }
    }
    if aqi > UNHEALTHY_THRESHOLD {
        tips.push(TIP_REDUCE_EXERTION_CLOSE_WINDOWS);
        tips.push(TIP_HEPA_PURIFIER);
    }
    if aqi > VERY_UNHEALTHY_THRESHOLD {
        tips.push(TIP_AVOID_OUTDOORS);
    }
    if tips.is_empty() {
        tips.push(TIP_GOOD_AIR);
    }

    let proactive_tip = reading
        .forecast
        .iter()
        .find(|day| day.aqi > SENSITIVE_THRESHOLD)
        .map(|day| {
            let clause = if sensitive {
                "Plan to limit your time outdoors."
            } else if active {
                "Consider planning your outdoor exercise for a different day."
            } else {
                "Be mindful of your outdoor activities."
            };
            format!(
                "High AQI of {} is forecasted for {}. {}",
                day.aqi, day.day, clause
            )
        });

    Advisory {
        tips: tips.into_iter().map(str::to_string).collect(),
        proactive_tip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{AgeGroup, HealthCondition};
    use crate::domain::reading::{ForecastDay, Location, Phenomenon, PhenomenonKind};
    use pretty_assertions::assert_eq;

    fn reading(aqi: u32, forecast: &[(&str, u32)]) -> Reading {
        Reading::new(
            Location::new("Test City", 0.0, 0.0),
            aqi,
            "PM2.5",
            Vec::new(),
            forecast
                .iter()
                .map(|(day, aqi)| ForecastDay {
                    day: day.to_string(),
                    aqi: *aqi,
                })
                .collect(),
            Vec::new(),
            Phenomenon::of(PhenomenonKind::Seasonal),
            Vec::new(),
        )
    }

    fn profile(age_group: AgeGroup, conditions: &[HealthCondition], activity: ActivityLevel) -> UserProfile {
        UserProfile {
            age_group,
            health_conditions: conditions.to_vec().into(),
            activity_level: activity,
        }
    }

    #[test]
    fn test_good_air_is_single_tip() {
        for p in [
            UserProfile::default(),
            profile(AgeGroup::Seniors, &[HealthCondition::Copd], ActivityLevel::High),
        ] {
            let advisory = advise(&reading(30, &[("Mon", 40), ("Tue", 100)]), &p);
            assert_eq!(advisory.tips, vec![TIP_GOOD_AIR.to_string()]);
            assert_eq!(advisory.proactive_tip, None);
        }
    }

    #[test]
    fn test_sensitive_and_active_at_120() {
        let p = profile(AgeGroup::Adults, &[HealthCondition::Asthma], ActivityLevel::High);
        let advisory = advise(&reading(120, &[]), &p);
        assert_eq!(
            advisory.tips,
            vec![
                TIP_SENSITIVE_REDUCE_EXERTION.to_string(),
                TIP_RESCHEDULE_EXERCISE.to_string(),
            ]
        );
    }

    #[test]
    fn test_non_sensitive_moderate_activity_at_120_gets_good_tip() {
        let advisory = advise(&reading(120, &[]), &UserProfile::default());
        assert_eq!(advisory.tips, vec![TIP_GOOD_AIR.to_string()]);
    }

    #[test]
    fn test_full_cascade_above_200() {
        let p = profile(AgeGroup::Children, &[HealthCondition::None], ActivityLevel::High);
        let advisory = advise(&reading(250, &[]), &p);
        assert_eq!(
            advisory.tips,
            vec![
                TIP_SENSITIVE_REDUCE_EXERTION,
                TIP_SENSITIVE_MASK,
                TIP_RESCHEDULE_EXERCISE,
                TIP_REDUCE_EXERTION_CLOSE_WINDOWS,
                TIP_HEPA_PURIFIER,
                TIP_AVOID_OUTDOORS,
            ]
        );
    }

    #[test]
    fn test_unhealthy_for_everyone() {
        let advisory = advise(&reading(151, &[]), &UserProfile::default());
        assert_eq!(
            advisory.tips,
            vec![TIP_REDUCE_EXERTION_CLOSE_WINDOWS, TIP_HEPA_PURIFIER]
        );
    }

    #[test]
    fn test_proactive_tip_uses_first_high_day() {
        let forecast = [("Mon", 90), ("Tue", 101), ("Wed", 180)];

        let sensitive = profile(AgeGroup::Seniors, &[], ActivityLevel::Low);
        assert_eq!(
            advise(&reading(40, &forecast), &sensitive).proactive_tip.as_deref(),
            Some("High AQI of 101 is forecasted for Tue. Plan to limit your time outdoors.")
        );

        let active = profile(AgeGroup::Adults, &[], ActivityLevel::High);
        assert_eq!(
            advise(&reading(40, &forecast), &active).proactive_tip.as_deref(),
            Some("High AQI of 101 is forecasted for Tue. Consider planning your outdoor exercise for a different day.")
        );

        assert_eq!(
            advise(&reading(40, &forecast), &UserProfile::default()).proactive_tip.as_deref(),
            Some("High AQI of 101 is forecasted for Tue. Be mindful of your outdoor activities.")
        );
    }

    #[test]
    fn test_empty_forecast_has_no_proactive_tip() {
        let advisory = advise(&reading(180, &[]), &UserProfile::default());
        assert!(advisory.proactive_tip.is_none());
    }

    #[test]
    fn test_advise_is_deterministic() {
        let r = reading(215, &[("Sat", 130)]);
        let p = profile(AgeGroup::Adults, &[HealthCondition::Pregnancy], ActivityLevel::Moderate);
        assert_eq!(advise(&r, &p), advise(&r, &p));
    }
}
