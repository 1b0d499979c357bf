// User health profile domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgeGroup {
    #[default]
    #[serde(rename = "All Ages", alias = "all")]
    All,
    #[serde(rename = "Children (0-17)", alias = "children")]
    Children,
    #[serde(rename = "Adults (18-64)", alias = "adults")]
    Adults,
    #[serde(rename = "Seniors (65+)", alias = "seniors")]
    Seniors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthCondition {
    #[serde(rename = "None", alias = "none")]
    None,
    #[serde(rename = "Asthma", alias = "asthma")]
    Asthma,
    #[serde(rename = "COPD", alias = "copd")]
    Copd,
    #[serde(rename = "Cardiovascular Disease", alias = "cardiovascular")]
    Cardiovascular,
    #[serde(rename = "Pregnancy", alias = "pregnancy")]
    Pregnancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[serde(rename = "Low (mostly indoors)", alias = "low")]
    Low,
    #[default]
    #[serde(rename = "Moderate (some outdoor activity)", alias = "moderate")]
    Moderate,
    #[serde(rename = "High (regular outdoor exercise)", alias = "high")]
    High,
}

impl AgeGroup {
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::All => "All Ages",
            AgeGroup::Children => "Children (0-17)",
            AgeGroup::Adults => "Adults (18-64)",
            AgeGroup::Seniors => "Seniors (65+)",
        }
    }
}

impl HealthCondition {
    #[cfg(test)]
    pub const ALL: [HealthCondition; 5] = [
        HealthCondition::None,
        HealthCondition::Asthma,
        HealthCondition::Copd,
        HealthCondition::Cardiovascular,
        HealthCondition::Pregnancy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HealthCondition::None => "None",
            HealthCondition::Asthma => "Asthma",
            HealthCondition::Copd => "COPD",
            HealthCondition::Cardiovascular => "Cardiovascular Disease",
            HealthCondition::Pregnancy => "Pregnancy",
        }
    }
}

impl ActivityLevel {
    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low (mostly indoors)",
            ActivityLevel::Moderate => "Moderate (some outdoor activity)",
            ActivityLevel::High => "High (regular outdoor exercise)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! label_from_str {
    ($ty:ty, $kind:literal, [$($variant:expr => $alias:literal),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($alias) || trimmed == $variant.label() {
                        return Ok($variant);
                    }
                )+
                Err(UnknownLabel { kind: $kind, value: s.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

label_from_str!(AgeGroup, "age group", [
    AgeGroup::All => "all",
    AgeGroup::Children => "children",
    AgeGroup::Adults => "adults",
    AgeGroup::Seniors => "seniors",
]);

label_from_str!(HealthCondition, "health condition", [
    HealthCondition::None => "none",
    HealthCondition::Asthma => "asthma",
    HealthCondition::Copd => "copd",
    HealthCondition::Cardiovascular => "cardiovascular",
    HealthCondition::Pregnancy => "pregnancy",
]);

label_from_str!(ActivityLevel, "activity level", [
    ActivityLevel::Low => "low",
    ActivityLevel::Moderate => "moderate",
    ActivityLevel::High => "high",
]);

/// Health conditions held by a user.
///
/// Never empty: `None` stands in when no real condition is held and is
/// dropped as soon as one is added. Selection order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HealthCondition>", into = "Vec<HealthCondition>")]
pub struct HealthConditions(Vec<HealthCondition>);

impl Default for HealthConditions {
    fn default() -> Self {
        Self(vec![HealthCondition::None])
    }
}

impl From<Vec<HealthCondition>> for HealthConditions {
    fn from(conditions: Vec<HealthCondition>) -> Self {
        let mut set = Self::default();
        for condition in conditions {
            set.insert(condition);
        }
        set
    }
}

impl From<HealthConditions> for Vec<HealthCondition> {
    fn from(set: HealthConditions) -> Self {
        set.0
    }
}

impl HealthConditions {
    pub fn contains(&self, condition: HealthCondition) -> bool {
        self.0.contains(&condition)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = HealthCondition> + '_ {
        self.0.iter().copied()
    }

    pub fn has_real_condition(&self) -> bool {
        self.0.iter().any(|c| *c != HealthCondition::None)
    }

    pub fn insert(&mut self, condition: HealthCondition) {
        if self.contains(condition) {
            return;
        }
        if condition == HealthCondition::None {
            self.0.clear();
        } else {
            self.0.retain(|c| *c != HealthCondition::None);
        }
        self.0.push(condition);
    }

    pub fn remove(&mut self, condition: HealthCondition) {
        self.0.retain(|c| *c != condition);
        if self.0.is_empty() {
            self.0.push(HealthCondition::None);
        }
    }

    /// Checkbox semantics: remove when held, add otherwise.
    pub fn toggle(&mut self, condition: HealthCondition) {
        if self.contains(condition) {
            self.remove(condition);
        } else {
            self.insert(condition);
        }
    }
}

/// Persisted as `{ageGroup, healthConditions, activityLevel}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub age_group: AgeGroup,
    #[serde(default)]
    pub health_conditions: HealthConditions,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

impl UserProfile {
    /// Elevated risk by condition or by age.
    pub fn is_sensitive(&self) -> bool {
        self.health_conditions.has_real_condition()
            || matches!(self.age_group, AgeGroup::Children | AgeGroup::Seniors)
    }
}
