// AQI category bands
use serde::Serialize;

/// The six US AQI severity bands, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiCategory {
    pub level: AqiLevel,
    pub name: &'static str,
    /// Inclusive lower bound.
    pub min: u32,
    /// Inclusive upper bound; `None` for the open-ended top band.
    pub max: Option<u32>,
    pub class_name: &'static str,
    pub health_implications: &'static str,
    pub cautionary_statement: &'static str,
}

#[cfg(test)]
impl AqiCategory {
    pub fn contains(&self, index: u32) -> bool {
        index >= self.min && self.max.is_none_or(|max| index <= max)
    }
}

pub static AQI_CATEGORIES: [AqiCategory; 6] = [
    AqiCategory {
        level: AqiLevel::Good,
        name: "Good",
        min: 0,
        max: Some(50),
        class_name: "bg-green-500",
        health_implications: "Air quality is considered satisfactory, and air pollution poses little or no risk.",
        cautionary_statement: "Enjoy your usual outdoor activities.",
    },
    AqiCategory {
        level: AqiLevel::Moderate,
        name: "Moderate",
        min: 51,
        max: Some(100),
        class_name: "bg-yellow-500",
        health_implications: "Air quality is acceptable; however, for some pollutants there may be a moderate health concern for a very small number of people who are unusually sensitive to air pollution.",
        cautionary_statement: "Unusually sensitive people should consider reducing prolonged or heavy exertion outdoors.",
    },
    AqiCategory {
        level: AqiLevel::UnhealthyForSensitiveGroups,
        name: "Unhealthy for Sensitive Groups",
        min: 101,
        max: Some(150),
        class_name: "bg-orange-500",
        health_implications: "Members of sensitive groups may experience health effects. The general public is not likely to be affected.",
        cautionary_statement: "People with heart or lung disease, older adults, and children should reduce prolonged or heavy exertion.",
    },
    AqiCategory {
        level: AqiLevel::Unhealthy,
        name: "Unhealthy",
        min: 151,
        max: Some(200),
        class_name: "bg-red-500",
        health_implications: "Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects.",
        cautionary_statement: "Everyone should reduce prolonged or heavy exertion. It's advisable to reschedule strenuous activities outdoors.",
    },
    AqiCategory {
        level: AqiLevel::VeryUnhealthy,
        name: "Very Unhealthy",
        min: 201,
        max: Some(300),
        class_name: "bg-purple-500",
        health_implications: "Health alert: everyone may experience more serious health effects.",
        cautionary_statement: "Everyone should avoid all outdoor exertion.",
    },
    AqiCategory {
        level: AqiLevel::Hazardous,
        name: "Hazardous",
        min: 301,
        max: None,
        class_name: "bg-maroon-700",
        health_implications: "Health warnings of emergency conditions. The entire population is more likely to be affected.",
        cautionary_statement: "Everyone should remain indoors and keep activity levels low.",
    },
];

impl AqiLevel {
    pub fn from_index(index: u32) -> Self {
        match index {
            0..=50 => AqiLevel::Good,
            51..=100 => AqiLevel::Moderate,
            101..=150 => AqiLevel::UnhealthyForSensitiveGroups,
            151..=200 => AqiLevel::Unhealthy,
            201..=300 => AqiLevel::VeryUnhealthy,
            _ => AqiLevel::Hazardous,
        }
    }

    pub fn category(self) -> &'static AqiCategory {
        let slot = match self {
            AqiLevel::Good => 0,
            AqiLevel::Moderate => 1,
            AqiLevel::UnhealthyForSensitiveGroups => 2,
            AqiLevel::Unhealthy => 3,
            AqiLevel::VeryUnhealthy => 4,
            AqiLevel::Hazardous => 5,
        };
        &AQI_CATEGORIES[slot]
    }
}

/// Resolve an AQI value to its category. Total over every `u32`.
pub fn resolve_category(index: u32) -> &'static AqiCategory {
    AqiLevel::from_index(index).category()
}
