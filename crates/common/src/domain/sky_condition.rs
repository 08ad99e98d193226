use serde::{Deserialize, Serialize};
use std::fmt;

/// Sky condition reported with a telemetry sample.
///
/// The first five variants are the vocabulary the collector emits. Sites may
/// report their own labels, which are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkyCondition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Other(String),
}

impl SkyCondition {
    pub fn as_str(&self) -> &str {
        match self {
            SkyCondition::Sunny => "Sunny",
            SkyCondition::PartlyCloudy => "Partly Cloudy",
            SkyCondition::Cloudy => "Cloudy",
            SkyCondition::Rainy => "Rainy",
            SkyCondition::Stormy => "Stormy",
            SkyCondition::Other(label) => label,
        }
    }

    /// Sunny or partly cloudy: counts toward optimal generation conditions
    pub fn is_clear(&self) -> bool {
        matches!(self, SkyCondition::Sunny | SkyCondition::PartlyCloudy)
    }

    /// Cloudy or rainy: counts toward cloud-cover efficiency loss (stormy does not)
    pub fn is_overcast(&self) -> bool {
        matches!(self, SkyCondition::Cloudy | SkyCondition::Rainy)
    }

    /// Map a WMO weather interpretation code to a sky condition.
    ///
    /// Codes outside the known ranges fall back to `Cloudy`.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0 => SkyCondition::Sunny,
            1 | 2 => SkyCondition::PartlyCloudy,
            3 => SkyCondition::Cloudy,
            51..=67 => SkyCondition::Rainy,
            80..=99 => SkyCondition::Stormy,
            _ => SkyCondition::Cloudy,
        }
    }
}

impl From<&str> for SkyCondition {
    fn from(label: &str) -> Self {
        match label {
            "Sunny" => SkyCondition::Sunny,
            "Partly Cloudy" => SkyCondition::PartlyCloudy,
            "Cloudy" => SkyCondition::Cloudy,
            "Rainy" => SkyCondition::Rainy,
            "Stormy" => SkyCondition::Stormy,
            other => SkyCondition::Other(other.to_string()),
        }
    }
}

impl From<String> for SkyCondition {
    fn from(label: String) -> Self {
        SkyCondition::from(label.as_str())
    }
}

impl From<SkyCondition> for String {
    fn from(condition: SkyCondition) -> Self {
        match condition {
            SkyCondition::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_round_trip() {
        for label in ["Sunny", "Partly Cloudy", "Cloudy", "Rainy", "Stormy"] {
            let condition = SkyCondition::from(label);
            assert!(!matches!(condition, SkyCondition::Other(_)));
            assert_eq!(condition.as_str(), label);
        }
    }

    #[test]
    fn test_site_specific_label_is_preserved() {
        let condition = SkyCondition::from("Hazy");
        assert_eq!(condition, SkyCondition::Other("Hazy".to_string()));
        assert_eq!(String::from(condition), "Hazy");
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert_eq!(
            SkyCondition::from("sunny"),
            SkyCondition::Other("sunny".to_string())
        );
    }

    #[test]
    fn test_clear_and_overcast_classification() {
        assert!(SkyCondition::Sunny.is_clear());
        assert!(SkyCondition::PartlyCloudy.is_clear());
        assert!(!SkyCondition::Cloudy.is_clear());

        assert!(SkyCondition::Cloudy.is_overcast());
        assert!(SkyCondition::Rainy.is_overcast());
        assert!(!SkyCondition::Stormy.is_overcast());
        assert!(!SkyCondition::Other("Fog".to_string()).is_overcast());
    }

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(SkyCondition::from_wmo_code(0), SkyCondition::Sunny);
        assert_eq!(SkyCondition::from_wmo_code(2), SkyCondition::PartlyCloudy);
        assert_eq!(SkyCondition::from_wmo_code(3), SkyCondition::Cloudy);
        assert_eq!(SkyCondition::from_wmo_code(45), SkyCondition::Cloudy);
        assert_eq!(SkyCondition::from_wmo_code(61), SkyCondition::Rainy);
        assert_eq!(SkyCondition::from_wmo_code(67), SkyCondition::Rainy);
        assert_eq!(SkyCondition::from_wmo_code(71), SkyCondition::Cloudy);
        assert_eq!(SkyCondition::from_wmo_code(95), SkyCondition::Stormy);
    }

    #[test]
    fn test_serde_uses_plain_labels() {
        let json = serde_json::to_string(&SkyCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"Partly Cloudy\"");

        let parsed: SkyCondition = serde_json::from_str("\"Rainy\"").unwrap();
        assert_eq!(parsed, SkyCondition::Rainy);
    }
}
