//! Interruption taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of transient UI obstruction a pattern dismisses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionType {
    Cookie,
    Ad,
    Popup,
    Notification,
    Survey,
    Login,
    Paywall,
    Gdpr,
    AppPromotion,
    Newsletter,
    /// Operator-defined case outside the taxonomy.
    #[default]
    Custom,
}

impl InterruptionType {
    /// Every variant, in declaration order.
    pub const ALL: [InterruptionType; 11] = [
        Self::Cookie,
        Self::Ad,
        Self::Popup,
        Self::Notification,
        Self::Survey,
        Self::Login,
        Self::Paywall,
        Self::Gdpr,
        Self::AppPromotion,
        Self::Newsletter,
        Self::Custom,
    ];

    /// Wire name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::Ad => "ad",
            Self::Popup => "popup",
            Self::Notification => "notification",
            Self::Survey => "survey",
            Self::Login => "login",
            Self::Paywall => "paywall",
            Self::Gdpr => "gdpr",
            Self::AppPromotion => "app_promotion",
            Self::Newsletter => "newsletter",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for InterruptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown interruption type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown interruption type: {0}")]
pub struct UnknownInterruptionType(pub String);

impl FromStr for InterruptionType {
    type Err = UnknownInterruptionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownInterruptionType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&InterruptionType::AppPromotion).unwrap();
        assert_eq!(json, "\"app_promotion\"");

        let parsed: InterruptionType = serde_json::from_str("\"gdpr\"").unwrap();
        assert_eq!(parsed, InterruptionType::Gdpr);
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("Cookie".parse::<InterruptionType>().unwrap(), InterruptionType::Cookie);
        assert_eq!(
            "app-promotion".parse::<InterruptionType>().unwrap(),
            InterruptionType::AppPromotion
        );
        assert!("banner".parse::<InterruptionType>().is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for ty in InterruptionType::ALL {
            let wire = serde_json::to_value(ty).unwrap();
            assert_eq!(wire.as_str().unwrap(), ty.to_string());
        }
    }

    #[test]
    fn test_default_is_custom() {
        assert_eq!(InterruptionType::default(), InterruptionType::Custom);
    }
}
