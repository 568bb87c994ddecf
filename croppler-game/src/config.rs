//! Game configuration.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EXCLUDED_COMMODITIES, DEFAULT_SHARE_URL, DEFAULT_YEAR};

/// Where a session's secret comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretSource {
    /// Drawn uniformly from the states present in the dataset
    #[default]
    Random,
    /// Always the same state
    Fixed { state: String },
}

/// Share link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default = "ShareConfig::default_url")]
    pub url: String,
    /// SMS recipient; empty lets the device pick
    #[serde(default)]
    pub recipient: String,
}

impl ShareConfig {
    fn default_url() -> String {
        DEFAULT_SHARE_URL.to_string()
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            recipient: String::new(),
        }
    }
}

/// Top-level configuration for a game deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_year")]
    pub year: i32,
    #[serde(default = "GameConfig::default_excluded_commodities")]
    pub excluded_commodities: Vec<String>,
    #[serde(default)]
    pub secret: SecretSource,
    #[serde(default)]
    pub share: ShareConfig,
}

impl GameConfig {
    const fn default_year() -> i32 {
        DEFAULT_YEAR
    }

    fn default_excluded_commodities() -> Vec<String> {
        DEFAULT_EXCLUDED_COMMODITIES
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Load configuration from a JSON string; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_secret(mut self, secret: SecretSource) -> Self {
        self.secret = secret;
        self
    }

    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            year: Self::default_year(),
            excluded_commodities: Self::default_excluded_commodities(),
            secret: SecretSource::default(),
            share: ShareConfig::default(),
        }
    }
}
