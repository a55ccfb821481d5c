use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Disciplines tracked when `COLLECTIONS` is not configured.
pub const DEFAULT_COLLECTIONS: [&str; 6] = [
    "astronomy",
    "physics",
    "earth_science",
    "planetary_science",
    "heliophysics",
    "general",
];

pub const DEFAULT_RECENCY_MULTIPLIER: f64 = 0.1;
pub const DEFAULT_RECENCY_MAX_AGE_MONTHS: f64 = 24.0;

pub const REFEREED_WEIGHT_KEY: &str = "refereed_boost";
pub const DOCTYPE_WEIGHT_KEY: &str = "doctype_boost";
pub const RECENCY_WEIGHT_KEY: &str = "recency_boost";

/// Ranking tables and constants consumed by the scoring engine.
///
/// Field names on the wire match the upper-case configuration keys. Every
/// section is optional; an empty section activates the documented fallback
/// for the stage that reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Doctype label to rank, lower is preferred.
    #[serde(rename = "DOCTYPE_RANKING", default)]
    pub doctype_ranking: BTreeMap<String, i64>,
    /// Collection tag to per-discipline rank, higher is more relevant.
    /// `null` ranks mark a discipline as unrelated.
    #[serde(rename = "COLLECTION_RANKINGS", default)]
    pub collection_rankings: BTreeMap<String, BTreeMap<String, Option<i64>>>,
    #[serde(rename = "COLLECTIONS", default)]
    pub collections: Vec<String>,
    #[serde(rename = "BOOST_FACTOR_WEIGHTS", default)]
    pub boost_factor_weights: BTreeMap<String, f64>,
    #[serde(
        rename = "RECENCY_BOOST_MULTIPLIER",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recency_boost_multiplier: Option<f64>,
    #[serde(
        rename = "RECENCY_BOOST_MAX_AGE_MONTHS",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recency_boost_max_age_months: Option<f64>,
}

impl RankingConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::RankingFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|err| match err {
            ConfigError::RankingJson { source, .. } => ConfigError::RankingJson {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)
            .map_err(|source| ConfigError::RankingJson { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot score with. Missing sections are fine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in &self.boost_factor_weights {
            if !value.is_finite() || *value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    key: key.clone(),
                    value: *value,
                });
            }
        }

        if let Some(multiplier) = self.recency_boost_multiplier {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(ConfigError::InvalidRecencyMultiplier(multiplier));
            }
        }

        if let Some(months) = self.recency_boost_max_age_months {
            if !months.is_finite() || months < 0.0 {
                return Err(ConfigError::InvalidRecencyHorizon(months));
            }
        }

        Ok(())
    }

    /// Tracked disciplines in configured order, duplicates removed.
    pub fn disciplines(&self) -> Vec<String> {
        if self.collections.is_empty() {
            return DEFAULT_COLLECTIONS.iter().map(|name| name.to_string()).collect();
        }

        let mut seen = Vec::with_capacity(self.collections.len());
        for name in &self.collections {
            if !seen.contains(name) {
                seen.push(name.clone());
            }
        }
        seen
    }

    pub fn recency_multiplier(&self) -> f64 {
        self.recency_boost_multiplier.unwrap_or(DEFAULT_RECENCY_MULTIPLIER)
    }

    pub fn recency_max_age_months(&self) -> f64 {
        self.recency_boost_max_age_months.unwrap_or(DEFAULT_RECENCY_MAX_AGE_MONTHS)
    }
}
