use std::collections::BTreeMap;

use tracing::warn;

use crate::config::{DOCTYPE_WEIGHT_KEY, RECENCY_WEIGHT_KEY, REFEREED_WEIGHT_KEY};

/// The three scalar signals folded into `boost_factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseBoosts {
    pub refereed: f64,
    pub doctype: f64,
    pub recency: f64,
}

/// How the base boosts are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoostCombination {
    /// Weights already normalized to sum to 1.0.
    Weighted {
        refereed: f64,
        doctype: f64,
        recency: f64,
    },
    /// Configured weights summed to zero.
    Mean,
}

impl BoostCombination {
    pub const DEFAULT_REFEREED: f64 = 0.6;
    pub const DEFAULT_DOCTYPE: f64 = 0.4;
    pub const DEFAULT_RECENCY: f64 = 0.0;

    pub fn defaults() -> Self {
        Self::from_weights(
            Self::DEFAULT_REFEREED,
            Self::DEFAULT_DOCTYPE,
            Self::DEFAULT_RECENCY,
        )
    }

    /// Reads `refereed_boost`, `doctype_boost` and `recency_boost`; a key left
    /// out weighs 0.0. An empty map selects the defaults.
    pub fn from_config(weights: &BTreeMap<String, f64>) -> Self {
        if weights.is_empty() {
            warn!("BOOST_FACTOR_WEIGHTS not configured, using default weights");
            return Self::defaults();
        }

        let known = [REFEREED_WEIGHT_KEY, DOCTYPE_WEIGHT_KEY, RECENCY_WEIGHT_KEY];
        for key in weights.keys() {
            if !known.contains(&key.as_str()) {
                warn!(%key, "ignoring unknown BOOST_FACTOR_WEIGHTS entry");
            }
        }

        let weight = |key: &str| weights.get(key).copied().unwrap_or(0.0);
        Self::from_weights(
            weight(REFEREED_WEIGHT_KEY),
            weight(DOCTYPE_WEIGHT_KEY),
            weight(RECENCY_WEIGHT_KEY),
        )
    }

    pub fn from_weights(refereed: f64, doctype: f64, recency: f64) -> Self {
        let total = refereed + doctype + recency;
        if total > 0.0 {
            Self::Weighted {
                refereed: refereed / total,
                doctype: doctype / total,
                recency: recency / total,
            }
        } else {
            Self::Mean
        }
    }

    pub fn combine(&self, boosts: BaseBoosts) -> f64 {
        match *self {
            Self::Weighted {
                refereed,
                doctype,
                recency,
            } => refereed * boosts.refereed + doctype * boosts.doctype + recency * boosts.recency,
            Self::Mean => (boosts.refereed + boosts.doctype + boosts.recency) / 3.0,
        }
    }
}
