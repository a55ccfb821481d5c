//! Boost-factor scoring for a single bibliographic record.
//!
//! Stages run in a fixed order: refereed, doctype and recency produce scalar
//! boosts, the composite scorer folds them into `boost_factor`, and the
//! collection resolver scales that factor per discipline.

mod collections;
mod composite;
mod doctype;
mod recency;
mod record;
mod refereed;

pub use collections::{CollectionWeights, MIN_COLLECTION_WEIGHT};
pub use composite::{BaseBoosts, BoostCombination};
pub use doctype::DoctypeScores;
pub use recency::{age_in_months, parse_date, RecencyDecay, DAYS_PER_MONTH};
pub use record::{
    normalize_collections, normalize_tag, RawBibData, RawMetrics, RawRecord, Record, RecordError,
    RecordId, GENERAL_COLLECTION,
};
pub use refereed::refereed_boost;

use chrono::{Local, NaiveDate};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ConfigError, RankingConfig};

/// Scoring engine built once from a ranking configuration.
///
/// Holds only precomputed, read-only tables, so one instance can be shared
/// across threads and score any number of records concurrently.
#[derive(Debug, Clone)]
pub struct BoostEngine {
    doctypes: DoctypeScores,
    collections: CollectionWeights,
    recency: RecencyDecay,
    combination: BoostCombination,
}

impl BoostEngine {
    /// Builds the engine, rejecting weights and recency constants that would
    /// take scores outside `[0, 1]`.
    pub fn new(config: &RankingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let doctypes = DoctypeScores::from_ranking(&config.doctype_ranking);
        if !doctypes.is_configured() {
            warn!("DOCTYPE_RANKING not configured, every doctype scores 0.0");
        }

        if config.collections.is_empty() {
            warn!("COLLECTIONS not configured, tracking the default disciplines");
        }
        let collections =
            CollectionWeights::from_rankings(&config.collection_rankings, config.disciplines());
        if !collections.is_configured() {
            warn!("COLLECTION_RANKINGS not configured, every discipline weighs 1.0");
        }

        Ok(Self {
            doctypes,
            collections,
            recency: RecencyDecay::from_config(config),
            combination: BoostCombination::from_config(&config.boost_factor_weights),
        })
    }

    pub fn disciplines(&self) -> &[String] {
        self.collections.disciplines()
    }

    /// Scores a record against today's local date.
    pub fn compute_boost_factors(&self, record: &Record) -> BoostFactors {
        self.compute_boost_factors_on(record, Local::now().date_naive())
    }

    /// Scores a record as of `today`. Same inputs always give the same output.
    pub fn compute_boost_factors_on(&self, record: &Record, today: NaiveDate) -> BoostFactors {
        let base = BaseBoosts {
            refereed: refereed_boost(record),
            doctype: self.doctypes.score(record.doctype.as_deref()),
            recency: self.recency.score(record.pubdate, record.entry_date, today),
        };
        let boost_factor = self.combination.combine(base);

        let disciplines = self
            .collections
            .weights(&record.collections)
            .into_iter()
            .map(|(discipline, weight)| DisciplineBoost {
                discipline,
                weight,
                final_boost: weight * boost_factor,
            })
            .collect();

        let factors = BoostFactors {
            refereed_boost: base.refereed,
            doctype_boost: base.doctype,
            recency_boost: base.recency,
            boost_factor,
            disciplines,
        };

        debug!(record = record.id.label(), boost_factor, "computed boost factors");
        factors
    }

    /// Normalizes and scores a raw record, rejecting it when unidentifiable.
    pub fn score(&self, raw: RawRecord, today: NaiveDate) -> Result<ScoredRecord, RecordError> {
        let record = Record::from_raw(raw)?;
        let factors = self.compute_boost_factors_on(&record, today);
        Ok(ScoredRecord {
            id: record.id,
            factors,
        })
    }
}

/// Weight and final boost for one tracked discipline.
#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineBoost {
    pub discipline: String,
    pub weight: f64,
    pub final_boost: f64,
}

/// Scores produced for one record.
///
/// Serializes as a flat map: the scalar boosts, `boost_factor`, every
/// `{discipline}_weight`, then every `{discipline}_final_boost`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostFactors {
    pub refereed_boost: f64,
    pub doctype_boost: f64,
    pub recency_boost: f64,
    pub boost_factor: f64,
    pub disciplines: Vec<DisciplineBoost>,
}

impl BoostFactors {
    pub fn discipline(&self, name: &str) -> Option<&DisciplineBoost> {
        self.disciplines
            .iter()
            .find(|entry| entry.discipline == name)
    }

    pub fn weight(&self, discipline: &str) -> Option<f64> {
        self.discipline(discipline).map(|entry| entry.weight)
    }

    pub fn final_boost(&self, discipline: &str) -> Option<f64> {
        self.discipline(discipline).map(|entry| entry.final_boost)
    }

    /// Every field in schema order.
    pub fn fields(&self) -> Vec<(String, f64)> {
        let mut fields = self.scalar_fields();
        fields.extend(
            self.disciplines
                .iter()
                .map(|entry| (format!("{}_weight", entry.discipline), entry.weight)),
        );
        fields.extend(self.final_boost_fields());
        fields
    }

    /// Fields carried downstream: scalars, `boost_factor` and final boosts.
    pub fn message_fields(&self) -> Vec<(String, f64)> {
        let mut fields = self.scalar_fields();
        fields.extend(self.final_boost_fields());
        fields
    }

    fn scalar_fields(&self) -> Vec<(String, f64)> {
        vec![
            ("refereed_boost".to_string(), self.refereed_boost),
            ("doctype_boost".to_string(), self.doctype_boost),
            ("recency_boost".to_string(), self.recency_boost),
            ("boost_factor".to_string(), self.boost_factor),
        ]
    }

    fn final_boost_fields(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.disciplines
            .iter()
            .map(|entry| (format!("{}_final_boost", entry.discipline), entry.final_boost))
    }
}

impl Serialize for BoostFactors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Boost factors paired with the identity they were computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub id: RecordId,
    #[serde(flatten)]
    pub factors: BoostFactors,
}
