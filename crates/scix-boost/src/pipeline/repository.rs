use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::boost::{BoostFactors, RecordId};

/// Persisted boost factors for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBoostFactors {
    #[serde(flatten)]
    pub id: RecordId,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(flatten)]
    pub factors: BoostFactors,
}

/// Single-identifier lookup against stored boost factors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    Bibcode(String),
    ScixId(String),
}

impl RecordLookup {
    pub fn matches(&self, id: &RecordId) -> bool {
        match self {
            RecordLookup::Bibcode(bibcode) => id.bibcode.as_deref() == Some(bibcode.as_str()),
            RecordLookup::ScixId(scix_id) => id.scix_id.as_deref() == Some(scix_id.as_str()),
        }
    }
}

/// Storage seam for computed boost factors.
///
/// `upsert` updates the row sharing either identifier with `id`, keeping its
/// `created` timestamp, and inserts a new row otherwise.
pub trait BoostRepository: Send + Sync {
    fn upsert(
        &self,
        id: &RecordId,
        factors: BoostFactors,
        at: DateTime<Utc>,
    ) -> Result<StoredBoostFactors, RepositoryError>;
    fn find(&self, lookup: &RecordLookup) -> Result<Vec<StoredBoostFactors>, RepositoryError>;
    fn all(&self) -> Result<Vec<StoredBoostFactors>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Downstream seam receiving one message per scored record.
pub trait BoostPublisher: Send + Sync {
    fn publish(&self, message: BoostMessage) -> Result<(), PublishError>;
}

/// Flat payload sent downstream: identity, boost values and send time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostMessage {
    pub bibcode: Option<String>,
    pub scix_id: Option<String>,
    #[serde(flatten)]
    pub boosts: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

impl BoostMessage {
    pub fn new(id: &RecordId, factors: &BoostFactors, timestamp: DateTime<Utc>) -> Self {
        Self {
            bibcode: id.bibcode.clone(),
            scix_id: id.scix_id.clone(),
            boosts: factors.message_fields().into_iter().collect(),
            timestamp,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("downstream transport unavailable: {0}")]
    Transport(String),
    #[error("unable to encode boost message: {0}")]
    Encode(#[from] serde_json::Error),
}
