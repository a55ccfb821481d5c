use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::recency::parse_date;

/// Collection assigned when a record carries no usable tags.
pub const GENERAL_COLLECTION: &str = "general";

/// Inbound record exactly as the upstream pipeline delivers it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub bibcode: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub scix_id: Option<String>,
    #[serde(default)]
    pub bib_data: Option<RawBibData>,
    #[serde(default)]
    pub metrics: Option<RawMetrics>,
    #[serde(default, deserialize_with = "tag_list")]
    pub classifications: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBibData {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub bibcode: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub scix_id: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub doctype: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub pubdate: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub entry_date: Option<String>,
    #[serde(default, deserialize_with = "tag_list")]
    pub database: Option<Vec<String>>,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub refereed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    #[serde(default, deserialize_with = "truthy_flag")]
    pub refereed: Option<bool>,
}

impl RawRecord {
    pub fn from_json(payload: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|err| RecordError::Malformed(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::Malformed(
                "record payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|err| RecordError::Malformed(err.to_string()))
    }

    /// Identifier pair, preferring top-level values over `bib_data`.
    pub fn identity(&self) -> RecordId {
        let bib = self.bib_data.as_ref();
        RecordId {
            bibcode: self
                .bibcode
                .clone()
                .or_else(|| bib.and_then(|data| data.bibcode.clone())),
            scix_id: self
                .scix_id
                .clone()
                .or_else(|| bib.and_then(|data| data.scix_id.clone())),
        }
    }
}

/// The two alternative identifiers of a bibliographic record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub bibcode: Option<String>,
    pub scix_id: Option<String>,
}

impl RecordId {
    pub fn is_resolved(&self) -> bool {
        self.bibcode.is_some() || self.scix_id.is_some()
    }

    /// Label for logs: bibcode when present, else scix_id.
    pub fn label(&self) -> &str {
        self.bibcode
            .as_deref()
            .or(self.scix_id.as_deref())
            .unwrap_or("<unidentified>")
    }
}

/// Canonical record shape every scoring stage reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub refereed: bool,
    pub doctype: Option<String>,
    pub pubdate: Option<NaiveDate>,
    pub entry_date: Option<NaiveDate>,
    pub collections: Vec<String>,
}

impl Record {
    pub fn from_raw(raw: RawRecord) -> Result<Self, RecordError> {
        let id = raw.identity();
        if !id.is_resolved() {
            return Err(RecordError::MissingIdentity);
        }

        let bib = raw.bib_data.unwrap_or_default();
        let refereed = raw
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.refereed)
            .unwrap_or(false)
            || bib.refereed.unwrap_or(false);

        let doctype = bib
            .doctype
            .as_deref()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        let tags = raw.classifications.or(bib.database).unwrap_or_default();

        Ok(Self {
            id,
            refereed,
            doctype,
            pubdate: bib.pubdate.as_deref().and_then(parse_date),
            entry_date: bib.entry_date.as_deref().and_then(parse_date),
            collections: normalize_collections(tags),
        })
    }
}

/// Lowercases tags, swaps spaces for underscores and defaults to `general`.
pub fn normalize_collections<I>(tags: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }

    if normalized.is_empty() {
        normalized.push(GENERAL_COLLECTION.to_string());
    }
    normalized
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record has neither a bibcode nor a scix_id")]
    MissingIdentity,
    #[error("malformed record: {0}")]
    Malformed(String),
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Accepts a single tag or a list of tags. Non-string list entries are
/// stringified and nulls are dropped.
///
/// An empty string or empty list reads as absent. Anything else is kept as
/// given; blank tags are discarded later by `normalize_collections`.
fn tag_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(tag)) if !tag.is_empty() => Some(vec![tag]),
        Some(Value::Array(items)) if !items.is_empty() => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Null => None,
                    Value::String(tag) => Some(tag),
                    other => Some(other.to_string()),
                })
                .collect(),
        ),
        _ => None,
    })
}

fn truthy_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(number)) => Some(number.as_f64().map_or(false, |n| n != 0.0)),
        Some(Value::String(text)) => Some(matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        )),
        _ => None,
    })
}
