use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::boost::{BoostEngine, BoostFactors, RecordId};
use crate::config::RankingConfig;
use crate::pipeline::{
    boost_router, BoostMessage, BoostPipelineService, BoostPublisher, BoostRepository,
    InMemoryBoostPublisher, InMemoryBoostRepository, PublishError, RecordLookup, RepositoryError,
    StoredBoostFactors,
};

pub(super) type MemoryService =
    BoostPipelineService<InMemoryBoostRepository, InMemoryBoostPublisher>;

pub(super) fn scoring_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

pub(super) fn ranking_config() -> RankingConfig {
    RankingConfig {
        doctype_ranking: BTreeMap::from([
            ("article".to_string(), 1),
            ("abstract".to_string(), 2),
        ]),
        collection_rankings: BTreeMap::from([(
            "astronomy".to_string(),
            BTreeMap::from([
                ("astronomy".to_string(), Some(2)),
                ("physics".to_string(), Some(1)),
            ]),
        )]),
        collections: vec!["astronomy".to_string(), "physics".to_string()],
        boost_factor_weights: BTreeMap::from([
            ("refereed_boost".to_string(), 0.6),
            ("doctype_boost".to_string(), 0.4),
            ("recency_boost".to_string(), 0.0),
        ]),
        recency_boost_multiplier: None,
        recency_boost_max_age_months: None,
    }
}

pub(super) fn engine() -> Arc<BoostEngine> {
    Arc::new(BoostEngine::new(&ranking_config()).expect("valid ranking config"))
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryBoostRepository>,
    Arc<InMemoryBoostPublisher>,
) {
    let repository = Arc::new(InMemoryBoostRepository::default());
    let publisher = Arc::new(InMemoryBoostPublisher::default());
    let service = BoostPipelineService::new(engine(), repository.clone(), publisher.clone())
        .with_scoring_date(scoring_date());
    (service, repository, publisher)
}

pub(super) fn refereed_article() -> Value {
    json!({
        "bibcode": "2024ApJ...960...1A",
        "bib_data": {
            "doctype": "article",
            "pubdate": "2024-01-00",
            "database": "astronomy"
        },
        "metrics": {"refereed": true}
    })
}

pub(super) fn abstract_without_bibcode() -> Value {
    json!({
        "bib_data": {
            "scix_id": "scix:0A1B-2C3D",
            "doctype": "abstract",
            "database": ["astronomy"]
        }
    })
}

pub(super) fn unidentified_record() -> Value {
    json!({"bib_data": {"doctype": "article"}})
}

pub(super) struct UnavailableRepository;

impl BoostRepository for UnavailableRepository {
    fn upsert(
        &self,
        _id: &RecordId,
        _factors: BoostFactors,
        _at: DateTime<Utc>,
    ) -> Result<StoredBoostFactors, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _lookup: &RecordLookup) -> Result<Vec<StoredBoostFactors>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<StoredBoostFactors>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FailingPublisher;

impl BoostPublisher for FailingPublisher {
    fn publish(&self, _message: BoostMessage) -> Result<(), PublishError> {
        Err(PublishError::Transport("broker unreachable".to_string()))
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    boost_router(Arc::new(service))
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}
