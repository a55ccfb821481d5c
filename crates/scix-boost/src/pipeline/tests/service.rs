use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::boost::{RawRecord, RecordError};
use crate::pipeline::{
    BoostPipelineService, BoostRepository, InMemoryBoostPublisher, InMemoryBoostRepository,
    PipelineError,
};

#[test]
fn process_stores_and_publishes_scores() {
    let (service, repository, publisher) = build_service();
    let raw = RawRecord::from_value(refereed_article()).expect("raw record");

    let stored = service.process(raw).expect("record processes");

    assert_eq!(stored.id.bibcode.as_deref(), Some("2024ApJ...960...1A"));
    assert_eq!(stored.factors.boost_factor, 1.0);
    assert_eq!(stored.factors.final_boost("astronomy"), Some(1.0));
    assert_eq!(
        repository.all().expect("rows").len(),
        1,
        "record should be persisted"
    );

    let messages = publisher.messages();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.bibcode.as_deref(), Some("2024ApJ...960...1A"));
    assert_eq!(message.scix_id, None);
    assert_eq!(message.boosts.get("boost_factor"), Some(&1.0));
    assert!(message.boosts.contains_key("physics_final_boost"));
    assert!(!message.boosts.contains_key("physics_weight"));
}

#[test]
fn handle_message_parses_json_payloads() {
    let (service, _, publisher) = build_service();

    let stored = service
        .handle_message(&abstract_without_bibcode().to_string())
        .expect("message handled");

    assert_eq!(stored.id.scix_id.as_deref(), Some("scix:0A1B-2C3D"));
    assert_eq!(stored.factors.refereed_boost, 0.0);
    assert_eq!(stored.factors.doctype_boost, 0.0);
    assert_eq!(publisher.messages().len(), 1);
}

#[test]
fn missing_identity_is_rejected_without_side_effects() {
    let (service, repository, publisher) = build_service();

    let err = service
        .handle_message(&unidentified_record().to_string())
        .expect_err("identity required");

    assert!(matches!(
        err,
        PipelineError::Record(RecordError::MissingIdentity)
    ));
    assert!(repository.all().expect("rows").is_empty());
    assert!(publisher.messages().is_empty());
}

#[test]
fn malformed_message_is_reported() {
    let (service, _, _) = build_service();

    let err = service
        .handle_message("not json at all")
        .expect_err("payload must be JSON");

    assert!(matches!(err, PipelineError::Record(RecordError::Malformed(_))));
}

#[test]
fn reprocessing_updates_existing_row() {
    let (service, repository, publisher) = build_service();

    let first = service
        .process(RawRecord::from_value(refereed_article()).expect("raw"))
        .expect("first pass");
    let second = service
        .process(RawRecord::from_value(refereed_article()).expect("raw"))
        .expect("second pass");

    assert_eq!(repository.all().expect("rows").len(), 1);
    assert_eq!(first.created, second.created);
    assert!(second.modified >= first.modified);
    assert_eq!(publisher.messages().len(), 2);
}

#[test]
fn query_falls_back_to_scix_id() {
    let (service, _, _) = build_service();
    service
        .handle_message(&abstract_without_bibcode().to_string())
        .expect("message handled");

    let rows = service.query("scix:0A1B-2C3D").expect("query succeeds");
    assert_eq!(rows.len(), 1);
    assert!(service.query("unknown").expect("query succeeds").is_empty());
}

#[test]
fn repository_failures_surface_and_skip_publishing() {
    let publisher = Arc::new(InMemoryBoostPublisher::default());
    let service = BoostPipelineService::new(
        engine(),
        Arc::new(UnavailableRepository),
        publisher.clone(),
    )
    .with_scoring_date(scoring_date());

    let err = service
        .process(RawRecord::from_value(refereed_article()).expect("raw"))
        .expect_err("repository offline");

    assert!(matches!(err, PipelineError::Repository(_)));
    assert!(publisher.messages().is_empty());
}

#[test]
fn publisher_failures_surface() {
    let service = BoostPipelineService::new(
        engine(),
        Arc::new(InMemoryBoostRepository::default()),
        Arc::new(FailingPublisher),
    )
    .with_scoring_date(scoring_date());

    let err = service
        .process(RawRecord::from_value(refereed_article()).expect("raw"))
        .expect_err("publisher offline");

    assert!(matches!(err, PipelineError::Publish(_)));
}

#[test]
fn batch_reports_failures_by_position() {
    let (service, repository, _) = build_service();
    let records = vec![
        RawRecord::from_value(refereed_article()).expect("raw"),
        RawRecord::from_value(unidentified_record()).expect("raw"),
        RawRecord::from_value(abstract_without_bibcode()).expect("raw"),
    ];

    let summary = service.process_batch(records);

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].index, 1);
    assert_eq!(repository.all().expect("rows").len(), 2);
}

#[test]
fn batch_stores_in_input_order_and_last_duplicate_wins() {
    let (service, repository, publisher) = build_service();
    let mut records: Vec<RawRecord> = (0..400)
        .map(|n| {
            RawRecord::from_value(json!({
                "bibcode": format!("b{n:04}"),
                "bib_data": {"doctype": "article"}
            }))
            .expect("raw")
        })
        .collect();
    records.push(
        RawRecord::from_value(json!({"bibcode": "b0007", "bib_data": {"doctype": "abstract"}}))
            .expect("raw"),
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(8)
        .build()
        .expect("thread pool builds");

    let summary = pool.install(|| service.process_batch(records));

    assert_eq!(summary.processed, 401);
    let rows = repository.all().expect("rows");
    let order: Vec<String> = rows
        .iter()
        .map(|row| row.id.bibcode.clone().unwrap_or_default())
        .collect();
    let expected: Vec<String> = (0..400).map(|n| format!("b{n:04}")).collect();
    assert_eq!(order, expected);
    assert_eq!(rows[7].factors.doctype_boost, 0.0);

    let messages = publisher.messages();
    assert_eq!(messages.len(), 401);
    assert_eq!(messages[0].bibcode.as_deref(), Some("b0000"));
    assert_eq!(messages[400].bibcode.as_deref(), Some("b0007"));
}

#[test]
fn score_batch_keeps_input_order() {
    let (service, repository, _) = build_service();
    let records = vec![
        RawRecord::from_value(abstract_without_bibcode()).expect("raw"),
        RawRecord::from_value(refereed_article()).expect("raw"),
    ];

    let results = service.score_batch(records);

    let first = results[0].as_ref().expect("first scores");
    let second = results[1].as_ref().expect("second scores");
    assert_eq!(first.id.scix_id.as_deref(), Some("scix:0A1B-2C3D"));
    assert_eq!(second.id.bibcode.as_deref(), Some("2024ApJ...960...1A"));
    assert!(repository.all().expect("rows").is_empty());
}

#[test]
fn export_filters_by_requested_ids() {
    let (service, _, _) = build_service();
    service
        .process(RawRecord::from_value(refereed_article()).expect("raw"))
        .expect("processed");
    service
        .process(RawRecord::from_value(abstract_without_bibcode()).expect("raw"))
        .expect("processed");

    let mut everything = Vec::new();
    let mut selected = Vec::new();
    let all_rows = service.export_csv(&mut everything, &[]).expect("export all");
    let some_rows = service
        .export_csv(&mut selected, &["scix:0A1B-2C3D".to_string()])
        .expect("export selection");

    assert_eq!(all_rows, 2);
    assert_eq!(some_rows, 1);
    let selected = String::from_utf8(selected).expect("utf8");
    assert!(selected.lines().nth(1).expect("data row").contains("scix:0A1B-2C3D"));
}
