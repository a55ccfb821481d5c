use crate::infra::parse_date;
use chrono::NaiveDate;
use clap::Args;
use scix_boost::boost::{BoostEngine, RawRecord};
use scix_boost::config::{AppConfig, RankingConfig};
use scix_boost::error::AppError;
use scix_boost::pipeline::{
    BoostPipelineService, BoostRepository, InMemoryBoostPublisher, InMemoryBoostRepository,
};
use scix_boost::telemetry;
use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Records as a JSON array or one JSON object per line
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Ranking configuration file (defaults to BOOST_RANKING_CONFIG)
    #[arg(long)]
    pub(crate) ranking: Option<PathBuf>,
    /// Date recency is measured against (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Also write the scored rows to this CSV file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        input,
        ranking,
        today,
        export,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let ranking = match ranking {
        Some(path) => RankingConfig::from_path(path)?,
        None => config.ranking.load()?,
    };

    let mut payload = String::new();
    File::open(&input)?.read_to_string(&mut payload)?;
    let records = read_records(&payload)?;
    info!(records = records.len(), input = %input.display(), "scoring batch");

    let engine = BoostEngine::new(&ranking)?;
    let repository = Arc::new(InMemoryBoostRepository::default());
    let mut service = BoostPipelineService::new(
        Arc::new(engine),
        repository.clone(),
        Arc::new(InMemoryBoostPublisher::default()),
    );
    if let Some(today) = today {
        service = service.with_scoring_date(today);
    }

    let summary = service.process_batch(records);
    for failure in &summary.failures {
        warn!(index = failure.index, error = %failure.error, "record skipped");
    }

    for row in repository.all().map_err(scix_boost::pipeline::PipelineError::from)? {
        let line = serde_json::to_string(&row)
            .map_err(|err| AppError::Input(format!("unable to render row: {err}")))?;
        println!("{line}");
    }

    if let Some(path) = export {
        let writer = BufWriter::new(File::create(&path)?);
        let written = service.export_csv(writer, &[])?;
        info!(rows = written, path = %path.display(), "wrote boost factor export");
    }

    eprintln!(
        "Scored {} record(s), skipped {}",
        summary.processed,
        summary.failures.len()
    );
    Ok(())
}

/// Reads a JSON array of records, or JSON Lines when the payload is not an array.
pub(crate) fn read_records(payload: &str) -> Result<Vec<RawRecord>, AppError> {
    let trimmed = payload.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|err| AppError::Input(format!("invalid JSON array: {err}")))?;
        return values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                RawRecord::from_value(value)
                    .map_err(|err| AppError::Input(format!("record {index}: {err}")))
            })
            .collect();
    }

    payload
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            RawRecord::from_json(line)
                .map_err(|err| AppError::Input(format!("line {}: {err}", index + 1)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_arrays() {
        let records = read_records(
            r#"[
                {"bibcode": "2026PSJ.....7..101C"},
                {"bib_data": {"scix_id": "scix:4TQ8-K1ZR"}}
            ]"#,
        )
        .expect("array parses");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bibcode.as_deref(), Some("2026PSJ.....7..101C"));
    }

    #[test]
    fn reads_json_lines_and_skips_blank_lines() {
        let payload = "{\"bibcode\": \"2026SoPh..301...12H\"}\n\n{\"scix_id\": \"scix:9M3D-0WLE\"}\n";

        let records = read_records(payload).expect("lines parse");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].scix_id.as_deref(), Some("scix:9M3D-0WLE"));
    }

    #[test]
    fn reports_the_failing_line() {
        let payload = "{\"bibcode\": \"2026JGRE..131.1001T\"}\nnot json\n";

        match read_records(payload) {
            Err(AppError::Input(message)) => assert!(message.starts_with("line 2")),
            other => panic!("expected input error, got {other:?}"),
        }
    }
}
