use std::io::Write;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use super::export::{write_csv, ExportError};
use super::repository::{
    BoostMessage, BoostPublisher, BoostRepository, PublishError, RecordLookup, RepositoryError,
    StoredBoostFactors,
};
use crate::boost::{BoostEngine, RawRecord, RecordError, ScoredRecord};

/// Service composing the scoring engine with storage and downstream delivery.
pub struct BoostPipelineService<R, P> {
    engine: Arc<BoostEngine>,
    repository: Arc<R>,
    publisher: Arc<P>,
    scoring_date: Option<NaiveDate>,
}

impl<R, P> BoostPipelineService<R, P>
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    pub fn new(engine: Arc<BoostEngine>, repository: Arc<R>, publisher: Arc<P>) -> Self {
        Self {
            engine,
            repository,
            publisher,
            scoring_date: None,
        }
    }

    /// Pins "now" for recency scoring instead of the local calendar date.
    pub fn with_scoring_date(mut self, date: NaiveDate) -> Self {
        self.scoring_date = Some(date);
        self
    }

    pub fn engine(&self) -> &BoostEngine {
        &self.engine
    }

    fn today(&self) -> NaiveDate {
        self.scoring_date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Handle a JSON boost request from the upstream pipeline.
    pub fn handle_message(&self, payload: &str) -> Result<StoredBoostFactors, PipelineError> {
        let raw = RawRecord::from_json(payload)?;
        self.process(raw)
    }

    /// Score, store and publish one record.
    pub fn process(&self, raw: RawRecord) -> Result<StoredBoostFactors, PipelineError> {
        let scored = self.compute(raw)?;
        self.store_and_publish(scored)
    }

    fn store_and_publish(
        &self,
        scored: ScoredRecord,
    ) -> Result<StoredBoostFactors, PipelineError> {
        let now = Utc::now();

        let stored = self
            .repository
            .upsert(&scored.id, scored.factors.clone(), now)?;
        self.publisher
            .publish(BoostMessage::new(&scored.id, &scored.factors, now))?;

        info!(
            record = scored.id.label(),
            boost_factor = scored.factors.boost_factor,
            "stored and published boost factors"
        );
        Ok(stored)
    }

    /// Score one record without side effects.
    pub fn compute(&self, raw: RawRecord) -> Result<ScoredRecord, PipelineError> {
        self.engine.score(raw, self.today()).map_err(|err| {
            warn!(error = %err, "rejecting boost request");
            PipelineError::from(err)
        })
    }

    /// Look up stored factors by bibcode, then by scix_id.
    pub fn query(&self, record_id: &str) -> Result<Vec<StoredBoostFactors>, PipelineError> {
        let by_bibcode = self
            .repository
            .find(&RecordLookup::Bibcode(record_id.to_string()))?;
        if !by_bibcode.is_empty() {
            return Ok(by_bibcode);
        }

        let by_scix_id = self
            .repository
            .find(&RecordLookup::ScixId(record_id.to_string()))?;
        Ok(by_scix_id)
    }

    /// Export stored factors as CSV; every stored row when `record_ids` is empty.
    pub fn export_csv<W: Write>(
        &self,
        writer: W,
        record_ids: &[String],
    ) -> Result<usize, PipelineError> {
        let rows = if record_ids.is_empty() {
            self.repository.all()?
        } else {
            let mut rows: Vec<StoredBoostFactors> = Vec::new();
            for record_id in record_ids {
                for row in self.query(record_id)? {
                    if !rows.iter().any(|existing| existing.id == row.id) {
                        rows.push(row);
                    }
                }
            }
            rows
        };

        let written = write_csv(writer, self.engine.disciplines(), &rows)?;
        info!(rows = written, "exported boost factors");
        Ok(written)
    }

    /// Score records in parallel. Results keep input order.
    pub fn score_batch(
        &self,
        records: Vec<RawRecord>,
    ) -> Vec<Result<ScoredRecord, PipelineError>> {
        records
            .into_par_iter()
            .map(|raw| self.compute(raw))
            .collect()
    }

    /// Scores records in parallel, then stores and publishes them in input
    /// order. One failure does not stop the rest; when two records share an
    /// identifier the later one wins.
    pub fn process_batch(&self, records: Vec<RawRecord>) -> BatchSummary {
        let results: Vec<Result<StoredBoostFactors, PipelineError>> = self
            .score_batch(records)
            .into_iter()
            .map(|scored| scored.and_then(|scored| self.store_and_publish(scored)))
            .collect();

        let mut summary = BatchSummary::default();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(_) => summary.processed += 1,
                Err(err) => summary.failures.push(BatchFailure { index, error: err }),
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failures.len(),
            "finished boost batch"
        );
        summary
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub index: usize,
    pub error: PipelineError,
}

/// Error raised by the boost pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
