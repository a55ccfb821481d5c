use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use scix_boost::pipeline::{BoostMessage, BoostPublisher, PublishError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Publisher that emits each downstream message as a structured log line.
#[derive(Debug, Default, Clone)]
pub(crate) struct TracingBoostPublisher;

impl BoostPublisher for TracingBoostPublisher {
    fn publish(&self, message: BoostMessage) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&message)?;
        info!(target: "scix_boost::downstream", %payload, "boost update");
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
