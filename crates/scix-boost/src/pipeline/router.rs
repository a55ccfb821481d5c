use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::repository::{BoostPublisher, BoostRepository};
use super::service::{BoostPipelineService, PipelineError};
use crate::boost::{RawRecord, RecordError};

/// Router builder exposing scoring, lookup and export endpoints.
pub fn boost_router<R, P>(service: Arc<BoostPipelineService<R, P>>) -> Router
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    Router::new()
        .route("/api/v1/boost/records", post(process_handler::<R, P>))
        .route(
            "/api/v1/boost/records/:record_id",
            get(lookup_handler::<R, P>),
        )
        .route("/api/v1/boost/compute", post(compute_handler::<R, P>))
        .route("/api/v1/boost/export", get(export_handler::<R, P>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportParams {
    /// Comma-separated bibcodes or scix_ids.
    #[serde(default)]
    pub(crate) ids: Option<String>,
}

pub(crate) async fn process_handler<R, P>(
    State(service): State<Arc<BoostPipelineService<R, P>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    let result = RawRecord::from_value(payload)
        .map_err(PipelineError::from)
        .and_then(|raw| service.process(raw));

    match result {
        Ok(stored) => (StatusCode::OK, axum::Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compute_handler<R, P>(
    State(service): State<Arc<BoostPipelineService<R, P>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    let result = RawRecord::from_value(payload)
        .map_err(PipelineError::from)
        .and_then(|raw| service.compute(raw));

    match result {
        Ok(scored) => (StatusCode::OK, axum::Json(scored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn lookup_handler<R, P>(
    State(service): State<Arc<BoostPipelineService<R, P>>>,
    Path(record_id): Path<String>,
) -> Response
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    match service.query(&record_id) {
        Ok(rows) if rows.is_empty() => {
            let payload = json!({
                "record_id": record_id,
                "error": "no boost factors stored for record",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Ok(rows) => {
            let payload = json!({
                "record_id": record_id,
                "boost_factors": rows,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<R, P>(
    State(service): State<Arc<BoostPipelineService<R, P>>>,
    Query(params): Query<ExportParams>,
) -> Response
where
    R: BoostRepository + 'static,
    P: BoostPublisher + 'static,
{
    let ids: Vec<String> = params
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let mut buffer = Vec::new();
    match service.export_csv(&mut buffer, &ids) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PipelineError) -> Response {
    let status = match &err {
        PipelineError::Record(RecordError::MissingIdentity) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Record(RecordError::Malformed(_)) => StatusCode::BAD_REQUEST,
        PipelineError::Repository(_) | PipelineError::Publish(_) | PipelineError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
