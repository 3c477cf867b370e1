//! Prometheus datasource store and fetch endpoints

use super::{ApiError, ApiState};
use crate::ingest::{self, MetricRecord, TimeRange};
use crate::metadata::datasource_table_name;
use crate::Error;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, error};

/// POST /api/v1/datasources/prometheus/store/:namespace/:datasource
///
/// The body is a JSON array of metric records, decoded while it streams in
/// and not subject to the request body limit. Nothing is stored unless the
/// whole array decodes.
pub async fn store_metrics(
    State(state): State<ApiState>,
    Path((namespace, datasource)): Path<(String, String)>,
    body: Body,
) -> Result<Json<serde_json::Value>, ApiError> {
    let table = datasource_table_name(&namespace, &datasource);
    let stream = body.into_data_stream();
    let stored = ingest::ingest_stream(state.metrics.as_ref(), &table, stream).await?;
    debug!(namespace = %namespace, datasource = %datasource, records = stored, "stored metrics");
    Ok(Json(serde_json::json!({})))
}

/// GET /api/v1/datasources/prometheus/fetch/:namespace/:datasource[?start=][&end=]
pub async fn fetch_metrics(
    State(state): State<ApiState>,
    Path((namespace, datasource)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<MetricRecord>>, ApiError> {
    let range = TimeRange::new(
        parse_time(&params, "start")?,
        parse_time(&params, "end")?,
    );
    let table = datasource_table_name(&namespace, &datasource);
    let records = state.metrics.fetch_metrics(&table, range).await.map_err(|e| {
        error!(
            namespace = %namespace,
            datasource = %datasource,
            error = %e,
            "unable to fetch metrics"
        );
        Error::Upstream("unable to fetch metrics (see server logs for details)".to_string())
    })?;
    Ok(Json(records))
}

fn parse_time(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match params.get(key).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                ApiError(Error::InvalidRequest(format!(
                    "invalid {} time {:?}: {}",
                    key, raw, e
                )))
            }),
    }
}
