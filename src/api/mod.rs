//! HTTP API
//!
//! Serves rendered reports (v1 and v2 routes) and the Prometheus datasource
//! store/fetch endpoints. Handlers return [`ApiError`] so every failure is
//! mapped to a status code and a `{"error": ...}` body in one place.

pub mod datasources;
pub mod reports;
mod telemetry;

pub use telemetry::ErrorClass;

use crate::ingest::MetricsRepository;
use crate::query::ReportService;
use crate::render::DEFAULT_PADDING;
use crate::Error;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Enable CORS
    pub enable_cors: bool,
    /// Tab padding used when a request does not set one
    pub default_padding: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            max_body_size: 16 * 1024 * 1024, // 16MB
            enable_cors: true,
            default_padding: DEFAULT_PADDING,
        }
    }
}

/// Build the HTTP API router
pub fn build_http_router(state: ApiState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let max_body_size = state.config.max_body_size;
    let enable_cors = state.config.enable_cors;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))

        // Reports
        .route("/api/v1/reports/get", get(reports::get_report_v1))
        .route("/api/v2/reports/:namespace/:name/full", get(reports::get_report_full))
        .route("/api/v2/reports/:namespace/:name/table", get(reports::get_report_table))

        // Prometheus datasources
        .route(
            "/api/v1/datasources/prometheus/store/:namespace/:datasource",
            post(datasources::store_metrics),
        )
        .route(
            "/api/v1/datasources/prometheus/fetch/:namespace/:datasource",
            get(datasources::fetch_metrics),
        )

        // State
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(middleware::from_fn(telemetry::track_requests));

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub reports: Arc<ReportService>,
    pub metrics: Arc<dyn MetricsRepository>,
    pub config: ApiServerConfig,
}

impl ApiState {
    pub fn new(
        reports: Arc<ReportService>,
        metrics: Arc<dyn MetricsRepository>,
        config: ApiServerConfig,
    ) -> Self {
        Self {
            reports,
            metrics,
            config,
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn ready_check() -> &'static str {
    // Collaborators are in-process, so serving means ready
    "READY"
}

/// Error returned by handlers, rendered as `{"error": "<message>"}`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidRequest(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NotReady(_) => StatusCode::ACCEPTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internal detail stays in the logs.
    pub fn message(&self) -> String {
        match &self.0 {
            Error::InvalidRequest(msg) => msg.clone(),
            Error::NotReady(_) => "Report is not processed yet".to_string(),
            Error::Upstream(msg) => msg.clone(),
            Error::SchemaViolation(_) => {
                "report results schema doesn't match expected schema".to_string()
            }
            Error::Decode(msg) => format!("unable to decode request body as JSON: {}", msg),
            Error::Storage(_) => "unable to store metrics".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let class = self.0.class();
        if status.is_server_error() {
            error!(error = %self.0, class, "request failed");
        }
        let mut response = (status, Json(serde_json::json!({ "error": self.message() })))
            .into_response();
        response.extensions_mut().insert(ErrorClass(class));
        response
    }
}

/// Fail when any of `fields` is absent or empty in the query parameters.
pub fn check_for_fields(fields: &[&str], params: &HashMap<String, String>) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| params.get(*field).map_or(true, |v| v.is_empty()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError(Error::InvalidRequest(format!(
            "the following fields are missing or empty: {}",
            missing.join(",")
        ))))
    }
}
