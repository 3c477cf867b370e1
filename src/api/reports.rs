//! Report rendering endpoints

use super::{check_for_fields, ApiError, ApiState};
use crate::query::{RenderedReport, ReportRequest};
use crate::render::{ApiVersion, OutputFormat, RenderMode, RenderOptions, MAX_PADDING};
use crate::Error;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;

/// GET /api/v1/reports/get?name=&namespace=&format=[&padding=][&ignore_failed=true]
pub async fn get_report_v1(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    check_for_fields(&["name", "namespace", "format"], &params)?;
    let request = report_request(
        &state,
        field(&params, "namespace"),
        field(&params, "name"),
        ApiVersion::V1,
        RenderMode::Full,
        &params,
    )?;
    render(&state, request).await
}

/// GET /api/v2/reports/:namespace/:name/full?format=
pub async fn get_report_full(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    get_report_v2(state, namespace, name, RenderMode::Full, params).await
}

/// GET /api/v2/reports/:namespace/:name/table?format=
pub async fn get_report_table(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    get_report_v2(state, namespace, name, RenderMode::Table, params).await
}

async fn get_report_v2(
    state: ApiState,
    namespace: String,
    name: String,
    mode: RenderMode,
    params: HashMap<String, String>,
) -> Result<Response, ApiError> {
    if name.is_empty() {
        let message = "the following fields are missing or empty: name".to_string();
        return Err(Error::InvalidRequest(message).into());
    }
    check_for_fields(&["format"], &params)?;
    let request = report_request(&state, &namespace, &name, ApiVersion::V2, mode, &params)?;
    render(&state, request).await
}

fn field<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

fn report_request(
    state: &ApiState,
    namespace: &str,
    name: &str,
    api: ApiVersion,
    mode: RenderMode,
    params: &HashMap<String, String>,
) -> Result<ReportRequest, ApiError> {
    let format = OutputFormat::parse(field(params, "format"))?;

    let padding = match params.get("padding").filter(|p| !p.is_empty()) {
        Some(raw) => parse_padding(raw)?,
        None => state.config.default_padding,
    };

    Ok(ReportRequest {
        namespace: namespace.to_string(),
        name: name.to_string(),
        options: RenderOptions::new(api, mode, format).with_padding(padding),
        ignore_failed: field(params, "ignore_failed") == "true",
    })
}

fn parse_padding(raw: &str) -> Result<usize, Error> {
    let padding = raw
        .parse::<usize>()
        .map_err(|e| Error::InvalidRequest(format!("invalid padding value {:?}: {}", raw, e)))?;
    if padding > MAX_PADDING {
        return Err(Error::InvalidRequest(format!(
            "invalid padding value {:?}: must be at most {}",
            raw, MAX_PADDING
        )));
    }
    Ok(padding)
}

async fn render(state: &ApiState, request: ReportRequest) -> Result<Response, ApiError> {
    let RenderedReport {
        filename,
        content_type,
        body,
        ..
    } = state.reports.render_report(&request).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response())
}
