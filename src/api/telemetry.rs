//! Per-request HTTP metrics and spans.
//!
//! Requests are labelled by API surface rather than raw path, and report
//! requests also by the requested format. Failures are counted under the
//! error class the handler returned, which [`ApiError`](super::ApiError)
//! leaves on the response as an [`ErrorClass`] extension.

use crate::render::OutputFormat;

use axum::body::Body;
use axum::extract::{MatchedPath, Query};
use axum::http::{Request, Uri};
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

/// [`Error::class`](crate::Error::class) of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClass(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    ReportsV1,
    ReportsV2,
    MetricsStore,
    MetricsFetch,
    Health,
    Unmatched,
}

impl Surface {
    fn of(route: Option<&str>) -> Self {
        let Some(route) = route else {
            return Surface::Unmatched;
        };
        if route.starts_with("/api/v1/reports/") {
            Surface::ReportsV1
        } else if route.starts_with("/api/v2/reports/") {
            Surface::ReportsV2
        } else if route.starts_with("/api/v1/datasources/prometheus/store/") {
            Surface::MetricsStore
        } else if route.starts_with("/api/v1/datasources/prometheus/fetch/") {
            Surface::MetricsFetch
        } else {
            Surface::Health
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Surface::ReportsV1 => "reports.v1",
            Surface::ReportsV2 => "reports.v2",
            Surface::MetricsStore => "metrics.store",
            Surface::MetricsFetch => "metrics.fetch",
            Surface::Health => "health",
            Surface::Unmatched => "unmatched",
        }
    }

    fn is_report(self) -> bool {
        matches!(self, Surface::ReportsV1 | Surface::ReportsV2)
    }
}

/// Canonical name of the `format` query parameter
fn requested_format(uri: &Uri) -> &'static str {
    let Ok(Query(params)) = Query::<HashMap<String, String>>::try_from_uri(uri) else {
        return "invalid";
    };
    match params.get("format").map(String::as_str) {
        None | Some("") => "none",
        Some(raw) => OutputFormat::parse(raw).map_or("invalid", |f| f.as_str()),
    }
}

struct HttpInstruments {
    requests: Counter<u64>,
    duration_seconds: Histogram<f64>,
    failures: Counter<u64>,
}

fn instruments() -> &'static HttpInstruments {
    static INSTRUMENTS: OnceLock<HttpInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("meterview.api");
        HttpInstruments {
            requests: meter
                .u64_counter("meterview.http.requests")
                .with_description("Requests by API surface and status")
                .init(),
            duration_seconds: meter
                .f64_histogram("meterview.http.duration")
                .with_description("Time from routing to response headers")
                .with_unit("s")
                .init(),
            failures: meter
                .u64_counter("meterview.http.failures")
                .with_description("Requests answered with an error body, by error class")
                .init(),
        }
    })
}

/// Records request count, latency and classified failures.
pub async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let surface = Surface::of(req.extensions().get::<MatchedPath>().map(MatchedPath::as_str));
    let format = surface.is_report().then(|| requested_format(req.uri()));

    let span = info_span!(
        "http.request",
        otel.kind = "server",
        http.request.method = %method,
        api.surface = surface.as_str(),
        report.format = format
    );
    let response = next.run(req).instrument(span).await;

    let mut attrs = vec![
        KeyValue::new("surface", surface.as_str()),
        KeyValue::new("method", method.to_string()),
        KeyValue::new("status", i64::from(response.status().as_u16())),
    ];
    if let Some(format) = format {
        attrs.push(KeyValue::new("format", format));
    }

    let i = instruments();
    i.requests.add(1, &attrs);
    i.duration_seconds.record(started.elapsed().as_secs_f64(), &attrs);

    if let Some(ErrorClass(class)) = response.extensions().get::<ErrorClass>().copied() {
        debug!(surface = surface.as_str(), class, status = %response.status(), "request failed");
        attrs.push(KeyValue::new("error.class", class));
        i.failures.add(1, &attrs);
    }

    response
}
