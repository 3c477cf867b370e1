//! Report-path telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct ReportInstruments {
    report_requests: Counter<u64>,
    report_duration_seconds: Histogram<f64>,
    report_rows_rendered: Histogram<u64>,
    report_bytes_rendered: Histogram<u64>,
    schema_drift: Counter<u64>,
}

fn instruments() -> &'static ReportInstruments {
    static INSTRUMENTS: OnceLock<ReportInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("meterview.report");
        ReportInstruments {
            report_requests: meter
                .u64_counter("meterview.report.requests")
                .with_description("Report render requests by outcome")
                .init(),
            report_duration_seconds: meter
                .f64_histogram("meterview.report.duration")
                .with_description("Report lookup, query and render latency")
                .with_unit("s")
                .init(),
            report_rows_rendered: meter
                .u64_histogram("meterview.report.rows_rendered")
                .with_description("Rows rendered per report")
                .init(),
            report_bytes_rendered: meter
                .u64_histogram("meterview.report.bytes_rendered")
                .with_description("Encoded report body size")
                .with_unit("By")
                .init(),
            schema_drift: meter
                .u64_counter("meterview.report.schema_drift")
                .with_description("Reports whose query columns no longer match the stored table")
                .init(),
        }
    })
}

pub struct ReportMetrics {
    pub outcome: &'static str,
    pub error_class: Option<&'static str>,
    pub api: &'static str,
    pub format: &'static str,
    pub duration_seconds: f64,
    pub rows_rendered: u64,
    pub bytes_rendered: u64,
}

pub fn record_report(metrics: ReportMetrics) {
    let i = instruments();
    let mut attrs = vec![
        KeyValue::new("outcome", metrics.outcome),
        KeyValue::new("api", metrics.api),
        KeyValue::new("format", metrics.format),
    ];
    if let Some(error_class) = metrics.error_class {
        attrs.push(KeyValue::new("error.class", error_class));
    }

    i.report_requests.add(1, &attrs);
    i.report_duration_seconds.record(metrics.duration_seconds, &attrs);
    i.report_rows_rendered.record(metrics.rows_rendered, &attrs);
    i.report_bytes_rendered.record(metrics.bytes_rendered, &attrs);
}

pub fn record_schema_drift() {
    instruments().schema_drift.add(1, &[]);
}
