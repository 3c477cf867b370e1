//! Report rendering through the HTTP API
//!
//! Covers the v1 and v2 routes end to end: column visibility across formats,
//! tab alignment, row-shape validation, and the error status mapping.

mod common;

use common::{body_json, body_string, expect_error, TestApp};

use meterview::prelude::*;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use std::sync::Arc;

// =========================================================================
// Visibility across formats
// =========================================================================

#[tokio::test]
async fn test_v1_csv_hides_hidden_column() {
    let app = TestApp::new().with_cost_report();
    let response = app
        .get("/api/v1/reports/get?namespace=ns&name=cost&format=csv")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=cost-query.csv"
    );
    assert_eq!(body_string(response).await, "cost\n12.500000\n");
}

#[tokio::test]
async fn test_v1_json_and_tabular_hide_hidden_column() {
    let app = TestApp::new().with_cost_report();

    let json = body_json(
        app.get("/api/v1/reports/get?namespace=ns&name=cost&format=json")
            .await,
    )
    .await;
    assert_eq!(json, serde_json::json!([{"cost": 12.5}]));

    let response = app
        .get("/api/v1/reports/get?namespace=ns&name=cost&format=tab")
        .await;
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=cost-query.tsv"
    );
    let tsv = body_string(response).await;
    assert!(!tsv.contains("raw_id"));
    assert!(!tsv.contains("x1"));
}

#[tokio::test]
async fn test_v2_full_json_shows_hidden_column() {
    let app = TestApp::new().with_cost_report();
    let body = body_json(app.get("/api/v2/reports/ns/cost/full?format=json").await).await;

    assert_eq!(
        body,
        serde_json::json!({
            "results": [{
                "values": [
                    {"name": "cost", "value": 12.5, "tableHidden": false, "unit": "usd"},
                    {"name": "raw_id", "value": "x1", "tableHidden": true}
                ]
            }]
        })
    );
}

#[tokio::test]
async fn test_v2_hides_hidden_outside_full_json() {
    let app = TestApp::new().with_cost_report();

    let csv = body_string(app.get("/api/v2/reports/ns/cost/full?format=csv").await).await;
    assert_eq!(csv, "cost\n12.500000\n");

    let table = body_json(app.get("/api/v2/reports/ns/cost/table?format=json").await).await;
    let values = table["results"][0]["values"].as_array().unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["name"], "cost");
}

#[tokio::test]
async fn test_emitted_field_count_matches_visible_columns() {
    let app = TestApp::new().with_cost_report();
    let cases = [
        ("/api/v1/reports/get?namespace=ns&name=cost&format=json", 1),
        ("/api/v2/reports/ns/cost/full?format=json", 2),
        ("/api/v2/reports/ns/cost/table?format=json", 1),
    ];
    for (uri, expected) in cases {
        let body = body_json(app.get(uri).await).await;
        let count = if let Some(rows) = body.as_array() {
            rows[0].as_object().unwrap().len()
        } else {
            body["results"][0]["values"].as_array().unwrap().len()
        };
        assert_eq!(count, expected, "{}", uri);
    }
}

// =========================================================================
// Delimited output
// =========================================================================

#[tokio::test]
async fn test_csv_line_count_is_rows_plus_header() {
    let app = TestApp::new();
    let rows = (0..5)
        .map(|i| Row::new().with("pod", format!("pod-{}", i)).with("cost", i as f64))
        .collect();
    app.add_report(
        "pods",
        vec![Column::new("pod", "varchar"), Column::new("cost", "double")],
        rows,
    );
    app.add_report(
        "empty",
        vec![Column::new("pod", "varchar"), Column::new("cost", "double")],
        Vec::new(),
    );

    let csv = body_string(
        app.get("/api/v1/reports/get?namespace=ns&name=pods&format=csv")
            .await,
    )
    .await;
    assert_eq!(csv.lines().count(), 6);
    assert_eq!(csv.lines().next(), Some("pod,cost"));

    let response = app
        .get("/api/v1/reports/get?namespace=ns&name=empty&format=csv")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "");

    let json = body_string(app.get("/api/v2/reports/ns/empty/full?format=json").await).await;
    assert_eq!(json, r#"{"results":[]}"#);
}

#[tokio::test]
async fn test_tabular_padding_parameter() {
    let app = TestApp::new();
    app.add_report(
        "pods",
        vec![Column::new("pod", "varchar"), Column::new("cost", "double")],
        vec![Row::new().with("pod", "frontend-7d9f").with("cost", 1.0)],
    );

    let default = body_string(
        app.get("/api/v1/reports/get?namespace=ns&name=pods&format=tabular")
            .await,
    )
    .await;
    assert_eq!(default, "pod\t\tcost\nfrontend-7d9f\t1.000000\n");

    let wide = body_string(
        app.get("/api/v1/reports/get?namespace=ns&name=pods&format=tabular&padding=4")
            .await,
    )
    .await;
    assert_eq!(wide, "pod\t\t\tcost\nfrontend-7d9f\t\t1.000000\n");
}

#[tokio::test]
async fn test_single_null_column_csv_is_blank_line() {
    let app = TestApp::new();
    app.add_report(
        "notes",
        vec![Column::new("note", "varchar")],
        vec![Row::new().with("note", ResultValue::Null)],
    );
    let body = body_string(
        app.get("/api/v1/reports/get?namespace=ns&name=notes&format=csv")
            .await,
    )
    .await;
    assert_eq!(body, "note\n\n");
}

#[tokio::test]
async fn test_configured_default_padding() {
    let app = TestApp::with_config(ApiServerConfig {
        default_padding: 4,
        ..ApiServerConfig::default()
    });
    app.add_report(
        "pods",
        vec![Column::new("pod", "varchar"), Column::new("cost", "double")],
        vec![Row::new().with("pod", "frontend-7d9f").with("cost", 1.0)],
    );
    let body = body_string(
        app.get("/api/v1/reports/get?namespace=ns&name=pods&format=tab")
            .await,
    )
    .await;
    assert_eq!(body, "pod\t\t\tcost\nfrontend-7d9f\t\t1.000000\n");
}

// =========================================================================
// Schema validation
// =========================================================================

#[tokio::test]
async fn test_extra_key_fails_without_partial_output() {
    let app = TestApp::new();
    app.add_report(
        "drift",
        vec![Column::new("pod", "varchar"), Column::new("cost", "double")],
        vec![
            Row::new().with("pod", "a").with("cost", 1.0),
            Row::new().with("pod", "b").with("cost", 2.0).with("extra", 3i64),
        ],
    );

    for format in ["csv", "json", "tabular"] {
        let response = app
            .get(&format!(
                "/api/v1/reports/get?namespace=ns&name=drift&format={}",
                format
            ))
            .await;
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let message = expect_error(response, StatusCode::INTERNAL_SERVER_ERROR).await;
        assert_eq!(message, "report results schema doesn't match expected schema");
    }
}

#[tokio::test]
async fn test_compound_value_in_csv_is_server_error() {
    let app = TestApp::new();
    app.add_report(
        "tags",
        vec![Column::new("tags", "array<varchar>")],
        vec![Row::new().with(
            "tags",
            ResultValue::Array(vec![ResultValue::from("a"), ResultValue::from("b")]),
        )],
    );

    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&name=tags&format=csv")
            .await,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    assert!(message.contains("unsupported value kind"));

    let json = body_json(
        app.get("/api/v1/reports/get?namespace=ns&name=tags&format=json")
            .await,
    )
    .await;
    assert_eq!(json, serde_json::json!([{"tags": ["a", "b"]}]));
}

// =========================================================================
// Request validation and report state
// =========================================================================

#[tokio::test]
async fn test_missing_fields_are_listed() {
    let app = TestApp::new().with_cost_report();
    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&format=").await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(message, "the following fields are missing or empty: name,format");

    let message = expect_error(
        app.get("/api/v2/reports/ns/cost/full").await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(message, "the following fields are missing or empty: format");
}

#[tokio::test]
async fn test_invalid_format_and_padding() {
    let app = TestApp::new().with_cost_report();
    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&name=cost&format=xml")
            .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(message, "format must be one of: csv, json or tabular");

    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&name=cost&format=tab&padding=-3")
            .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(message.starts_with("invalid padding value"));
}

#[tokio::test]
async fn test_padding_above_cap_is_rejected() {
    let app = TestApp::new().with_cost_report();
    for padding in ["18446744073709551615", "1025", "100000000"] {
        let message = expect_error(
            app.get(&format!(
                "/api/v1/reports/get?namespace=ns&name=cost&format=tab&padding={}",
                padding
            ))
            .await,
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert!(message.starts_with("invalid padding value"), "{}", message);
    }

    let response = app
        .get("/api/v2/reports/ns/cost/table?format=tabular&padding=1024")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_report_is_not_found() {
    let app = TestApp::new();
    let response = app
        .get("/api/v1/reports/get?namespace=ns&name=missing&format=csv")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unmaterialized_table_is_accepted() {
    let app = TestApp::new().with_cost_report();
    app.catalog.remove_table("ns", "cost");

    let message = expect_error(
        app.get("/api/v2/reports/ns/cost/table?format=csv").await,
        StatusCode::ACCEPTED,
    )
    .await;
    assert_eq!(message, "Report is not processed yet");
}

#[tokio::test]
async fn test_failed_report_unless_ignored() {
    let app = TestApp::new().with_cost_report();
    let mut report = Report::new("ns", "cost", "cost-query");
    report.mark_failed("presto query timed out");
    app.catalog.insert_report(report);

    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&name=cost&format=csv")
            .await,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    assert!(message.contains("GenerateReportFailed"));
    assert!(message.contains("presto query timed out"));

    let response = app
        .get("/api/v1/reports/get?namespace=ns&name=cost&format=csv&ignore_failed=true")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "cost\n12.500000\n");
}

// =========================================================================
// Upstream failures
// =========================================================================

struct FailingCatalog;

#[async_trait]
impl ReportCatalog for FailingCatalog {
    async fn get_report(&self, _namespace: &str, _name: &str) -> meterview::Result<Report> {
        Err(Error::Internal("connection refused".to_string()))
    }

    async fn get_query(&self, _namespace: &str, _name: &str) -> meterview::Result<ReportQuery> {
        Err(Error::Internal("connection refused".to_string()))
    }

    async fn get_report_table(
        &self,
        _namespace: &str,
        _report: &str,
    ) -> meterview::Result<ReportTable> {
        Err(Error::Internal("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_catalog_failure_hides_detail() {
    let reports = Arc::new(ReportService::new(
        Arc::new(FailingCatalog),
        Arc::new(LocalResultsStore::new()),
    ));
    let router = build_http_router(ApiState::new(
        reports,
        Arc::new(LocalMetricsRepository::new()),
        ApiServerConfig::default(),
    ));
    let app = TestApp {
        router,
        ..TestApp::new()
    };

    let message = expect_error(
        app.get("/api/v1/reports/get?namespace=ns&name=cost&format=csv")
            .await,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    assert!(!message.contains("connection refused"));
    assert!(message.contains("see server logs"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    assert_eq!(body_string(app.get("/health").await).await, "OK");
    assert_eq!(body_string(app.get("/ready").await).await, "READY");
}
