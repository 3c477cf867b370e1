//! Prometheus datasource store and fetch through the HTTP API

mod common;

use common::{body_json, expect_error, TestApp};

use meterview::prelude::*;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream;
use meterview::ingest::TimeRange;
use std::sync::Arc;

const STORE: &str = "/api/v1/datasources/prometheus/store/ns/prom-ds";
const FETCH: &str = "/api/v1/datasources/prometheus/fetch/ns/prom-ds";
const TABLE: &str = "datasource_ns_prom_ds";

fn record(pod: &str, amount: f64, minute: u32) -> serde_json::Value {
    serde_json::json!({
        "labels": {"pod": pod},
        "amount": amount,
        "stepSize": 60_000_000_000i64,
        "timestamp": format!("2024-03-01T10:{:02}:00Z", minute),
    })
}

#[tokio::test]
async fn test_store_keeps_every_record_in_order() {
    let app = TestApp::new();
    let records: Vec<_> = (0..4).map(|i| record(&format!("pod-{}", i), i as f64, i)).collect();

    let response = app
        .post(STORE, serde_json::to_vec(&records).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({}));

    let stored = app
        .metrics
        .fetch_metrics(TABLE, TimeRange::default())
        .await
        .unwrap();
    let pods: Vec<_> = stored.iter().map(|r| r.labels["pod"].as_str()).collect();
    assert_eq!(pods, vec!["pod-0", "pod-1", "pod-2", "pod-3"]);
    assert_eq!(stored[2].step_size, 60_000_000_000);
}

#[tokio::test]
async fn test_empty_array_stores_nothing() {
    let app = TestApp::new();
    let response = app.post(STORE, " [ ] ").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.metrics.is_empty(TABLE));
}

#[tokio::test]
async fn test_malformed_record_stores_nothing() {
    let app = TestApp::new();
    let body = format!(
        "[{},{},{{\"labels\":{{}},\"amount\":\"lots\"}}]",
        record("a", 1.0, 0),
        record("b", 2.0, 1)
    );

    let message = expect_error(app.post(STORE, body).await, StatusCode::BAD_REQUEST).await;
    assert!(message.starts_with("unable to decode request body as JSON: "));
    assert!(app.metrics.is_empty(TABLE));
}

#[tokio::test]
async fn test_non_array_body_is_rejected() {
    let app = TestApp::new();
    for body in ["", "{}", "[1 2]", "[{\"amount\":1}"] {
        let response = app.post(STORE, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", body);
    }
    assert!(app.metrics.is_empty(TABLE));
}

#[tokio::test]
async fn test_chunked_body_is_decoded_as_it_arrives() {
    let app = TestApp::with_config(ApiServerConfig {
        max_body_size: 64,
        ..ApiServerConfig::default()
    });
    let records: Vec<_> = (0..8).map(|i| record("pod", i as f64, i)).collect();
    let payload = serde_json::to_vec(&records).unwrap();
    let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = payload
        .chunks(5)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();

    let response = app
        .post(STORE, Body::from_stream(stream::iter(chunks)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.metrics.len(TABLE), 8);
}

#[tokio::test]
async fn test_broken_chunked_body_stores_nothing() {
    let app = TestApp::new();
    let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from(format!("[{},", record("a", 1.0, 0)))),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
    ];
    let response = app
        .post(STORE, Body::from_stream(stream::iter(chunks)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.metrics.is_empty(TABLE));
}

#[tokio::test]
async fn test_fetch_filters_by_inclusive_range() {
    let app = TestApp::new();
    let records: Vec<_> = (0..5).map(|i| record("pod", i as f64, i)).collect();
    app.post(STORE, serde_json::to_vec(&records).unwrap()).await;

    let all = body_json(app.get(FETCH).await).await;
    assert_eq!(all.as_array().unwrap().len(), 5);

    let window = body_json(
        app.get(&format!(
            "{}?start=2024-03-01T10:01:00Z&end=2024-03-01T10:03:00%2B00:00",
            FETCH
        ))
        .await,
    )
    .await;
    let amounts: Vec<f64> = window
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_fetch_rejects_invalid_time() {
    let app = TestApp::new();
    let message = expect_error(
        app.get(&format!("{}?start=yesterday", FETCH)).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(message.contains("invalid start time"));
}

struct FullDisk;

#[async_trait]
impl MetricsRepository for FullDisk {
    async fn store_metrics(
        &self,
        _table: &str,
        _metrics: Vec<MetricRecord>,
    ) -> meterview::Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no space left on device",
        )))
    }

    async fn fetch_metrics(
        &self,
        _table: &str,
        _range: TimeRange,
    ) -> meterview::Result<Vec<MetricRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let reports = Arc::new(ReportService::new(
        Arc::new(LocalReportCatalog::new()),
        Arc::new(LocalResultsStore::new()),
    ));
    let router = build_http_router(ApiState::new(
        reports,
        Arc::new(FullDisk),
        ApiServerConfig::default(),
    ));
    let app = TestApp {
        router,
        ..TestApp::new()
    };

    let body = serde_json::to_vec(&vec![record("a", 1.0, 0)]).unwrap();
    let message = expect_error(
        app.post(STORE, body).await,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    assert_eq!(message, "unable to store metrics");
}
