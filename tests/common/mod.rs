//! Shared harness for in-process API tests

#![allow(dead_code)]

use meterview::prelude::*;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub catalog: Arc<LocalReportCatalog>,
    pub results: Arc<LocalResultsStore>,
    pub metrics: Arc<LocalMetricsRepository>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ApiServerConfig::default())
    }

    pub fn with_config(config: ApiServerConfig) -> Self {
        let catalog = Arc::new(LocalReportCatalog::new());
        let results = Arc::new(LocalResultsStore::new());
        let metrics = Arc::new(LocalMetricsRepository::new());
        let reports = Arc::new(ReportService::new(catalog.clone(), results.clone()));
        let router = build_http_router(ApiState::new(reports, metrics.clone(), config));
        Self {
            catalog,
            results,
            metrics,
            router,
        }
    }

    /// Registers report `ns/<name>` backed by query `<name>-query`.
    pub fn add_report(&self, name: &str, columns: Vec<Column>, rows: Vec<Row>) {
        let query_name = format!("{}-query", name);
        self.catalog.insert_report(Report::new("ns", name, &query_name));
        let actual = columns
            .iter()
            .map(|c| ActualColumn::new(c.name.clone(), c.column_type.clone()))
            .collect();
        self.catalog.insert_query(ReportQuery {
            namespace: "ns".to_string(),
            name: query_name,
            columns,
        });
        let table = ReportTable::new("ns", name, actual);
        self.results.insert_results(table.table_name.clone(), rows);
        self.catalog.insert_table(table);
    }

    /// The `cost`/`raw_id` report with a single row.
    pub fn with_cost_report(self) -> Self {
        self.add_report(
            "cost",
            vec![
                Column::new("cost", "double").with_unit("usd"),
                Column::new("raw_id", "varchar").hidden(),
            ],
            vec![Row::new().with("cost", 12.5).with("raw_id", "x1")],
        );
        self
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: impl Into<Body>) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_error(response: Response<Body>, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    body["error"].as_str().unwrap().to_string()
}
