#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use mfa_graphql::{GraphqlClient, GraphqlClientBuilder};
use mfa_shopify::checker::ResourceChecker;
use mfa_shopify::config::RequirementsConfig;
use mfa_shopify::notify::Notifier;
use mfa_shopify::report::ReportWriter;
use mfa_shopify::types::{MissingRecord, ResourceType, ScanSummary};
use mfa_shopify::{AuditResult, Scanner};

/// In-memory Admin API: serves paged connections keyed by root field.
///
/// Edge cursors are `<connection>:<page>:<index>`, so a request's cursor
/// tells the responder which page to serve next.
#[derive(Default)]
pub struct FakeCatalog {
    pages: HashMap<&'static str, Vec<Vec<Value>>>,
    failing: Option<&'static str>,
    delay: Option<Duration>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `nodes` for `connection`, split into pages of the given sizes.
    pub fn with_pages(mut self, connection: &'static str, pages: Vec<Vec<Value>>) -> Self {
        self.pages.insert(connection, pages);
        self
    }

    /// Answer every request for `connection` with HTTP 500.
    pub fn failing(mut self, connection: &'static str) -> Self {
        self.failing = Some(connection);
        self
    }

    /// Hold every answer back by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn mount(self, server: &MockServer) {
        Mock::given(method("POST"))
            .respond_with(self)
            .mount(server)
            .await;
    }
}

/// Root connection named in a request body.
pub fn requested_connection(body: &Value) -> Option<&'static str> {
    let document = body["query"].as_str()?;
    ["products", "collections", "pages"]
        .into_iter()
        .find(|connection| document.contains(&format!("{connection}(first:")))
}

impl Respond for FakeCatalog {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let Some(connection) = requested_connection(&body) else {
            return ResponseTemplate::new(400).set_body_string("unknown connection");
        };
        if self.failing == Some(connection) {
            return ResponseTemplate::new(500).set_body_string("Internal Server Error");
        }

        let page_index = body["variables"]["cursor"]
            .as_str()
            .and_then(|cursor| cursor.split(':').nth(1))
            .and_then(|page| page.parse::<usize>().ok())
            .map_or(0, |page| page + 1);
        let pages = self.pages.get(connection).cloned().unwrap_or_default();
        let nodes = pages.get(page_index).cloned().unwrap_or_default();
        let has_next_page = page_index + 1 < pages.len();

        let edges: Vec<Value> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| json!({"cursor": format!("{connection}:{page_index}:{i}"), "node": node}))
            .collect();

        let response = ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                connection: {
                    "edges": edges,
                    "pageInfo": {"hasNextPage": has_next_page}
                }
            }
        }));
        match self.delay {
            Some(delay) => response.set_delay(delay),
            None => response,
        }
    }
}

pub fn product(id: u32, newsection: bool) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "handle": format!("producto-{id}"),
        "title": format!("Producto {id}"),
        "mf0": if newsection { json!({"id": format!("gid://shopify/Metafield/{id}")}) } else { Value::Null },
    })
}

pub fn page(id: u32, published: bool, familia: bool) -> Value {
    json!({
        "id": format!("gid://shopify/Page/{id}"),
        "handle": format!("pagina-{id}"),
        "title": format!("Página {id}"),
        "publishedAt": if published { json!("2024-05-01T10:00:00Z") } else { Value::Null },
        "mf0": if familia { json!({"id": "gid://shopify/Metafield/900"}) } else { Value::Null },
    })
}

/// Records every report request instead of writing a file.
#[derive(Default)]
pub struct RecordingReporter {
    pub calls: Mutex<Vec<Vec<MissingRecord>>>,
}

#[async_trait]
impl ReportWriter for RecordingReporter {
    async fn write(&self, records: &[MissingRecord], run_date: NaiveDate) -> AuditResult<PathBuf> {
        self.calls
            .lock()
            .expect("reporter lock")
            .push(records.to_vec());
        Ok(PathBuf::from(format!("/tmp/missing-metafields_{run_date}.xlsx")))
    }
}

/// Records every summary instead of sending mail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<ScanSummary>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &ScanSummary) -> AuditResult<()> {
        self.calls
            .lock()
            .expect("notifier lock")
            .push(summary.clone());
        Ok(())
    }
}

pub fn client_for(server: &MockServer) -> GraphqlClient {
    GraphqlClientBuilder::new(format!("{}/admin/api/2024-07/graphql.json", server.uri()))
        .with_service_name("shopify-test")
        .build()
        .expect("client")
}

pub fn checkers(requirements: &RequirementsConfig) -> Vec<ResourceChecker> {
    ResourceType::ALL
        .into_iter()
        .map(|resource_type| {
            ResourceChecker::new(
                resource_type,
                requirements.metafields(resource_type).expect("metafields"),
            )
        })
        .collect()
}

pub struct Harness {
    pub scanner: Scanner,
    pub reporter: Arc<RecordingReporter>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(server: &MockServer, requirements: &RequirementsConfig) -> Harness {
    let reporter = Arc::new(RecordingReporter::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let scanner = Scanner::new(
        client_for(server),
        checkers(requirements),
        reporter.clone(),
        notifier.clone(),
    );
    Harness {
        scanner,
        reporter,
        notifier,
    }
}

pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}
