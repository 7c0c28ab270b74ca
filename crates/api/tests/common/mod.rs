//! Shared helpers for API integration tests.
//!
//! The app runs on [`MemoryStore`] with a [`ManualClock`], so these tests
//! need no database and can move time to exercise lock expiry.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use folio_core::clock::ManualClock;
use folio_core::document::{BlockType, NewBlock, NewSection};
use folio_core::locking::LockPolicy;
use folio_core::memory::MemoryStore;
use folio_core::store::DocumentStore;
use folio_core::types::DbId;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use folio_api::config::ServerConfig;
use folio_api::middleware::auth::USER_ID_HEADER;
use folio_api::router::build_app_router;
use folio_api::state::AppState;

pub const ALICE: DbId = 101;
pub const BOB: DbId = 202;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

/// A project with one section holding one paragraph.
pub struct Seeded {
    pub project_id: DbId,
    pub section_id: DbId,
    pub block_id: DbId,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        lock_policy: LockPolicy::default(),
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(t0()));

    let state = AppState::new(config.lock_policy, store.clone(), clock.clone());

    TestApp {
        router: build_app_router(state, &config),
        store,
        clock,
    }
}

impl TestApp {
    pub async fn seed(&self, text: &str) -> Seeded {
        let project = self.store.create_project("Quarterly report").await;
        let section = self
            .store
            .insert_section(
                &NewSection {
                    project_id: project.id,
                    heading_text: "Summary".into(),
                    heading_level: 1,
                    order: 0,
                },
                t0(),
            )
            .await
            .unwrap();
        let block = self
            .store
            .insert_block(
                &NewBlock {
                    project_id: project.id,
                    section_id: section.id,
                    order: 0,
                    block_type: BlockType::Paragraph,
                    markdown_text: text.into(),
                },
                t0(),
            )
            .await
            .unwrap();
        Seeded {
            project_id: project.id,
            section_id: section.id,
            block_id: block.id,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<DbId>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            builder = builder.header(USER_ID_HEADER, user_id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: DbId) -> Response {
        self.send(Method::GET, uri, Some(user), None).await
    }

    pub async fn post_json(&self, uri: &str, user: DbId, body: Value) -> Response {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn post(&self, uri: &str, user: DbId) -> Response {
        self.send(Method::POST, uri, Some(user), None).await
    }

    pub async fn delete(&self, uri: &str, user: DbId) -> Response {
        self.send(Method::DELETE, uri, Some(user), None).await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Parse a JSON timestamp field.
pub fn timestamp(value: &Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).unwrap()
}
