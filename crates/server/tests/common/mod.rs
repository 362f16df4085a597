//! In-process server fixture with mock adapters.
//!
//! Builds the real router over a temp SQLite store, with every resort served
//! by a scriptable `MockAdapter`, so API tests need no network.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use liftwatch_core::{
    auth::{BearerSecretAuthenticator, NoneAuthenticator},
    load_config_from_str,
    store::SqliteStatusStore,
    testing::MockAdapter,
    AdapterRegistry, AlertHandle, Authenticator, CollectionPipeline, OrchestratorConfig,
    RunAlert, StatusStore,
};
use liftwatch_server::{api::create_router, state::AppState};

pub use liftwatch_core::testing::fixtures;

pub const CRON_SECRET: &str = "test-cron-secret";

pub struct TestFixture {
    pub router: Router,
    pub adapter: Arc<MockAdapter>,
    pub store: Arc<dyn StatusStore>,
    pub pipeline: Arc<CollectionPipeline>,
    pub alerts: mpsc::Receiver<RunAlert>,
    pub temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with no trigger authentication and all resorts succeeding.
    pub fn new() -> Self {
        Self::build(MockAdapter::new(), false)
    }

    pub fn with_adapter(adapter: MockAdapter) -> Self {
        Self::build(adapter, false)
    }

    /// Fixture whose trigger routes require `CRON_SECRET`.
    pub fn with_secret() -> Self {
        Self::build(MockAdapter::new(), true)
    }

    fn build(adapter: MockAdapter, require_secret: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn StatusStore> = Arc::new(
            SqliteStatusStore::new(&temp_dir.path().join("test.db"))
                .expect("Failed to create store"),
        );

        let config = load_config_from_str(if require_secret {
            "[auth]\nmethod = \"bearer_secret\"\nsecret = \"test-cron-secret\"\n"
        } else {
            "[auth]\nmethod = \"none\"\n"
        })
        .expect("Failed to parse config");
        let authenticator: Arc<dyn Authenticator> = if require_secret {
            Arc::new(BearerSecretAuthenticator::new(CRON_SECRET))
        } else {
            Arc::new(NoneAuthenticator)
        };

        let adapter = Arc::new(adapter);
        let registry = fixtures::roster();
        let adapters = AdapterRegistry::uniform(registry.all_targets(), adapter.clone());
        let (tx, alerts) = mpsc::channel(16);

        let pipeline = Arc::new(CollectionPipeline::new(
            Arc::new(registry),
            adapters,
            Arc::clone(&store),
            AlertHandle::new(tx),
            OrchestratorConfig {
                adapter_timeout_ms: 2_000,
                max_concurrency: 0,
            },
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&pipeline),
            authenticator,
            None,
        ));

        Self {
            router: create_router(state),
            adapter,
            store,
            pipeline,
            alerts,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[]).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, &[]).await
    }

    pub async fn post_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("POST", path, headers).await
    }

    /// Raw text body, for non-JSON endpoints.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
