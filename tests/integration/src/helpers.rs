//! Test helpers for integration tests
//!
//! Provides the in-process test server, a webhook receiver, and response
//! assertions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{extract::State, http::StatusCode as AxumStatus, routing::post, Json, Router};
use khan_api::server::build_state;
use khan_api::{create_app, AppState};
use khan_cache::MemoryClanIndex;
use khan_common::AppConfig;
use khan_db::MemoryStore;
use parking_lot::Mutex;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub index: Arc<MemoryClanIndex>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryClanIndex::new());
        let state = build_state(config, store.clone(), index.clone()).await?;

        let app = create_app(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            state,
            store,
            index,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request without a body
    pub async fn post_empty(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).send().await?)
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.put(&url).json(body).send().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.delete(&url).send().await?)
    }

    /// Wait until queued webhook deliveries and index jobs are done
    pub async fn settle(&self) {
        if let Some(dispatcher) = self.state.dispatcher() {
            dispatcher.wait().await;
        }
        self.state.service_context().index_queue().wait().await;
    }
}

/// Defaults with a small webhook pool and a short delivery timeout
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.webhooks.workers = 2;
    config.webhooks.timeout = 2;
    config.search.backoff_ms = 1;
    config
}

/// Local webhook subscriber recording every POSTed body
#[derive(Clone)]
pub struct HookReceiver {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
}

impl HookReceiver {
    pub async fn start() -> Result<Self> {
        let received: Arc<Mutex<Vec<Value>>> = Arc::default();
        let app = Router::new()
            .route(
                "/hook",
                post(
                    |State(received): State<Arc<Mutex<Vec<Value>>>>,
                     Json(body): Json<Value>| async move {
                        received.lock().push(body);
                        AxumStatus::OK
                    },
                ),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, received })
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    /// Bodies received for an event type code
    pub fn of_type(&self, code: i64) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter(|body| body["type"].as_i64() == Some(code))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
