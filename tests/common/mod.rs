#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use greenlight::{AppConfig, AppState};

pub const PASSWORD: &str = "pa55word-for-tests";

/// In-process server on a free port, backed by the in-memory store. Aborted on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    task: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Development defaults with the limiter off so ordinary tests never see 429.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.limiter.enabled = false;
    config.server.request_timeout_secs = 30;
    config.security.jwt_secret = "integration-test-secret".to_string();
    config
}

pub async fn ensure_server() -> Result<TestServer> {
    spawn_server(test_config()).await
}

pub async fn spawn_server(config: AppConfig) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let state = AppState::in_memory(config)?;
    let app = greenlight::router(state).into_make_service_with_connect_info::<SocketAddr>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server failed: {e}");
        }
    });

    let server = TestServer {
        port,
        base_url,
        client: reqwest::Client::new(),
        task,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/healthcheck")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/users"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?)
    }

    pub async fn request_token(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/auth/token"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Register a fresh user and return a bearer token for them.
    pub async fn login_as(&self, email: &str) -> Result<String> {
        let res = self.register("Test User", email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.request_token(email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "token failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("token missing from response")
    }

    pub async fn create_movie(&self, token: &str, movie: &Value) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/movies"))
            .bearer_auth(token)
            .json(movie)
            .send()
            .await?)
    }
}

pub fn sample_movie() -> Value {
    json!({
        "title": "Up",
        "release_date": "2009-05-29",
        "runtime": 96,
        "genres": ["animation", "adventure"]
    })
}
