#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use tenant_org_api::app::{app, AppState};
use tenant_org_api::config::AppConfig;
use tenant_org_api::database::MemoryStore;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory backend so the binary needs no database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tenant-org-api"));
        cmd.env("APP_ENV", "development")
            .env("DATABASE_BACKEND", "memory")
            .env("API_HOST", "127.0.0.1")
            .env("API_PORT", port.to_string())
            .env("JWT_SECRET", "integration-secret")
            .env("SECURITY_BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// In-process router over a fresh in-memory store.
pub fn router() -> (Router, Arc<MemoryStore>) {
    let (state, store) = AppState::in_memory(AppConfig::for_testing()).expect("testing config is valid");
    (app(state), store)
}

/// Send one request through the router and decode the JSON body.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create an organization and return its login token.
pub async fn create_and_login(router: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/org/create",
        Some(serde_json::json!({
            "organization_name": name,
            "email": email,
            "password": password,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

    let (status, body) = send(
        router,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({ "email": email, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    body["token"]
        .as_str()
        .expect("token should be a string")
        .to_string()
}
