//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use md5::{Digest, Md5};
use serde_json::{json, Value};
use stream_console::config::ConsoleConfig;
use stream_console::http::ConsoleServer;
use stream_console::lifecycle::Shutdown;
use tokio::net::TcpListener;
use wiremock::matchers::header_exists;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PUBLIC_KEY: &str = "test-public";
pub const PRIVATE_KEY: &str = "test-private";
pub const PROJECT: &str = "proj1";
pub const REALM: &str = "MMS Public API";
pub const NONCE: &str = "nonce-7f3a";

/// A console listening on an ephemeral port.
pub struct Console {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl Console {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST `body` and return status plus decoded JSON.
    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing the upstream at `host` over plain HTTP.
pub fn config_for(host: &str) -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.scheme = "http".to_string();
    config.upstream.default_host = host.to_string();
    config.upstream.timeout_secs = 5;
    config
}

/// Boot a console with `config` on 127.0.0.1:0.
pub async fn start_console(config: ConsoleConfig) -> Console {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = ConsoleServer::new(&config).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Console { addr, shutdown, client }
}

/// Upstream that challenges unauthenticated requests with Digest.
///
/// Callers mount their own authenticated mocks; those carry
/// `header_exists("authorization")` and take priority over the challenge.
pub async fn start_digest_upstream() -> MockServer {
    start_slow_digest_upstream(Duration::ZERO).await
}

/// Like [`start_digest_upstream`], but the challenge arrives after `delay`.
pub async fn start_slow_digest_upstream(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header(
                    "WWW-Authenticate",
                    format!(r#"Digest realm="{}", domain="", nonce="{}", algorithm=MD5, qop="auth", stale=false"#, REALM, NONCE),
                )
                .set_delay(delay),
        )
        .with_priority(10)
        .mount(&server)
        .await;
    server
}

/// Mock answering authenticated requests that carry a correct digest.
pub fn authorized(method: &str, path: &str) -> wiremock::MockBuilder {
    Mock::given(wiremock::matchers::method(method))
        .and(wiremock::matchers::path(path))
        .and(header_exists("authorization"))
        .and(ValidDigest)
}

/// Host (`ip:port`) of a mock server.
pub fn host_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// Credential payload for `host`, plus `extra` fields.
pub fn payload(extra: Value) -> Value {
    let mut body = json!({
        "public_key": PUBLIC_KEY,
        "private_key": PRIVATE_KEY,
        "project_id": PROJECT,
    });
    if let (Value::Object(map), Value::Object(more)) = (&mut body, extra) {
        map.extend(more);
    }
    body
}

/// Requests the upstream saw that carried an `Authorization` header.
pub async fn authorized_requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.headers.contains_key("authorization"))
        .collect()
}

/// Checks a `qop=auth` MD5 digest response against the test key pair.
pub struct ValidDigest;

impl wiremock::Match for ValidDigest {
    fn matches(&self, request: &Request) -> bool {
        let Some(header) = request.headers.get("authorization").and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let Some(params) = header.strip_prefix("Digest ") else {
            return false;
        };
        let params: HashMap<&str, &str> = params
            .split(", ")
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k, v.trim_matches('"')))
            .collect();

        let hash = |s: String| hex::encode(Md5::digest(s.as_bytes()));
        let uri = params.get("uri").copied().unwrap_or_default();
        let ha1 = hash(format!("{}:{}:{}", PUBLIC_KEY, REALM, PRIVATE_KEY));
        let ha2 = hash(format!("{}:{}", request.method, uri));
        let expected = hash(format!(
            "{}:{}:{}:{}:auth:{}",
            ha1,
            NONCE,
            params.get("nc").copied().unwrap_or_default(),
            params.get("cnonce").copied().unwrap_or_default(),
            ha2
        ));

        params.get("username") == Some(&PUBLIC_KEY)
            && uri == request.url.path()
            && params.get("response") == Some(&expected.as_str())
    }
}
