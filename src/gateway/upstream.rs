//! Upstream transport.
//!
//! # Responsibilities
//! - Send one `ResolvedCall` to the management API
//! - Answer a Digest challenge with the caller's key pair
//! - Report exactly what was sent, for error diagnostics
//!
//! # Design Decisions
//! - `Upstream` is a trait so the gateway can run against a stub
//! - The digest handshake is authentication, not a retry: a second 401 is final
//! - One deadline bounds the whole exchange, handshake included
//! - Errors split into transport (no usable response) and internal

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::gateway::digest::{new_cnonce, DigestChallenge};
use crate::routing::{Credentials, ResolvedCall};

pub const USER_AGENT: &str = concat!("stream-console/", env!("CARGO_PKG_VERSION"));

/// Failure to obtain any response from the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// DNS, connect, deadline or a broken response body.
    #[error("{0}")]
    Transport(String),

    /// The request could not be built or sent for a local reason.
    #[error("{0}")]
    Internal(String),
}

/// The request as it went out on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub sent: SentRequest,
}

/// Executes resolved calls against the management API.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, call: &ResolvedCall, credentials: &Credentials) -> Result<UpstreamReply, UpstreamError>;
}

/// `reqwest`-backed upstream with Digest authentication.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    deadline: Duration,
}

impl HttpUpstream {
    /// Build a client whose whole exchange, challenge and signed request
    /// together, is bounded by `deadline`.
    pub fn new(deadline: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamError::Internal(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, deadline })
    }

    async fn dispatch(&self, call: &ResolvedCall, headers: &HeaderMap) -> Result<reqwest::Response, UpstreamError> {
        let mut request = self
            .client
            .request(call.method.clone(), call.url.clone())
            .headers(headers.clone());
        if let Some(body) = &call.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| UpstreamError::Internal(format!("failed to encode body: {}", e)))?;
            request = request.body(bytes);
        }
        request.send().await.map_err(classify)
    }

    async fn exchange(&self, call: &ResolvedCall, credentials: &Credentials) -> Result<UpstreamReply, UpstreamError> {
        let mut headers = base_headers(call);
        let first = self.dispatch(call, &headers).await?;

        if first.status() != StatusCode::UNAUTHORIZED {
            return collect(first, call, headers).await;
        }

        let challenge = first
            .headers()
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| DigestChallenge::parse(v).ok());
        let Some(challenge) = challenge else {
            tracing::warn!(route = call.label, "Upstream returned 401 without a usable Digest challenge");
            return collect(first, call, headers).await;
        };

        let authorization = challenge.authorize(
            &credentials.public_key,
            &credentials.private_key,
            call.method.as_str(),
            &request_target(&call.url),
            &new_cnonce(),
            1,
        );
        let value = HeaderValue::from_str(&authorization)
            .map_err(|e| UpstreamError::Internal(format!("invalid authorization header: {}", e)))?;
        headers.insert(header::AUTHORIZATION, value);

        let second = self.dispatch(call, &headers).await?;
        collect(second, call, headers).await
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, call: &ResolvedCall, credentials: &Credentials) -> Result<UpstreamReply, UpstreamError> {
        tokio::time::timeout(self.deadline, self.exchange(call, credentials))
            .await
            .map_err(|_| {
                UpstreamError::Transport(format!(
                    "upstream did not answer within {}s",
                    self.deadline.as_secs_f64()
                ))
            })?
    }
}

fn base_headers(call: &ResolvedCall) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(call.accept));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(call.content_type));
    headers
}

async fn collect(response: reqwest::Response, call: &ResolvedCall, headers: HeaderMap) -> Result<UpstreamReply, UpstreamError> {
    let status = response.status();
    let body = response.bytes().await.map_err(classify)?.to_vec();
    Ok(UpstreamReply {
        status,
        body,
        sent: SentRequest {
            method: call.method.clone(),
            url: call.url.clone(),
            headers,
        },
    })
}

/// Path and query, as used in the digest `uri` parameter.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_builder() {
        return UpstreamError::Internal(error_chain(&err));
    }
    UpstreamError::Transport(error_chain(&err))
}

/// Render an error together with its sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_target_keeps_query() {
        let url = Url::parse("https://h/api/x:start?a=1").unwrap();
        assert_eq!(request_target(&url), "/api/x:start?a=1");
        let url = Url::parse("https://h/api/x").unwrap();
        assert_eq!(request_target(&url), "/api/x");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let call = ResolvedCall {
            label: "processor.list",
            method: Method::GET,
            url: Url::parse(&format!("http://{}/streams", addr)).unwrap(),
            accept: "application/json",
            content_type: "application/json",
            body: None,
        };
        let creds = Credentials {
            public_key: "pub".into(),
            private_key: "priv".into(),
            project_id: "proj".into(),
            instance_name: None,
            api_host: addr.to_string(),
        };

        let upstream = HttpUpstream::new(Duration::from_secs(5)).unwrap();
        let err = upstream.send(&call, &creds).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }

    #[tokio::test]
    async fn test_deadline_covers_both_handshake_legs() {
        use wiremock::matchers::{any, header_exists};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let leg = Duration::from_millis(400);
        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(401)
                    .insert_header("WWW-Authenticate", r#"Digest realm="r", nonce="n", qop="auth""#)
                    .set_delay(leg),
            )
            .with_priority(10)
            .mount(&server)
            .await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})).set_delay(leg))
            .mount(&server)
            .await;

        let call = ResolvedCall {
            label: "processor.list",
            method: Method::GET,
            url: Url::parse(&format!("{}/streams", server.uri())).unwrap(),
            accept: "application/json",
            content_type: "application/json",
            body: None,
        };
        let creds = Credentials {
            public_key: "pub".into(),
            private_key: "priv".into(),
            project_id: "proj".into(),
            instance_name: None,
            api_host: server.address().to_string(),
        };

        // Each leg alone fits the deadline; the two together do not.
        let upstream = HttpUpstream::new(Duration::from_millis(600)).unwrap();
        let err = upstream.send(&call, &creds).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(ref m) if m.contains("did not answer")));
    }
}
