//! Console endpoint handlers.
//!
//! Each inbound path is one row of `INBOUND_ROUTES`; `/api/action` takes the
//! resource and operation from the payload instead.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use crate::error::ConsoleError;
use crate::gateway::ResultEnvelope;
use crate::http::payload::Inbound;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{ActionRequest, ActionRouter, Credentials, Operation, ResolvedCall, Resource};

/// Where an inbound path takes its operation from.
#[derive(Debug, Clone, Copy)]
pub enum OperationSource {
    Fixed(Operation),
    /// The payload's `action` field, restricted to the listed operations.
    Action(&'static [Operation]),
}

/// One browser-facing endpoint.
#[derive(Debug, Clone, Copy)]
pub struct InboundRoute {
    pub path: &'static str,
    pub resource: Resource,
    pub operation: OperationSource,
    /// Payload key naming the processor or connection, if the path takes one.
    pub name_field: Option<&'static str>,
}

const fn inbound(
    path: &'static str,
    resource: Resource,
    operation: OperationSource,
    name_field: Option<&'static str>,
) -> InboundRoute {
    InboundRoute {
        path,
        resource,
        operation,
        name_field,
    }
}

const PROCESSOR_ACTIONS: &[Operation] = &[Operation::Start, Operation::Stop, Operation::Delete];
const CONNECTION_ACTIONS: &[Operation] = &[Operation::Delete];

use self::OperationSource::{Action, Fixed};

pub static INBOUND_ROUTES: &[InboundRoute] = &[
    inbound("/api/fetch_data", Resource::Processor, Fixed(Operation::List), None),
    inbound("/api/create_processor", Resource::Processor, Fixed(Operation::Create), None),
    inbound(
        "/api/get_processor_stats",
        Resource::Processor,
        Fixed(Operation::Get),
        Some("processor_name"),
    ),
    inbound(
        "/api/manage_processor",
        Resource::Processor,
        Action(PROCESSOR_ACTIONS),
        Some("processor_name"),
    ),
    inbound("/api/list_spis", Resource::StreamInstance, Fixed(Operation::List), None),
    inbound("/api/create_spi", Resource::StreamInstance, Fixed(Operation::Create), None),
    inbound("/api/delete_spi", Resource::StreamInstance, Fixed(Operation::Delete), None),
    inbound("/api/list_connections", Resource::Connection, Fixed(Operation::List), None),
    inbound("/api/create_connection", Resource::Connection, Fixed(Operation::Create), None),
    inbound(
        "/api/get_connection_details",
        Resource::Connection,
        Fixed(Operation::Get),
        Some("connection_name"),
    ),
    inbound(
        "/api/manage_connection",
        Resource::Connection,
        Action(CONNECTION_ACTIONS),
        Some("connection_name"),
    ),
];

/// Problem with the payload's `action` field.
enum ActionProblem {
    Missing,
    Unknown(String),
}

/// Handle a request to one of the fixed console endpoints.
pub async fn handle_inbound(route: &'static InboundRoute, state: AppState, headers: HeaderMap, body: Bytes) -> ResultEnvelope {
    let request_id = request_id(&headers);
    let prepared = Inbound::parse(&body).and_then(|payload| prepare_inbound(&state, route, &payload));
    finish(&state, prepared, &request_id).await
}

/// `POST /api/action`
pub async fn generic_action(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ResultEnvelope {
    let request_id = request_id(&headers);
    let prepared = Inbound::parse(&body).and_then(|payload| prepare_generic(&state, &payload));
    finish(&state, prepared, &request_id).await
}

/// `GET /status`
pub async fn status() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    }))
}

async fn finish(
    state: &AppState,
    prepared: Result<(ResolvedCall, Credentials), ConsoleError>,
    request_id: &str,
) -> ResultEnvelope {
    match prepared {
        Ok((call, credentials)) => state.gateway.execute(&call, &credentials, request_id).await,
        Err(err) => {
            tracing::warn!(request_id = %request_id, reason = err.kind(), error = %err, "Rejected console request");
            metrics::record_rejected(err.kind());
            err.into()
        }
    }
}

fn prepare_inbound(
    state: &AppState,
    route: &InboundRoute,
    payload: &Inbound,
) -> Result<(ResolvedCall, Credentials), ConsoleError> {
    let credentials = payload.credentials(&state.default_host)?;

    let (operation, problem) = match route.operation {
        Fixed(operation) => (operation, None),
        Action(allowed) => read_action(payload, allowed),
    };

    let mut request = ActionRequest::new(route.resource, operation);
    request.resource_name = route.name_field.and_then(|field| payload.text(field));
    if operation == Operation::Create {
        request.body = payload.body(route.resource.body_field());
    }

    let spec = ActionRouter::route_for(route.resource, operation).ok_or_else(|| ConsoleError::InvalidAction {
        resource: route.resource,
        action: operation.as_str().to_string(),
    })?;
    let mut missing = ActionRouter::missing_fields(spec, &request, &credentials);
    if matches!(problem, Some(ActionProblem::Missing)) {
        missing.push("action");
    }
    if !missing.is_empty() {
        return Err(ConsoleError::MissingFields(missing));
    }
    if let Some(ActionProblem::Unknown(action)) = problem {
        return Err(ConsoleError::InvalidAction {
            resource: route.resource,
            action,
        });
    }

    let call = state.router.resolve(&request, &credentials)?;
    Ok((call, credentials))
}

/// Operation named by `action`, falling back to the first allowed one so
/// the remaining required fields can still be reported.
fn read_action(payload: &Inbound, allowed: &[Operation]) -> (Operation, Option<ActionProblem>) {
    let fallback = allowed.first().copied().unwrap_or(Operation::Delete);
    match payload.text("action") {
        None => (fallback, Some(ActionProblem::Missing)),
        Some(action) => match action.parse::<Operation>() {
            Ok(operation) if allowed.contains(&operation) => (operation, None),
            _ => (fallback, Some(ActionProblem::Unknown(action))),
        },
    }
}

fn prepare_generic(state: &AppState, payload: &Inbound) -> Result<(ResolvedCall, Credentials), ConsoleError> {
    let mut credentials = payload.credentials(&state.default_host)?;

    let resource_text = payload.text("resource");
    let operation_text = payload.first_text(&["operation", "action"]);
    let (Some(resource_text), Some(operation_text)) = (resource_text.clone(), operation_text.clone()) else {
        let missing = [("resource", resource_text), ("operation", operation_text)]
            .into_iter()
            .filter_map(|(field, value)| value.is_none().then_some(field))
            .collect();
        return Err(ConsoleError::MissingFields(missing));
    };

    let resource: Resource = resource_text.parse().map_err(|_| ConsoleError::InvalidField {
        field: "resource",
        reason: format!("unknown resource '{}'", resource_text),
    })?;
    let operation: Operation = operation_text.parse().map_err(|_| ConsoleError::InvalidAction {
        resource,
        action: operation_text.clone(),
    })?;

    let name = payload.first_text(&["resource_name", resource.name_field()]);
    let mut request = ActionRequest::new(resource, operation);
    if resource == Resource::StreamInstance {
        // An instance is addressed through the instance slot, not a name slot.
        if name.is_some() {
            credentials.instance_name = name;
        }
    } else {
        request.resource_name = name;
    }
    request.body = payload.body("body").or_else(|| payload.body(resource.body_field()));

    let call = state.router.resolve(&request, &credentials)?;
    Ok((call, credentials))
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(crate::http::X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;

    use crate::config::ConsoleConfig;
    use crate::gateway::{AuthHeader, Gateway, SentRequest, Upstream, UpstreamError, UpstreamReply};

    /// Records every call and answers 204.
    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
        last: std::sync::Mutex<Option<ResolvedCall>>,
    }

    #[async_trait]
    impl Upstream for Recorder {
        async fn send(&self, call: &ResolvedCall, _credentials: &Credentials) -> Result<UpstreamReply, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(call.clone());
            Ok(UpstreamReply {
                status: StatusCode::NO_CONTENT,
                body: Vec::new(),
                sent: SentRequest {
                    method: call.method.clone(),
                    url: call.url.clone(),
                    headers: HeaderMap::new(),
                },
            })
        }
    }

    fn state(recorder: Arc<Recorder>) -> AppState {
        let config = ConsoleConfig::default();
        AppState::new(&config, Gateway::new(recorder, AuthHeader::Redact))
    }

    fn route(path: &str) -> &'static InboundRoute {
        INBOUND_ROUTES.iter().find(|r| r.path == path).unwrap()
    }

    fn creds(extra: Value) -> Bytes {
        let mut body = json!({"public_key": "pub", "private_key": "priv", "project_id": "proj"});
        if let (Value::Object(map), Value::Object(more)) = (&mut body, extra) {
            map.extend(more);
        }
        Bytes::from(body.to_string())
    }

    #[tokio::test]
    async fn test_manage_processor_start() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/manage_processor"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({"instance_name": "i1", "processor_name": "p1", "action": "start"})),
        )
        .await;

        assert_eq!(envelope, ResultEnvelope::Acknowledged);
        let call = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(call.method, axum::http::Method::POST);
        assert!(call.url.as_str().ends_with("/groups/proj/streams/i1/processor/p1:start"));
    }

    #[tokio::test]
    async fn test_missing_fields_are_reported_together() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/manage_processor"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({})),
        )
        .await;

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        let body = envelope.into_body();
        assert_eq!(body["error"], "Missing required fields.");
        assert_eq!(
            body["details"]["missing"],
            json!(["instance_name", "processor_name", "action"])
        );
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_credentials_checked_first() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/fetch_data"),
            state(recorder.clone()),
            HeaderMap::new(),
            Bytes::from(json!({"instance_name": "i1", "public_key": "pub"}).to_string()),
        )
        .await;
        let body = envelope.into_body();
        assert_eq!(body["details"]["missing"], json!(["private_key", "project_id"]));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_action_rejected_without_upstream_call() {
        let recorder = Arc::new(Recorder::default());
        for (path, name_field) in [
            ("/api/manage_processor", "processor_name"),
            ("/api/manage_connection", "connection_name"),
        ] {
            let envelope = handle_inbound(
                route(path),
                state(recorder.clone()),
                HeaderMap::new(),
                creds(json!({"instance_name": "i1", name_field: "x", "action": "restart"})),
            )
            .await;
            assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
            assert_eq!(envelope.into_body()["error"], "Invalid action specified.");
        }
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stats_is_not_a_manage_action() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/manage_processor"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({"instance_name": "i1", "processor_name": "p1", "action": "stats"})),
        )
        .await;
        assert_eq!(envelope.into_body()["error"], "Invalid action specified.");
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/list_spis"),
            state(recorder.clone()),
            HeaderMap::new(),
            Bytes::from_static(b"public_key=x"),
        )
        .await;
        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.into_body()["error"], "Invalid request format. Expected JSON.");
    }

    #[tokio::test]
    async fn test_create_connection_uses_versioned_content_type() {
        let recorder = Arc::new(Recorder::default());
        handle_inbound(
            route("/api/create_connection"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({"instance_name": "i1", "connection_body": {"name": "c1", "type": "Kafka"}})),
        )
        .await;
        let call = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(call.content_type, "application/vnd.atlas.2023-02-01+json");
        assert_eq!(call.body, Some(json!({"name": "c1", "type": "Kafka"})));
    }

    #[tokio::test]
    async fn test_empty_create_body_rejected_without_upstream_call() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/create_processor"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({"instance_name": "i1", "processor_body": {}})),
        )
        .await;
        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.into_body()["details"]["missing"], json!(["processor_body"]));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_spi_requires_object() {
        let recorder = Arc::new(Recorder::default());
        let envelope = handle_inbound(
            route("/api/create_spi"),
            state(recorder.clone()),
            HeaderMap::new(),
            creds(json!({"spi_body": "not an object"})),
        )
        .await;
        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generic_action() {
        let recorder = Arc::new(Recorder::default());
        let envelope = generic_action(
            State(state(recorder.clone())),
            HeaderMap::new(),
            creds(json!({"resource": "instance", "operation": "delete", "resource_name": "i9"})),
        )
        .await;
        assert_eq!(envelope, ResultEnvelope::Acknowledged);
        let call = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(call.method, axum::http::Method::DELETE);
        assert!(call.url.as_str().ends_with("/groups/proj/streams/i9"));
    }

    #[tokio::test]
    async fn test_generic_action_rejects_unknown_pair() {
        let recorder = Arc::new(Recorder::default());
        let envelope = generic_action(
            State(state(recorder.clone())),
            HeaderMap::new(),
            creds(json!({"resource": "connection", "action": "start", "instance_name": "i1", "resource_name": "c"})),
        )
        .await;
        assert_eq!(envelope.into_body()["error"], "Invalid action specified.");

        let envelope = generic_action(
            State(state(recorder.clone())),
            HeaderMap::new(),
            creds(json!({"operation": "list"})),
        )
        .await;
        assert_eq!(envelope.into_body()["details"]["missing"], json!(["resource"]));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_inbound_route_resolves_to_a_table_row() {
        for route in INBOUND_ROUTES {
            let operations: Vec<Operation> = match route.operation {
                Fixed(op) => vec![op],
                Action(allowed) => allowed.to_vec(),
            };
            for op in operations {
                assert!(ActionRouter::route_for(route.resource, op).is_some(), "{}", route.path);
            }
        }
    }
}
