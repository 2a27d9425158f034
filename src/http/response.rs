//! Envelope to HTTP response conversion.

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::gateway::ResultEnvelope;

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}
