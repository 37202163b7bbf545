use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;

#[derive(Debug)]
/// A transport-level rejection, returned before any admission semantics
/// apply. Serialized as a small JSON body, never as an admission envelope.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });

        (self.status, axum::Json(payload)).into_response()
    }
}
