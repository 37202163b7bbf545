use std::sync::Arc;

use axum::{
    body::Bytes,
    extract,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, Span};

use crate::admission_review::AdmissionReview;
use crate::api::{api_error::ApiError, service, state::ApiServerState};

// note about tracing: the span fields are recorded manually once the
// response is known, so a single "mutation" span carries the whole
// decode/decide/encode outcome for the request.
#[tracing::instrument(
    name = "mutation",
    fields(
        host = crate::config::HOSTNAME.as_str(),
        request_uid = tracing::field::Empty,
        allowed = tracing::field::Empty,
        mutated = tracing::field::Empty,
        response_message = tracing::field::Empty,
    ),
    skip_all)]
/// Handle one `POST /mutate` request end to end.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        debug!("rejecting request with empty body");
        return ApiError::new(StatusCode::BAD_REQUEST, "empty body").into_response();
    }

    // the admission contract requires exactly `application/json`, a
    // parameterized media type such as `application/json; charset=utf-8`
    // is rejected too
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type != mime::APPLICATION_JSON.as_ref() {
        debug!(
            content_type = content_type,
            "rejecting request with unsupported content type"
        );
        return ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("invalid Content-Type `{content_type}`, expected `application/json`"),
        )
        .into_response();
    }

    let review = service::review(&state.codec, &state.rule, &body);
    populate_span_with_admission_response(&review);

    match state.codec.encode_review(&review) {
        Ok(payload) => (
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
            payload,
        )
            .into_response(),
        Err(encode_error) => {
            // the envelope itself cannot be expressed, the admission
            // protocol is abandoned for this request
            error!(error = %encode_error, "cannot encode admission review response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("could not encode response: {encode_error}"),
            )
                .into_response()
        }
    }
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_admission_response(review: &AdmissionReview) {
    if let Some(response) = &review.response {
        Span::current().record("request_uid", response.uid.as_str());
        Span::current().record("allowed", response.allowed);
        Span::current().record("mutated", response.patch.is_some());
        if let Some(status) = &response.status {
            if let Some(message) = &status.message {
                Span::current().record("response_message", message.as_str());
            }
        }
    }
}
