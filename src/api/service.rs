use tracing::{info, warn};

use crate::admission_review::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use crate::codec::{Codec, DecodeError};
use crate::mutation::MutationRule;

/// Turn one raw request body into the outbound admission review envelope.
///
/// Decode failures never escape as transport errors: they are folded into an
/// `AdmissionResponse` carrying only `status.message`, so the API server
/// receives a structured rejection reason over a plain 200. The request UID
/// is echoed whenever the envelope decoded far enough to expose one.
pub(crate) fn review(codec: &Codec, rule: &MutationRule, body: &[u8]) -> AdmissionReview {
    let response = match codec.decode_review(body) {
        Ok(review) => match review.request {
            Some(request) => {
                let mut response = review_request(codec, rule, &request);
                response.uid = request.uid;
                response
            }
            None => {
                warn!("admission review carries no request");
                AdmissionResponse::error(DecodeError::MissingRequest.to_string())
            }
        },
        Err(error) => {
            warn!(error = %error, "cannot decode admission review");
            AdmissionResponse::error(error.to_string())
        }
    };

    AdmissionReview::new_with_response(response)
}

fn review_request(
    codec: &Codec,
    rule: &MutationRule,
    request: &AdmissionRequest,
) -> AdmissionResponse {
    // only Pods are inspected, every other kind is admitted untouched
    if request.kind.kind != "Pod" {
        info!(kind = %request.kind.kind, "kind is not inspected, admitting");
        return AdmissionResponse::allow();
    }

    let Some(object) = &request.object else {
        warn!("pod admission request carries no object");
        return AdmissionResponse::error(DecodeError::MissingObject.to_string());
    };

    let pod = match codec.decode_pod(&request.kind, object) {
        Ok(pod) => pod,
        Err(error) => {
            warn!(error = %error, "cannot decode embedded pod");
            return AdmissionResponse::error(error.to_string());
        }
    };

    if !rule.should_mutate(&pod) {
        info!("pod does not match the mutation rule, admitting unmodified");
        return AdmissionResponse::allow();
    }

    match serde_json::to_vec(&rule.build_patch()) {
        Ok(patch) => {
            info!(patch = %String::from_utf8_lossy(&patch), "mutating pod priority class");
            AdmissionResponse::allow_with_patch(patch)
        }
        Err(error) => {
            warn!(error = %error, "cannot serialize patch");
            AdmissionResponse::error(error.to_string())
        }
    }
}
