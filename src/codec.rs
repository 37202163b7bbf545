use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use thiserror::Error;

use crate::admission_review::{self, AdmissionReview, GroupVersionKind};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed admission payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unrecognized kind {api_version}, Kind={kind}")]
    UnrecognizedKind { api_version: String, kind: String },
    #[error("admission review carries no request")]
    MissingRequest,
    #[error("admission request carries no object")]
    MissingObject,
}

#[derive(Debug, Error)]
#[error("cannot serialize admission review: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// The set of wire kinds the codec accepts, keyed by `(apiVersion, kind)`.
///
/// Built once at process start and read-only afterwards, so it can be shared
/// across concurrent requests without synchronization.
#[derive(Clone, Debug)]
pub struct KindRegistry {
    kinds: BTreeSet<(String, String)>,
}

impl KindRegistry {
    pub fn new() -> Self {
        KindRegistry {
            kinds: BTreeSet::new(),
        }
    }

    /// The kinds a mutating webhook has to understand: the admission review
    /// envelope (both served versions), the Pod kind and the Status metadata
    /// kind referenced by error responses.
    pub fn webhook_defaults() -> Self {
        Self::new()
            .with_kind("admission.k8s.io/v1", admission_review::KIND)
            .with_kind("admission.k8s.io/v1beta1", admission_review::KIND)
            .with_kind("v1", "Pod")
            .with_kind("meta.k8s.io/v1", "Status")
    }

    pub fn with_kind(mut self, api_version: &str, kind: &str) -> Self {
        self.kinds.insert((api_version.to_owned(), kind.to_owned()));
        self
    }

    pub fn recognizes(&self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .contains(&(api_version.to_owned(), kind.to_owned()))
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::webhook_defaults()
    }
}

/// Translates between wire bytes and the admission review data model.
/// Stateless apart from the registry injected at construction time.
pub struct Codec {
    registry: KindRegistry,
}

impl Codec {
    pub fn new(registry: KindRegistry) -> Self {
        Codec { registry }
    }

    /// Decode the outer admission review envelope. Unknown fields are
    /// ignored so newer API servers keep working; a missing or unrecognized
    /// envelope kind is a schema mismatch and fails the decode.
    pub fn decode_review(&self, payload: &[u8]) -> Result<AdmissionReview, DecodeError> {
        let review: AdmissionReview = serde_json::from_slice(payload)?;

        let api_version = review.api_version.as_deref().unwrap_or_default();
        let kind = review.kind.as_deref().unwrap_or_default();
        if !self.registry.recognizes(api_version, kind) {
            return Err(DecodeError::UnrecognizedKind {
                api_version: api_version.to_owned(),
                kind: kind.to_owned(),
            });
        }

        Ok(review)
    }

    /// Decode the raw embedded object as a Pod. Callers route here only for
    /// requests whose kind is Pod; any other kind is admitted without being
    /// parsed at all.
    pub fn decode_pod(
        &self,
        kind: &GroupVersionKind,
        object: &RawExtension,
    ) -> Result<Pod, DecodeError> {
        if !self.registry.recognizes(&kind.api_version(), &kind.kind) {
            return Err(DecodeError::UnrecognizedKind {
                api_version: kind.api_version(),
                kind: kind.kind.clone(),
            });
        }

        serde_json::from_value(object.0.clone()).map_err(DecodeError::from)
    }

    pub fn encode_review(&self, review: &AdmissionReview) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(review).map_err(EncodeError::from)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::new(KindRegistry::webhook_defaults())
    }
}
