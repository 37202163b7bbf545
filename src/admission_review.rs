use base64::{engine::general_purpose::STANDARD, Engine};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;

pub const API_VERSION: &str = "admission.k8s.io/v1";
pub const KIND: &str = "AdmissionReview";

/// Patch document format announced alongside a mutating response.
pub const JSON_PATCH: &str = "JSONPatch";

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
}

impl GroupVersionKind {
    /// The `apiVersion` form of the group/version pair, `v1` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// The envelope Kubernetes posts to the webhook and reads back from it.
///
/// Exactly one of `request`/`response` is populated per direction: the API
/// server fills `request`, the webhook answers with a fresh envelope carrying
/// only `response`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    pub fn new_with_response(response: AdmissionResponse) -> Self {
        AdmissionReview {
            response: Some(response),
            ..Default::default()
        }
    }
}

impl Default for AdmissionReview {
    fn default() -> Self {
        AdmissionReview {
            api_version: Some(String::from(API_VERSION)),
            kind: Some(String::from(KIND)),
            request: None,
            response: None,
        }
    }
}

/// The subset of the admission request the webhook consumes: the reviewed
/// object's kind, its raw serialized bytes and the correlation `uid`.
/// The remaining optional fields are carried for diagnostics only.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub kind: GroupVersionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl AdmissionResponse {
    /// Admit the object unmodified.
    pub fn allow() -> Self {
        AdmissionResponse {
            allowed: true,
            ..Default::default()
        }
    }

    /// Admit the object together with a serialized JSON Patch document.
    /// The patch travels base64-encoded, matching the `[]byte` wire encoding
    /// of the admission API, and always announces its `patchType`.
    pub fn allow_with_patch(patch: Vec<u8>) -> Self {
        AdmissionResponse {
            allowed: true,
            patch: Some(STANDARD.encode(patch)),
            patch_type: Some(String::from(JSON_PATCH)),
            ..Default::default()
        }
    }

    /// An admission-level failure: only `status.message` is set, `allowed`
    /// stays at its zero value and no patch is attached.
    pub fn error(message: String) -> Self {
        AdmissionResponse {
            status: Some(AdmissionResponseStatus {
                message: Some(message),
                code: None,
            }),
            ..Default::default()
        }
    }
}
