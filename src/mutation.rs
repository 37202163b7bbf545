use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

// Marker label identifying the log cleanup jobs. The trailing colon in the
// key is part of the deployed label, not a typo here.
pub const LOGCLEAN_LABEL_KEY: &str = "logclean.daocloud.io/name:";
pub const LOGCLEAN_LABEL_VALUE: &str = "logclean-job";

pub const PRIORITY_CLASS_PATH: &str = "/spec/priorityClassName";
pub const DEFAULT_PRIORITY_CLASS: &str = "high-priority";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// One JSON Patch entry (RFC 6902). `value` holds any JSON-representable
/// payload and is omitted for `remove`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// The single mutation policy of this webhook, injected at construction:
/// Pods labeled `label_key: label_value` get their priority class replaced
/// with `priority_class`.
///
/// Pure decision logic, no I/O and no shared state.
#[derive(Clone, Debug)]
pub struct MutationRule {
    label_key: String,
    label_value: String,
    priority_class: String,
}

impl MutationRule {
    pub fn new(label_key: String, label_value: String, priority_class: String) -> Self {
        MutationRule {
            label_key,
            label_value,
            priority_class,
        }
    }

    /// Case-sensitive exact match against the pod's label map. No wildcard
    /// and no namespace scoping.
    pub fn should_mutate(&self, pod: &Pod) -> bool {
        pod.metadata
            .labels
            .as_ref()
            .is_some_and(|labels| labels.get(&self.label_key) == Some(&self.label_value))
    }

    /// The constant patch applied to matching Pods: an unconditional
    /// `replace` of the priority class, independent of the current value.
    pub fn build_patch(&self) -> Vec<PatchOperation> {
        vec![PatchOperation {
            op: PatchOp::Replace,
            path: PRIORITY_CLASS_PATH.to_owned(),
            value: Some(self.priority_class.clone().into()),
        }]
    }
}

impl Default for MutationRule {
    fn default() -> Self {
        MutationRule::new(
            LOGCLEAN_LABEL_KEY.to_owned(),
            LOGCLEAN_LABEL_VALUE.to_owned(),
            DEFAULT_PRIORITY_CLASS.to_owned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::collections::BTreeMap;

    fn pod_with_labels(labels: Option<&[(&str, &str)]>) -> Pod {
        let labels = labels.map(|pairs| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<String, String>>()
        });
        Pod {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                labels,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[rstest]
    #[case::exact_match(Some(&[("logclean.daocloud.io/name:", "logclean-job")][..]), true)]
    #[case::extra_labels_do_not_interfere(
        Some(&[("app", "cleanup"), ("logclean.daocloud.io/name:", "logclean-job")][..]),
        true
    )]
    #[case::wrong_value(Some(&[("logclean.daocloud.io/name:", "other-job")][..]), false)]
    #[case::case_sensitive_value(Some(&[("logclean.daocloud.io/name:", "Logclean-Job")][..]), false)]
    #[case::key_without_trailing_colon(Some(&[("logclean.daocloud.io/name", "logclean-job")][..]), false)]
    #[case::empty_label_map(Some(&[][..]), false)]
    #[case::no_labels(None, false)]
    fn should_mutate_requires_the_exact_marker_label(
        #[case] labels: Option<&[(&str, &str)]>,
        #[case] expected: bool,
    ) {
        let rule = MutationRule::default();
        assert_eq!(rule.should_mutate(&pod_with_labels(labels)), expected);
    }

    #[test]
    fn build_patch_is_a_single_unconditional_replace() {
        let patch = MutationRule::default().build_patch();

        assert_eq!(
            patch,
            vec![PatchOperation {
                op: PatchOp::Replace,
                path: "/spec/priorityClassName".to_owned(),
                value: Some("high-priority".into()),
            }]
        );
    }

    #[test]
    fn build_patch_does_not_depend_on_the_pod() {
        // the replace is unconditional, a pod that already has a priority
        // class gets the same patch
        let rule = MutationRule::default();
        assert_eq!(rule.build_patch(), rule.build_patch());
    }

    #[test]
    fn patch_serializes_to_the_rfc6902_wire_form() {
        let patch = MutationRule::default().build_patch();
        let serialized = serde_json::to_string(&patch).unwrap();

        assert_eq!(
            serialized,
            r#"[{"op":"replace","path":"/spec/priorityClassName","value":"high-priority"}]"#
        );
    }

    #[test]
    fn remove_operations_omit_the_value_field() {
        let op = PatchOperation {
            op: PatchOp::Remove,
            path: "/metadata/labels/app".to_owned(),
            value: None,
        };

        assert_eq!(
            serde_json::to_string(&op).unwrap(),
            r#"{"op":"remove","path":"/metadata/labels/app"}"#
        );
    }

    #[test]
    fn injected_rule_settings_are_honored() {
        let rule = MutationRule::new(
            "team".to_owned(),
            "batch".to_owned(),
            "low-priority".to_owned(),
        );

        assert!(rule.should_mutate(&pod_with_labels(Some(&[("team", "batch")]))));
        assert!(!rule.should_mutate(&pod_with_labels(Some(&[(
            "logclean.daocloud.io/name:",
            "logclean-job"
        )]))));
        assert_eq!(rule.build_patch()[0].value, Some("low-priority".into()));
    }
}
