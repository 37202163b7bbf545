use crate::codec::Codec;
use crate::mutation::MutationRule;

/// Shared, read-only per-process state handed to every request handler.
pub(crate) struct ApiServerState {
    pub(crate) codec: Codec,
    pub(crate) rule: MutationRule,
}
