//! JSON-RPC method classification.
//!
//! # Responsibilities
//! - Split `<group>_<call>` on the first underscore
//! - Decide whether a call is replicated to secondary backends
//!
//! # Design Decisions
//! - Only `engine_*` calls change execution-layer state, so only they multicast
//! - Payload retrieval is backend-specific (each node builds its own block),
//!   so those calls are answered by the primary alone

/// Group of Engine API calls.
pub const ENGINE_GROUP: &str = "engine";

/// A parsed JSON-RPC method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcMethod<'a> {
    pub full: &'a str,
    pub group: &'a str,
    pub call: &'a str,
}

impl<'a> RpcMethod<'a> {
    /// Parse a method name. A name without an underscore is all group, no call.
    pub fn parse(full: &'a str) -> Self {
        let (group, call) = full.split_once('_').unwrap_or((full, ""));
        Self { full, group, call }
    }

    pub fn is_engine(&self) -> bool {
        self.group == ENGINE_GROUP
    }

    /// True when the call must also reach the secondary backends.
    pub fn should_multicast<S: AsRef<str>>(&self, excluded_calls: &[S]) -> bool {
        self.is_engine() && !excluded_calls.iter().any(|c| c.as_ref() == self.call)
    }
}
