//! Tool call identity and payload.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for a single prospective tool execution.
pub type CallId = Uuid;

/// Tool arguments as an ordered key→value mapping.
///
/// The gateway treats arguments opaquely: only the tool name and user take
/// part in policy decisions. Insertion order is preserved so prompts and
/// digests are stable.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// A request by an agent to execute an external tool. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: CallId,
    pub tool_name: String,
    pub user_id: String,
    pub arguments: ToolArguments,
    pub requested_at: DateTime<Utc>,
}

impl ToolCall {
    /// Create a call with a fresh id, stamped now.
    pub fn new(
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
        arguments: ToolArguments,
    ) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            user_id: user_id.into(),
            arguments,
            requested_at: Utc::now(),
        }
    }

    /// Create a call with an explicit id (hosts that mint ids up front so
    /// they can cancel later).
    pub fn with_id(
        call_id: CallId,
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
        arguments: ToolArguments,
    ) -> Self {
        Self {
            call_id,
            tool_name: tool_name.into(),
            user_id: user_id.into(),
            arguments,
            requested_at: Utc::now(),
        }
    }

    /// SHA-256 digest of the serialized arguments, URL-safe base64 without
    /// padding. Audit records carry this instead of the raw arguments.
    pub fn arguments_digest(&self) -> String {
        let serialized = serde_json::to_vec(&self.arguments).unwrap_or_default();
        let digest = Sha256::digest(&serialized);
        URL_SAFE_NO_PAD.encode(digest)
    }
}
