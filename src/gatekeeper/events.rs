//! Progress events for host UIs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ReplyOutcome;
use crate::policy::PolicyDecision;
use crate::types::{CallId, Decision};

/// Callback used for streaming gate events.
pub type GateEventSink = Arc<dyn Fn(GateEvent) + Send + Sync>;

/// What happened inside the gate for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEventPayload {
    /// Call entered the gate.
    Received { tool_name: String, user_id: String },
    /// Policy store answered the lookup.
    PolicyMatched { decision: PolicyDecision },
    /// Prompt handed to the confirmation channel.
    PromptIssued,
    /// Human reply arrived.
    ReplyReceived { outcome: ReplyOutcome },
    /// Deadline elapsed without a reply.
    TimedOut,
    /// Host withdrew the call; no decision will be recorded.
    Cancelled,
    /// Terminal decision, appended to the audit log.
    Decided { decision: Decision },
}

/// Envelope for streaming gate events. `seq` increases strictly per
/// gatekeeper instance, so interleavings across calls stay ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateEvent {
    pub call_id: CallId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: GateEventPayload,
}
