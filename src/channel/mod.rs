//! Confirmation channel seam.
//!
//! The gatekeeper talks to humans (or a policy oracle) only through
//! [`ConfirmationChannel`]; terminal prompts, chat replies, and web forms
//! are all concrete transports behind the same two calls.

pub mod fixed;
pub mod paired;

pub use fixed::StaticChannel;
pub use paired::{ChannelRemote, PairedChannel};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::Result;
use crate::policy::RuleScope;
use crate::types::{CallId, ToolCall};

/// What the human said.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplyOutcome {
    Approve,
    Deny,
}

/// A human (or oracle) reply to a confirmation prompt.
///
/// `remember` turns the reply into a stored rule for the call's exact
/// (tool, user) pair: "always allow" on an approval, "always deny" on a
/// denial. Scope must be requested explicitly; persistence additionally
/// requires the gatekeeper to be configured to accept it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationReply {
    pub outcome: ReplyOutcome,
    pub remember: Option<RuleScope>,
}

impl ConfirmationReply {
    pub fn approve() -> Self {
        Self {
            outcome: ReplyOutcome::Approve,
            remember: None,
        }
    }

    pub fn deny() -> Self {
        Self {
            outcome: ReplyOutcome::Deny,
            remember: None,
        }
    }

    /// Attach an "always" request to this reply.
    pub fn remember(mut self, scope: RuleScope) -> Self {
        self.remember = Some(scope);
        self
    }
}

/// Result of waiting on a channel: a reply, or deadline expiry. Expiry is a
/// normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResponse {
    Reply(ConfirmationReply),
    TimedOut,
}

/// What a transport shows the human about an outstanding prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSnapshot {
    pub call_id: CallId,
    pub tool_name: String,
    pub user_id: String,
    pub requested_at: DateTime<Utc>,
}

impl PromptSnapshot {
    pub fn for_call(call: &ToolCall) -> Self {
        Self {
            call_id: call.call_id,
            tool_name: call.tool_name.clone(),
            user_id: call.user_id.clone(),
            requested_at: call.requested_at,
        }
    }
}

/// Transport seam for human-in-the-loop confirmation.
#[async_trait]
pub trait ConfirmationChannel: Send + Sync {
    /// Emit the prompt for a call. Fire-and-forget; a failure here is a
    /// `ChannelUnavailable` error, which the gatekeeper degrades to an
    /// immediate denial.
    async fn send_request(&self, call: &ToolCall) -> Result<()>;

    /// Suspend until a reply for `call_id` arrives or `deadline` passes.
    /// Returns `ChannelResponse::TimedOut` on expiry, never an error.
    async fn await_response(&self, call_id: CallId, deadline: DateTime<Utc>) -> ChannelResponse;
}
