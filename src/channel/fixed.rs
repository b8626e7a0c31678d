//! Fixed-answer oracle channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{CallId, ToolCall};

use super::{ChannelResponse, ConfirmationChannel, ConfirmationReply};

/// Channel that answers every prompt with the same reply, immediately.
///
/// Useful as a policy oracle (auto-approve in trusted environments) and in
/// tests that are not about the transport.
#[derive(Debug, Clone)]
pub struct StaticChannel {
    reply: ConfirmationReply,
}

impl StaticChannel {
    pub fn new(reply: ConfirmationReply) -> Self {
        Self { reply }
    }

    pub fn approving() -> Self {
        Self::new(ConfirmationReply::approve())
    }

    pub fn denying() -> Self {
        Self::new(ConfirmationReply::deny())
    }
}

#[async_trait]
impl ConfirmationChannel for StaticChannel {
    async fn send_request(&self, _call: &ToolCall) -> Result<()> {
        Ok(())
    }

    async fn await_response(&self, _call_id: CallId, _deadline: DateTime<Utc>) -> ChannelResponse {
        ChannelResponse::Reply(self.reply.clone())
    }
}
