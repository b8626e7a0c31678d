//! Convenience re-exports for common use.

pub use crate::audit::{AuditFilter, AuditLog, AuditRecord, AuditSink};
pub use crate::channel::{
    ChannelRemote, ChannelResponse, ConfirmationChannel, ConfirmationReply, PairedChannel,
    PromptSnapshot, ReplyOutcome, StaticChannel,
};
pub use crate::config::GatekeeperConfig;
pub use crate::error::{Result, ToolgateError};
pub use crate::gatekeeper::{GateEvent, GateEventPayload, Gatekeeper};
pub use crate::policy::{PolicyDecision, PolicyRule, PolicyStore, RuleScope, RuleSubject};
pub use crate::registry::{PendingRegistry, PendingRequest, PendingState};
pub use crate::types::{CallId, Decision, DecisionSource, Outcome, ToolArguments, ToolCall};
