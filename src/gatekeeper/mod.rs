//! The gatekeeper: authorization orchestration per tool call.
//!
//! Per-call state machine:
//! `Created → PolicyChecked → {AutoApproved | AutoDenied | AwaitingHuman} → Decided`.
//! Policy hits short-circuit; everything else goes through the pending
//! registry and the confirmation channel with a bounded deadline. Every
//! call that is not cancelled ends in exactly one decision, appended to
//! the audit log exactly once.

pub mod events;

pub use events::{GateEvent, GateEventPayload, GateEventSink};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::audit::{AuditLog, AuditRecord};
use crate::channel::{ChannelResponse, ConfirmationChannel, ReplyOutcome};
use crate::config::GatekeeperConfig;
use crate::error::{Result, ToolgateError};
use crate::policy::{PolicyDecision, PolicyRule, PolicyStore, RuleScope};
use crate::registry::PendingRegistry;
use crate::types::{CallId, Decision, DecisionSource, Outcome, ToolArguments, ToolCall};

/// Authorization gate in front of tool execution.
///
/// Safe for many concurrent `authorize` calls; the only suspension points
/// are the channel calls. Collaborators are shared so hosts can hold their
/// own handles (e.g. clear session rules, query the audit log).
pub struct Gatekeeper {
    policy: Arc<PolicyStore>,
    registry: Arc<PendingRegistry>,
    channel: Arc<dyn ConfirmationChannel>,
    audit: Arc<AuditLog>,
    config: GatekeeperConfig,
    event_sink: Option<GateEventSink>,
    seq: AtomicU64,
    cancelled: Mutex<HashMap<CallId, DateTime<Utc>>>,
}

impl Gatekeeper {
    /// Gate with default collaborators over the given channel.
    pub fn new(channel: Arc<dyn ConfirmationChannel>) -> Self {
        Self {
            policy: Arc::new(PolicyStore::new()),
            registry: Arc::new(PendingRegistry::new()),
            channel,
            audit: Arc::new(AuditLog::new()),
            config: GatekeeperConfig::default(),
            event_sink: None,
            seq: AtomicU64::new(1),
            cancelled: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: Arc<PolicyStore>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_config(mut self, config: GatekeeperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_sink(mut self, sink: GateEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    /// Authorize a prospective tool execution. Builds the call with a fresh
    /// id; hosts that need to cancel use [`Gatekeeper::authorize_call`] with
    /// an id they minted.
    pub async fn authorize(
        &self,
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
        arguments: ToolArguments,
    ) -> Result<Decision> {
        self.authorize_call(ToolCall::new(tool_name, user_id, arguments))
            .await
    }

    /// Authorize a pre-built call. Returns the single decision for this
    /// call, or `Cancelled` if the host withdrew it mid-wait. Contract
    /// violations (duplicate call id) propagate.
    pub async fn authorize_call(&self, call: ToolCall) -> Result<Decision> {
        self.emit(
            call.call_id,
            GateEventPayload::Received {
                tool_name: call.tool_name.clone(),
                user_id: call.user_id.clone(),
            },
        );
        // Tick: expire stale entries before any registry interaction.
        self.registry.sweep(Utc::now());

        let lookup = self.policy.lookup(&call.tool_name, &call.user_id);
        self.emit(call.call_id, GateEventPayload::PolicyMatched { decision: lookup });
        tracing::debug!(
            call_id = %call.call_id,
            tool = %call.tool_name,
            user = %call.user_id,
            policy = %lookup,
            "policy checked"
        );

        match lookup {
            PolicyDecision::Allow => self.decide(&call, Outcome::Approved, DecisionSource::Policy),
            PolicyDecision::Deny => self.decide(&call, Outcome::Denied, DecisionSource::Policy),
            PolicyDecision::Ask => self.confirm(call).await,
        }
    }

    /// Withdraw an outstanding call. The pending entry is removed and no
    /// decision is recorded; an in-flight `authorize_call` for the id (if
    /// the host kept polling it) returns `Cancelled`. Returns false when
    /// the id has no open confirmation.
    pub fn cancel(&self, call_id: CallId) -> bool {
        match self.registry.cancel(call_id) {
            Some(_) => {
                let now = Utc::now();
                let mut cancelled = self.cancelled.lock().expect("cancel lock poisoned");
                // Prune marks nobody came back for.
                let horizon = now
                    - chrono::Duration::from_std(self.config.default_timeout * 2)
                        .unwrap_or_else(|_| chrono::Duration::seconds(3600));
                cancelled.retain(|_, at| *at > horizon);
                cancelled.insert(call_id, now);
                drop(cancelled);
                self.emit(call_id, GateEventPayload::Cancelled);
                tracing::debug!(call_id = %call_id, "call cancelled by host");
                true
            }
            None => false,
        }
    }

    /// Human-in-the-loop path: open a pending entry, prompt, wait.
    async fn confirm(&self, call: ToolCall) -> Result<Decision> {
        let timeout = chrono::Duration::from_std(self.config.default_timeout)
            .map_err(|_| ToolgateError::Configuration("confirmation timeout overflows".into()))?;
        let deadline = call.requested_at + timeout;

        self.registry.open(&call, deadline)?;

        if let Err(err) = self.channel.send_request(&call).await {
            tracing::warn!(
                call_id = %call.call_id,
                tool = %call.tool_name,
                error = %err,
                "prompt emission failed, denying"
            );
            // The entry was never visible to the human; close it out and
            // deny rather than hang the call.
            let _ = self.registry.resolve(call.call_id, Outcome::Denied);
            return self.decide(&call, Outcome::Denied, DecisionSource::ChannelUnavailable);
        }
        self.emit(call.call_id, GateEventPayload::PromptIssued);

        // The deadline is this gate's own invariant, not a trait contract:
        // even a channel that ignores it cannot suspend the call past it.
        let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
        let response = match tokio::time::timeout(
            remaining,
            self.channel.await_response(call.call_id, deadline),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => ChannelResponse::TimedOut,
        };

        match response {
            ChannelResponse::Reply(reply) => {
                let outcome = match reply.outcome {
                    ReplyOutcome::Approve => Outcome::Approved,
                    ReplyOutcome::Deny => Outcome::Denied,
                };
                match self.registry.resolve(call.call_id, outcome) {
                    Ok(_) => {
                        self.emit(
                            call.call_id,
                            GateEventPayload::ReplyReceived {
                                outcome: reply.outcome,
                            },
                        );
                        if let Some(scope) = reply.remember {
                            self.remember(&call, reply.outcome, scope);
                        }
                        self.decide(&call, outcome, DecisionSource::Human)
                    }
                    // Entry already gone: the call was cancelled, or its
                    // deadline was swept before the reply landed.
                    Err(ToolgateError::UnknownCall(_)) => self.finish_unanswered(&call),
                    Err(err) => Err(err),
                }
            }
            ChannelResponse::TimedOut => {
                // The wait ran to the deadline; sweep at that logical
                // instant so the entry transitions through TimedOut.
                self.registry.sweep(deadline);
                self.finish_unanswered(&call)
            }
        }
    }

    /// Terminal handling for a confirmation that never got a usable reply:
    /// either the host cancelled (no decision) or the deadline passed.
    fn finish_unanswered(&self, call: &ToolCall) -> Result<Decision> {
        if self.take_cancelled(call.call_id) {
            return Err(ToolgateError::Cancelled(call.call_id));
        }
        self.emit(call.call_id, GateEventPayload::TimedOut);
        self.decide(call, Outcome::TimedOut, DecisionSource::Timeout)
    }

    /// Produce the single decision for a call and append it to the audit
    /// log. Terminal: called exactly once per non-cancelled call.
    fn decide(&self, call: &ToolCall, outcome: Outcome, source: DecisionSource) -> Result<Decision> {
        let decision = Decision::new(call.call_id, outcome, source);
        self.audit
            .append(AuditRecord::for_call(call, decision.clone()));
        self.emit(
            call.call_id,
            GateEventPayload::Decided {
                decision: decision.clone(),
            },
        );
        tracing::debug!(
            call_id = %call.call_id,
            tool = %call.tool_name,
            outcome = %outcome,
            source = %source,
            "decision recorded"
        );
        Ok(decision)
    }

    /// Store the rule an "always allow/deny" reply asked for.
    fn remember(&self, call: &ToolCall, outcome: ReplyOutcome, requested: RuleScope) {
        let scope = if requested == RuleScope::Persistent && !self.config.allow_persistent_rules {
            tracing::warn!(
                call_id = %call.call_id,
                tool = %call.tool_name,
                "persistent rules disabled, storing session rule instead"
            );
            RuleScope::Session
        } else {
            requested
        };
        let decision = match outcome {
            ReplyOutcome::Approve => PolicyDecision::Allow,
            ReplyOutcome::Deny => PolicyDecision::Deny,
        };
        self.policy.upsert(PolicyRule::exact(
            call.tool_name.as_str(),
            call.user_id.as_str(),
            decision,
            scope,
        ));
        tracing::debug!(
            call_id = %call.call_id,
            tool = %call.tool_name,
            user = %call.user_id,
            rule = %decision,
            scope = %scope,
            "rule remembered from reply"
        );
    }

    fn take_cancelled(&self, call_id: CallId) -> bool {
        let mut cancelled = self.cancelled.lock().expect("cancel lock poisoned");
        cancelled.remove(&call_id).is_some()
    }

    fn emit(&self, call_id: CallId, payload: GateEventPayload) {
        let Some(sink) = &self.event_sink else { return };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(GateEvent {
            call_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}

impl std::fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("event_sink", &self.event_sink.as_ref().map(|_| ".."))
            .finish()
    }
}
