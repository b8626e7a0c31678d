//! Authorization decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::call::CallId;

/// Terminal outcome of an authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Approved,
    Denied,
    /// No response arrived before the deadline. Treated as denied for
    /// execution purposes, recorded distinctly for audit.
    TimedOut,
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionSource {
    /// A stored policy rule decided without human involvement.
    Policy,
    /// A human (or oracle) replied through the confirmation channel.
    Human,
    /// The confirmation deadline elapsed.
    Timeout,
    /// The channel could not deliver the prompt; denied rather than hung.
    ChannelUnavailable,
}

/// The single immutable record produced for every authorized call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub call_id: CallId,
    pub outcome: Outcome,
    pub source: DecisionSource,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(call_id: CallId, outcome: Outcome, source: DecisionSource) -> Self {
        Self {
            call_id,
            outcome,
            source,
            decided_at: Utc::now(),
        }
    }

    /// Whether the agent runtime may proceed to execute the tool.
    /// Timed-out calls never execute.
    pub fn permits_execution(&self) -> bool {
        self.outcome == Outcome::Approved
    }
}
