//! In-flight confirmation tracking.
//!
//! Exactly one live entry per call id; every entry leaves the map through
//! one of `resolve`, `cancel`, or `sweep`. All mutations are short critical
//! sections behind one mutex — nothing awaits while holding it.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{Result, ToolgateError};
use crate::types::{CallId, Outcome, ToolCall};

/// Lifecycle of a pending confirmation. Entries in the registry are always
/// `Open`; the terminal state is set on the entry as it is removed and
/// returned to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PendingState {
    Open,
    Resolved,
    TimedOut,
    Cancelled,
}

/// A confirmation waiting on a human or oracle reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequest {
    pub call_id: CallId,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub state: PendingState,
}

/// Registry of open confirmations, keyed by call id.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<CallId, PendingRequest>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pending entry for the call. Fails with `DuplicateCall` if the
    /// call id already has a live entry.
    pub fn open(&self, call: &ToolCall, deadline: DateTime<Utc>) -> Result<PendingRequest> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        if entries.contains_key(&call.call_id) {
            return Err(ToolgateError::DuplicateCall(call.call_id));
        }
        let request = PendingRequest {
            call_id: call.call_id,
            created_at: Utc::now(),
            deadline,
            state: PendingState::Open,
        };
        entries.insert(call.call_id, request.clone());
        tracing::debug!(call_id = %call.call_id, deadline = %deadline, "pending request opened");
        Ok(request)
    }

    /// Resolve and remove an open entry. Fails with `UnknownCall` if the id
    /// is absent — including when it was already resolved, swept, or
    /// cancelled. An entry whose deadline has passed counts as timed out,
    /// not resolvable: a late reply can never convert an expired
    /// confirmation into an approval. A decision is never silently
    /// overwritten.
    pub fn resolve(&self, call_id: CallId, outcome: Outcome) -> Result<PendingRequest> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        let mut request = entries
            .remove(&call_id)
            .ok_or(ToolgateError::UnknownCall(call_id))?;
        if request.deadline <= Utc::now() {
            request.state = PendingState::TimedOut;
            tracing::debug!(call_id = %call_id, "pending request expired before resolution");
            return Err(ToolgateError::UnknownCall(call_id));
        }
        request.state = PendingState::Resolved;
        tracing::debug!(call_id = %call_id, outcome = %outcome, "pending request resolved");
        Ok(request)
    }

    /// Remove an entry without producing a decision. Returns the removed
    /// entry, or `None` if the id was not live (cancellation races with
    /// resolution and loses silently).
    pub fn cancel(&self, call_id: CallId) -> Option<PendingRequest> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        let mut request = entries.remove(&call_id)?;
        request.state = PendingState::Cancelled;
        tracing::debug!(call_id = %call_id, "pending request cancelled");
        Some(request)
    }

    /// Transition every entry past its deadline to `TimedOut`, remove them,
    /// and return the newly timed-out entries.
    pub fn sweep(&self, now: DateTime<Utc>) -> Vec<PendingRequest> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        let expired: Vec<CallId> = entries
            .values()
            .filter(|request| request.deadline <= now)
            .map(|request| request.call_id)
            .collect();
        expired
            .into_iter()
            .filter_map(|call_id| {
                let mut request = entries.remove(&call_id)?;
                request.state = PendingState::TimedOut;
                tracing::debug!(call_id = %call_id, "pending request timed out");
                Some(request)
            })
            .collect()
    }

    /// Whether the call id has a live entry, after sweeping expired ones.
    pub fn contains(&self, call_id: CallId, now: DateTime<Utc>) -> bool {
        self.sweep(now);
        let entries = self.entries.lock().expect("registry lock poisoned");
        entries.contains_key(&call_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
