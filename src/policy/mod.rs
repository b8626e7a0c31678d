//! Approval policy rules and the store that serves them.
//!
//! The store answers one question per call: does a stored rule already
//! decide this (tool, user) pair, or does the gateway have to ask? Reads
//! take a snapshot behind an `RwLock` read guard; writes are serialized so
//! no reader ever observes a partial update.

pub mod sink;

pub use sink::{FileRuleSink, RuleSink};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use strum::Display;

/// What a rule (or the store as a whole) says about a call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Deny,
    /// No stored rule applies; ask the confirmation channel.
    Ask,
}

/// Lifetime of a stored rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleScope {
    /// Discarded when the host clears the session.
    Session,
    /// Written through to the injected sink, survives restarts.
    Persistent,
}

/// Rule subject: a concrete tool/user or a wildcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleSubject {
    Exact(String),
    Any,
}

impl RuleSubject {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(subject) => subject == value,
            Self::Any => true,
        }
    }
}

/// A stored approval rule. Rules form a set keyed by (tool, user); upsert
/// replaces the rule with the same key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRule {
    pub tool: RuleSubject,
    pub user: RuleSubject,
    pub decision: PolicyDecision,
    pub scope: RuleScope,
}

impl PolicyRule {
    pub fn new(
        tool: RuleSubject,
        user: RuleSubject,
        decision: PolicyDecision,
        scope: RuleScope,
    ) -> Self {
        Self {
            tool,
            user,
            decision,
            scope,
        }
    }

    /// Session-scoped rule for an exact (tool, user) pair — the shape the
    /// gatekeeper stores for "always allow/deny" replies.
    pub fn exact(
        tool: impl Into<String>,
        user: impl Into<String>,
        decision: PolicyDecision,
        scope: RuleScope,
    ) -> Self {
        Self::new(
            RuleSubject::exact(tool),
            RuleSubject::exact(user),
            decision,
            scope,
        )
    }

    fn key(&self) -> (RuleSubject, RuleSubject) {
        (self.tool.clone(), self.user.clone())
    }
}

/// In-memory rule set with optional write-through persistence.
///
/// Lookup precedence, most specific first:
/// exact tool + exact user, exact tool + any user, any tool + exact user,
/// any tool + any user, then the default `Ask`.
pub struct PolicyStore {
    rules: Arc<RwLock<HashMap<(RuleSubject, RuleSubject), PolicyRule>>>,
    sink: Option<Arc<dyn RuleSink>>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore")
            .field("rules", &self.rules)
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl PolicyStore {
    /// Empty store, no persistence.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(HashMap::new())),
            sink: None,
        }
    }

    /// Store backed by a sink; persistent rules are loaded eagerly. A sink
    /// that fails to load leaves the store empty and logs a warning rather
    /// than failing construction.
    pub fn with_sink(sink: Arc<dyn RuleSink>) -> Self {
        let store = Self {
            rules: Arc::new(RwLock::new(HashMap::new())),
            sink: Some(sink.clone()),
        };
        match sink.load() {
            Ok(rules) => {
                let mut map = store.rules.write().expect("policy lock poisoned");
                for rule in rules {
                    map.insert(rule.key(), rule);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load persistent policy rules");
            }
        }
        store
    }

    /// Decide (tool, user) from stored rules, most-specific-match wins.
    pub fn lookup(&self, tool_name: &str, user_id: &str) -> PolicyDecision {
        let rules = self.rules.read().expect("policy lock poisoned");
        let candidates = [
            (
                RuleSubject::exact(tool_name),
                RuleSubject::exact(user_id),
            ),
            (RuleSubject::exact(tool_name), RuleSubject::Any),
            (RuleSubject::Any, RuleSubject::exact(user_id)),
            (RuleSubject::Any, RuleSubject::Any),
        ];
        for key in &candidates {
            if let Some(rule) = rules.get(key) {
                debug_assert!(rule.tool.matches(tool_name) && rule.user.matches(user_id));
                return rule.decision;
            }
        }
        PolicyDecision::Ask
    }

    /// Insert or replace the rule for its (tool, user) key. Persistent rules
    /// are written through; sink failures are logged, the in-memory rule
    /// stands either way.
    pub fn upsert(&self, rule: PolicyRule) {
        let persist = rule.scope == RuleScope::Persistent;
        {
            let mut rules = self.rules.write().expect("policy lock poisoned");
            rules.insert(rule.key(), rule);
        }
        if persist {
            self.write_through();
        }
    }

    /// Drop all rules of the given scope. Clearing `Persistent` also clears
    /// the sink.
    pub fn clear(&self, scope: RuleScope) {
        {
            let mut rules = self.rules.write().expect("policy lock poisoned");
            rules.retain(|_, rule| rule.scope != scope);
        }
        if scope == RuleScope::Persistent {
            if let Some(sink) = &self.sink {
                if let Err(err) = sink.clear() {
                    tracing::warn!(error = %err, "failed to clear persistent policy rules");
                }
            }
        }
    }

    /// Snapshot of all stored rules (test and introspection surface).
    pub fn rules(&self) -> Vec<PolicyRule> {
        let rules = self.rules.read().expect("policy lock poisoned");
        rules.values().cloned().collect()
    }

    fn write_through(&self) {
        let Some(sink) = &self.sink else { return };
        let persistent: Vec<PolicyRule> = {
            let rules = self.rules.read().expect("policy lock poisoned");
            rules
                .values()
                .filter(|rule| rule.scope == RuleScope::Persistent)
                .cloned()
                .collect()
        };
        if let Err(err) = sink.save(&persistent) {
            tracing::warn!(error = %err, "failed to persist policy rules");
        }
    }
}
