//! Append-only record of every decision.
//!
//! `append` never fails the caller: audit trouble must not block tool
//! execution, so sink errors are logged and swallowed. Queries run against
//! an in-memory mirror, which also keeps `query` working over write-only
//! sinks.

pub mod sink;

pub use sink::{AuditSink, FileAuditSink, MemoryAuditSink};

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Decision, Outcome, ToolCall};

/// One audit entry. Arguments appear only as a digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecord {
    pub decision: Decision,
    pub tool_name: String,
    pub user_id: String,
    pub arguments_digest: String,
}

impl AuditRecord {
    pub fn for_call(call: &ToolCall, decision: Decision) -> Self {
        Self {
            decision,
            tool_name: call.tool_name.clone(),
            user_id: call.user_id.clone(),
            arguments_digest: call.arguments_digest(),
        }
    }
}

/// Read-side filter. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub tool_name: Option<String>,
    pub user_id: Option<String>,
    pub outcome: Option<Outcome>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(tool) = &self.tool_name {
            if record.tool_name != *tool {
                return false;
            }
        }
        if let Some(user) = &self.user_id {
            if record.user_id != *user {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if record.decision.outcome != outcome {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.decision.decided_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.decision.decided_at > until {
                return false;
            }
        }
        true
    }
}

/// Append-only decision log with optional persistent sink.
pub struct AuditLog {
    records: Mutex<Vec<AuditRecord>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("records", &self.records)
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            sink: None,
        }
    }

    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            sink: Some(sink),
        }
    }

    /// Append a record. Best-effort persistence: a failing sink is logged
    /// at warn and the append still counts.
    pub fn append(&self, record: AuditRecord) {
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.save(&record) {
                tracing::warn!(
                    call_id = %record.decision.call_id,
                    error = %err,
                    "audit sink rejected record"
                );
            }
        }
        let mut records = self.records.lock().expect("audit lock poisoned");
        records.push(record);
    }

    /// All records matching the filter, in log-arrival order.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditRecord> {
        let records = self.records.lock().expect("audit lock poisoned");
        records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecisionSource, ToolCall};

    fn record(tool: &str, user: &str, outcome: Outcome) -> AuditRecord {
        let call = ToolCall::new(tool, user, Default::default());
        AuditRecord::for_call(
            &call,
            Decision::new(call.call_id, outcome, DecisionSource::Policy),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let log = AuditLog::new();
        log.append(record("a", "u1", Outcome::Approved));
        log.append(record("b", "u2", Outcome::Denied));
        assert_eq!(log.query(&AuditFilter::default()).len(), 2);
    }

    #[test]
    fn filters_compose() {
        let log = AuditLog::new();
        log.append(record("a", "u1", Outcome::Approved));
        log.append(record("a", "u2", Outcome::Denied));
        log.append(record("b", "u1", Outcome::Denied));

        let filter = AuditFilter {
            tool_name: Some("a".to_string()),
            outcome: Some(Outcome::Denied),
            ..Default::default()
        };
        let hits = log.query(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_id, "u2");
    }

    #[test]
    fn time_range_filtering() {
        let log = AuditLog::new();
        log.append(record("a", "u1", Outcome::Approved));
        let cutoff = Utc::now() + chrono::Duration::seconds(1);
        let filter = AuditFilter {
            since: Some(cutoff),
            ..Default::default()
        };
        assert!(log.query(&filter).is_empty());
    }
}
