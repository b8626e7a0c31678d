//! Tests for the audit log and its sinks.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use toolgate::audit::{AuditFilter, AuditLog, AuditRecord, AuditSink, FileAuditSink};
use toolgate::error::{Result, ToolgateError};
use toolgate::types::{Decision, DecisionSource, Outcome, ToolCall};

fn record(tool: &str, user: &str, outcome: Outcome) -> AuditRecord {
    let call = ToolCall::new(tool, user, Default::default());
    AuditRecord::for_call(
        &call,
        Decision::new(call.call_id, outcome, DecisionSource::Human),
    )
}

/// Sink that rejects every record.
struct RejectingSink;

impl AuditSink for RejectingSink {
    fn save(&self, _record: &AuditRecord) -> Result<()> {
        Err(ToolgateError::sink("disk full"))
    }

    fn load(&self) -> Result<Vec<AuditRecord>> {
        Ok(Vec::new())
    }
}

#[test]
fn append_survives_a_failing_sink() {
    let log = AuditLog::with_sink(Arc::new(RejectingSink));
    log.append(record("send_email", "u1", Outcome::Approved));
    // The in-memory mirror still has the record.
    assert_eq!(log.query(&AuditFilter::default()).len(), 1);
}

#[test]
fn file_sink_round_trips_through_the_log() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(FileAuditSink::new(dir.path().join("audit.jsonl")));
    let log = AuditLog::with_sink(sink.clone());

    log.append(record("send_email", "u1", Outcome::Approved));
    log.append(record("rm_rf", "u1", Outcome::Denied));

    let persisted = sink.load().unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted, log.query(&AuditFilter::default()));
}

#[test]
fn query_filters_by_user_and_outcome() {
    let log = AuditLog::new();
    log.append(record("send_email", "u1", Outcome::Approved));
    log.append(record("send_email", "u2", Outcome::Denied));
    log.append(record("send_email", "u2", Outcome::TimedOut));

    let filter = AuditFilter {
        user_id: Some("u2".to_string()),
        outcome: Some(Outcome::TimedOut),
        ..Default::default()
    };
    let hits = log.query(&filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].decision.outcome, Outcome::TimedOut);
}
