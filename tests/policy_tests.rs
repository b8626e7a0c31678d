//! Tests for the policy store and its persistence.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use toolgate::policy::{
    FileRuleSink, PolicyDecision, PolicyRule, PolicyStore, RuleScope, RuleSubject,
};

#[test]
fn precedence_runs_most_specific_first() {
    let store = PolicyStore::new();
    store.upsert(PolicyRule::new(
        RuleSubject::Any,
        RuleSubject::Any,
        PolicyDecision::Deny,
        RuleScope::Session,
    ));
    store.upsert(PolicyRule::new(
        RuleSubject::Any,
        RuleSubject::exact("u1"),
        PolicyDecision::Allow,
        RuleScope::Session,
    ));
    store.upsert(PolicyRule::new(
        RuleSubject::exact("send_email"),
        RuleSubject::Any,
        PolicyDecision::Deny,
        RuleScope::Session,
    ));
    store.upsert(PolicyRule::exact(
        "send_email",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Session,
    ));

    // Exact pair wins over everything.
    assert_eq!(store.lookup("send_email", "u1"), PolicyDecision::Allow);
    // Exact tool + any user beats any tool + exact user.
    assert_eq!(store.lookup("send_email", "u2"), PolicyDecision::Deny);
    // Any tool + exact user beats the catch-all.
    assert_eq!(store.lookup("other", "u1"), PolicyDecision::Allow);
    // Catch-all beats the default.
    assert_eq!(store.lookup("other", "u2"), PolicyDecision::Deny);
}

#[test]
fn unmatched_lookup_defaults_to_ask() {
    let store = PolicyStore::new();
    store.upsert(PolicyRule::exact(
        "send_email",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Session,
    ));
    assert_eq!(store.lookup("send_email", "u2"), PolicyDecision::Ask);
    assert_eq!(store.lookup("other", "u1"), PolicyDecision::Ask);
}

#[test]
fn persistent_rules_survive_a_new_store_over_the_same_sink() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(FileRuleSink::new(dir.path().join("rules.toml")));

    let store = PolicyStore::with_sink(sink.clone());
    store.upsert(PolicyRule::exact(
        "send_email",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Persistent,
    ));
    store.upsert(PolicyRule::exact(
        "rm_rf",
        "u1",
        PolicyDecision::Deny,
        RuleScope::Session,
    ));

    let reloaded = PolicyStore::with_sink(sink);
    // The persistent rule came back, the session rule did not.
    assert_eq!(reloaded.lookup("send_email", "u1"), PolicyDecision::Allow);
    assert_eq!(reloaded.lookup("rm_rf", "u1"), PolicyDecision::Ask);
}

#[test]
fn clearing_persistent_scope_empties_the_sink() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(FileRuleSink::new(dir.path().join("rules.toml")));

    let store = PolicyStore::with_sink(sink.clone());
    store.upsert(PolicyRule::exact(
        "send_email",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Persistent,
    ));
    store.clear(RuleScope::Persistent);

    assert_eq!(store.lookup("send_email", "u1"), PolicyDecision::Ask);
    assert!(PolicyStore::with_sink(sink).rules().is_empty());
}

#[test]
fn session_clear_leaves_persistent_rules_in_place() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(FileRuleSink::new(dir.path().join("rules.toml")));

    let store = PolicyStore::with_sink(sink);
    store.upsert(PolicyRule::exact(
        "send_email",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Persistent,
    ));
    store.upsert(PolicyRule::exact(
        "search",
        "u1",
        PolicyDecision::Allow,
        RuleScope::Session,
    ));

    store.clear(RuleScope::Session);
    assert_eq!(store.lookup("send_email", "u1"), PolicyDecision::Allow);
    assert_eq!(store.lookup("search", "u1"), PolicyDecision::Ask);
}
