//! Error types for toolgate.

use thiserror::Error;

use crate::types::CallId;

/// Primary error type for all toolgate operations.
///
/// Contract violations (`DuplicateCall`, `UnknownCall`) are programming
/// errors on the caller's side and propagate as-is. Transport trouble on the
/// confirmation channel is recovered inside the gatekeeper into a denied
/// decision and never reaches `authorize` callers.
#[derive(Error, Debug)]
pub enum ToolgateError {
    #[error("Duplicate call: {0} already has a pending confirmation")]
    DuplicateCall(CallId),

    #[error("Unknown call: {0} has no pending confirmation")]
    UnknownCall(CallId),

    #[error("Call {0} was cancelled before a decision was reached")]
    Cancelled(CallId),

    #[error("Confirmation channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolgateError {
    /// Create a channel-unavailable error.
    pub fn channel_unavailable(message: impl Into<String>) -> Self {
        Self::ChannelUnavailable(message.into())
    }

    /// Create a sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }

    /// True for errors that signal a broken caller contract rather than a
    /// runtime condition. These are fatal to the single call, never retried.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::DuplicateCall(_) | Self::UnknownCall(_))
    }

    /// True when the error means the call ended without a decision because
    /// the host withdrew it.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Result alias used throughout toolgate.
pub type Result<T> = std::result::Result<T, ToolgateError>;
