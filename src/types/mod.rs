//! Core data types shared across the gateway.

pub mod call;
pub mod decision;

pub use call::{CallId, ToolArguments, ToolCall};
pub use decision::{Decision, DecisionSource, Outcome};
