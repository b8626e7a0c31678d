//! Toolgate — tool invocation confirmation gateway
//!
//! An authorization layer an agent runtime calls before executing any tool
//! call the agent decides to make. Stored policy rules answer what they
//! can; everything else goes to a human (or oracle) over a pluggable
//! confirmation channel, with bounded deadlines, cancellation, and an
//! append-only audit trail.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolgate::prelude::*;
//!
//! # async fn example() -> toolgate::error::Result<()> {
//! let (channel, mut remote) = PairedChannel::new();
//! let gate = Gatekeeper::new(Arc::new(channel));
//!
//! // Host UI task: answer prompts as they arrive.
//! tokio::spawn(async move {
//!     while let Some(prompt) = remote.next_prompt().await {
//!         remote.respond(prompt.call_id, ConfirmationReply::approve());
//!     }
//! });
//!
//! let decision = gate.authorize("send_email", "u1", Default::default()).await?;
//! if decision.permits_execution() {
//!     // run the tool
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod channel;
pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod types;
