//! In-process channel: gatekeeper side paired with a host-UI remote.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, ToolgateError};
use crate::types::{CallId, ToolCall};

use super::{ChannelResponse, ConfirmationChannel, ConfirmationReply, PromptSnapshot};

struct PromptSlot {
    snapshot: PromptSnapshot,
    reply_tx: Option<oneshot::Sender<ConfirmationReply>>,
    reply_rx: Option<oneshot::Receiver<ConfirmationReply>>,
}

struct PairedInner {
    slots: Mutex<HashMap<CallId, PromptSlot>>,
    prompt_tx: mpsc::UnboundedSender<PromptSnapshot>,
}

/// Gatekeeper-side half of an in-process confirmation channel.
///
/// Prompts are routed through a shared slot map; the paired
/// [`ChannelRemote`] is what the host's UI task holds to observe prompts
/// and post replies. This is the transport used by terminal hosts and the
/// integration tests.
pub struct PairedChannel {
    inner: Arc<PairedInner>,
}

/// Host-side half: receives prompt notifications, posts replies.
pub struct ChannelRemote {
    inner: Arc<PairedInner>,
    prompt_rx: mpsc::UnboundedReceiver<PromptSnapshot>,
}

impl PairedChannel {
    /// Create both halves.
    pub fn new() -> (Self, ChannelRemote) {
        let (prompt_tx, prompt_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(PairedInner {
            slots: Mutex::new(HashMap::new()),
            prompt_tx,
        });
        (
            Self {
                inner: inner.clone(),
            },
            ChannelRemote { inner, prompt_rx },
        )
    }
}

#[async_trait]
impl ConfirmationChannel for PairedChannel {
    async fn send_request(&self, call: &ToolCall) -> Result<()> {
        let snapshot = PromptSnapshot::for_call(call);
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut slots = self.inner.slots.lock().expect("channel lock poisoned");
            slots.insert(
                call.call_id,
                PromptSlot {
                    snapshot: snapshot.clone(),
                    reply_tx: Some(reply_tx),
                    reply_rx: Some(reply_rx),
                },
            );
        }
        if self.inner.prompt_tx.send(snapshot).is_err() {
            let mut slots = self.inner.slots.lock().expect("channel lock poisoned");
            slots.remove(&call.call_id);
            return Err(ToolgateError::channel_unavailable("remote end dropped"));
        }
        Ok(())
    }

    async fn await_response(&self, call_id: CallId, deadline: DateTime<Utc>) -> ChannelResponse {
        let reply_rx = {
            let mut slots = self.inner.slots.lock().expect("channel lock poisoned");
            slots
                .get_mut(&call_id)
                .and_then(|slot| slot.reply_rx.take())
        };
        let Some(reply_rx) = reply_rx else {
            // No prompt was sent for this id (or it is already being
            // awaited); nothing can ever arrive.
            return ChannelResponse::TimedOut;
        };

        let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let response = match tokio::time::timeout(remaining, reply_rx).await {
            Ok(Ok(reply)) => ChannelResponse::Reply(reply),
            // Remote dropped the sender without answering.
            Ok(Err(_)) => ChannelResponse::TimedOut,
            Err(_) => ChannelResponse::TimedOut,
        };

        let mut slots = self.inner.slots.lock().expect("channel lock poisoned");
        slots.remove(&call_id);
        response
    }
}

impl ChannelRemote {
    /// Next prompt notification, in arrival order. `None` once the
    /// gatekeeper side is gone.
    pub async fn next_prompt(&mut self) -> Option<PromptSnapshot> {
        self.prompt_rx.recv().await
    }

    /// Snapshot of prompts still awaiting a reply.
    pub fn pending(&self) -> Vec<PromptSnapshot> {
        let slots = self.inner.slots.lock().expect("channel lock poisoned");
        slots
            .values()
            .filter(|slot| slot.reply_tx.is_some())
            .map(|slot| slot.snapshot.clone())
            .collect()
    }

    /// Post a reply for an outstanding prompt. Returns false if the prompt
    /// is unknown, already answered, or no longer awaited (expired or
    /// cancelled calls land here; the late reply is dropped).
    pub fn respond(&self, call_id: CallId, reply: ConfirmationReply) -> bool {
        let reply_tx = {
            let mut slots = self.inner.slots.lock().expect("channel lock poisoned");
            slots
                .get_mut(&call_id)
                .and_then(|slot| slot.reply_tx.take())
        };
        match reply_tx {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }
}
