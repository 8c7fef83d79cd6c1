//! Per-message relay: log, ask the model, reply.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::completion::Completer;
use crate::relay::log::MessageLog;
use crate::relay::telegram::ReplySink;

/// A text message as delivered by the chat platform.
#[derive(Debug, Clone)]
pub struct InboundText {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Blank text: nothing logged, nothing sent.
    Ignored,
    Replied { logged: bool, delivered: bool },
}

pub struct MessageHandler {
    log: Arc<MessageLog>,
    completer: Arc<dyn Completer>,
    sink: Arc<dyn ReplySink>,
}

impl MessageHandler {
    pub fn new(log: Arc<MessageLog>, completer: Arc<dyn Completer>, sink: Arc<dyn ReplySink>) -> Self {
        Self { log, completer, sink }
    }

    pub async fn handle(&self, msg: &InboundText) -> HandleOutcome {
        let text = msg.text.trim();
        if text.is_empty() {
            debug!("Ignoring blank message from {} in chat {}", msg.user_id, msg.chat_id);
            return HandleOutcome::Ignored;
        }

        let preview: String = text.chars().take(100).collect();
        let who = msg.username.as_deref().unwrap_or(&msg.first_name);
        info!("📨 Message from {who} ({}): \"{preview}\"", msg.user_id);

        // The row must exist before the model is asked, but losing it never blocks the reply.
        let logged = match self.log.append(msg.user_id, msg.username.as_deref(), text) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to log message from {}: {e}", msg.user_id);
                false
            }
        };

        let reply = self.completer.get_completion(text).await;

        let delivered = match self.sink.send_text(msg.chat_id, &reply).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to reply in chat {}: {e}", msg.chat_id);
                false
            }
        };

        HandleOutcome::Replied { logged, delivered }
    }
}
