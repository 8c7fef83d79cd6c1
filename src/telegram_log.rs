//! Forwards this crate's WARN/ERROR events to an operator chat.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const MAX_BUFFERED: usize = 20;
/// Telegram caps messages at 4096 chars.
const MAX_MESSAGE_CHARS: usize = 4000;

pub struct TelegramLogLayer {
    tx: mpsc::UnboundedSender<String>,
}

impl TelegramLogLayer {
    /// Must be called from within a tokio runtime.
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let mut buffer: Vec<String> = Vec::new();
            let mut interval = tokio::time::interval(FLUSH_INTERVAL);

            loop {
                tokio::select! {
                    line = rx.recv() => match line {
                        Some(line) => {
                            buffer.push(line);
                            if buffer.len() >= MAX_BUFFERED {
                                flush(&bot, chat_id, &mut buffer).await;
                            }
                        }
                        None => {
                            flush(&bot, chat_id, &mut buffer).await;
                            break;
                        }
                    },
                    _ = interval.tick() => flush(&bot, chat_id, &mut buffer).await,
                }
            }
        });

        Self { tx }
    }
}

async fn flush(bot: &Bot, chat_id: ChatId, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    let text = truncate(&buffer.join("\n"));
    buffer.clear();
    // Reporting through tracing here would feed back into this layer.
    if let Err(e) = bot.send_message(chat_id, text).await {
        eprintln!("Failed to send log to Telegram: {e}");
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        let head: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn format_line(level: Level, message: &str) -> String {
    let prefix = if level == Level::ERROR { "❌" } else { "⚠️" };
    format!("{prefix} {message}")
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message.push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for TelegramLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = *metadata.level();

        if level > Level::WARN || !metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if self.tx.send(format_line(level, &visitor.message)).is_err() {
            eprintln!("Log channel closed, message dropped");
        }
    }
}
