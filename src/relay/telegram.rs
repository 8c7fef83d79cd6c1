//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::info;

use crate::relay::menu;

/// Outbound half of the chat channel.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String>;

    /// Send the `/start` greeting together with the main menu keyboard.
    async fn send_greeting(&self, chat_id: i64, first_name: &str) -> Result<(), String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send: {e}"))
    }

    async fn send_greeting(&self, chat_id: i64, first_name: &str) -> Result<(), String> {
        info!("👋 Greeting {} in chat {}", first_name, chat_id);

        self.bot
            .send_message(ChatId(chat_id), menu::greeting(first_name))
            .reply_markup(menu::main_menu())
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send greeting: {e}"))
    }
}
