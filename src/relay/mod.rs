//! Relay module - forwards Telegram text messages to the completion API.

pub mod dispatch;
pub mod handler;
pub mod log;
pub mod menu;
pub mod telegram;

pub use dispatch::{run_receive_loop, RelayState};
pub use handler::{HandleOutcome, InboundText, MessageHandler};
pub use log::{LogError, LoggedMessage, MessageLog};
pub use telegram::{ReplySink, TelegramClient};
