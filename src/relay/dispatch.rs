//! Update routing: teloxide dispatcher wired to the relay.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::relay::handler::{InboundText, MessageHandler};
use crate::relay::menu::is_start_command;
use crate::relay::telegram::ReplySink;

/// Everything the update handlers need, built once at startup.
pub struct RelayState {
    pub sink: Arc<dyn ReplySink>,
    pub handler: MessageHandler,
    /// Our own username, to tell `/start@us` from `/start@someone_else`.
    pub bot_username: Option<String>,
}

/// Routing tree: `/start` greets, any other text goes through the relay.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::filter(|msg: Message, state: Arc<RelayState>| {
                msg.text()
                    .is_some_and(|text| is_start_command(text, state.bot_username.as_deref()))
            })
            .endpoint(handle_start),
        )
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text))
}

/// Long-poll Telegram until the dispatcher stops.
pub async fn run_receive_loop(bot: Bot, state: Arc<RelayState>) {
    info!("📡 Receive loop started");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        // Every update is independent; no per-chat ordering.
        .distribution_function(|_| None::<std::convert::Infallible>)
        .default_handler(|update| async move {
            debug!("Unhandled update {:?}", update.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Error in update handler"))
        .build()
        .dispatch()
        .await;
}

async fn handle_start(msg: Message, state: Arc<RelayState>) -> ResponseResult<()> {
    let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");
    if let Err(e) = state.sink.send_greeting(msg.chat.id.0, first_name).await {
        warn!("Failed to greet in chat {}: {e}", msg.chat.id.0);
    }
    Ok(())
}

async fn handle_text(msg: Message, state: Arc<RelayState>) -> ResponseResult<()> {
    match inbound_from_message(&msg) {
        Some(inbound) => {
            state.handler.handle(&inbound).await;
        }
        None => debug!("Dropping message {} without a usable sender", msg.id.0),
    }
    Ok(())
}

fn inbound_from_message(msg: &Message) -> Option<InboundText> {
    let user = msg.from.as_ref()?;
    Some(InboundText {
        chat_id: msg.chat.id.0,
        user_id: i64::try_from(user.id.0).ok()?,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        text: msg.text()?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dptree::di::DependencyMap;
    use serde_json::{Value, json};
    use std::ops::ControlFlow;
    use std::sync::Mutex;

    use crate::completion::Completer;
    use crate::relay::log::MessageLog;

    struct RecordingCompleter {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Completer for RecordingCompleter {
        async fn get_completion(&self, prompt: &str) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            "sure thing".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        texts: Mutex<Vec<(i64, String)>>,
        greetings: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
            self.texts.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }

        async fn send_greeting(&self, chat_id: i64, first_name: &str) -> Result<(), String> {
            self.greetings.lock().unwrap().push((chat_id, first_name.to_string()));
            Ok(())
        }
    }

    struct TestBot {
        log: Arc<MessageLog>,
        completer: Arc<RecordingCompleter>,
        sink: Arc<RecordingSink>,
        state: Arc<RelayState>,
    }

    impl TestBot {
        fn new() -> Self {
            let log = Arc::new(MessageLog::in_memory().unwrap());
            let completer = Arc::new(RecordingCompleter { prompts: Mutex::new(Vec::new()) });
            let sink = Arc::new(RecordingSink::default());
            let state = Arc::new(RelayState {
                sink: sink.clone(),
                handler: MessageHandler::new(log.clone(), completer.clone(), sink.clone()),
                bot_username: Some("ashim_bot".to_string()),
            });
            Self { log, completer, sink, state }
        }

        async fn deliver(&self, update: Value) -> ControlFlow<ResponseResult<()>, DependencyMap> {
            let update: Update = serde_json::from_str(&update.to_string()).expect("valid update json");
            schema().dispatch(dptree::deps![update, self.state.clone()]).await
        }

        fn prompts(&self) -> Vec<String> {
            self.completer.prompts.lock().unwrap().clone()
        }
    }

    fn private_text(text: &str) -> Value {
        json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "date": 1_700_000_000,
                "chat": {"id": 555, "type": "private", "first_name": "Alice"},
                "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
                "text": text
            }
        })
    }

    fn anonymous_group_text(text: &str) -> Value {
        json!({
            "update_id": 2,
            "message": {
                "message_id": 11,
                "date": 1_700_000_000,
                "chat": {"id": -1001, "type": "supergroup", "title": "ASHIM buyers"},
                "sender_chat": {"id": -1001, "type": "supergroup", "title": "ASHIM buyers"},
                "text": text
            }
        })
    }

    fn is_handled(flow: &ControlFlow<ResponseResult<()>, DependencyMap>) -> bool {
        matches!(flow, ControlFlow::Break(Ok(())))
    }

    #[tokio::test]
    async fn test_text_is_logged_with_sender_ids_and_answered() {
        let bot = TestBot::new();

        let flow = bot.deliver(private_text("  Where is my order?  ")).await;
        assert!(is_handled(&flow));

        let row = bot.log.latest().unwrap().expect("one row");
        assert_eq!(bot.log.count().unwrap(), 1);
        assert_eq!(row.user_id, 42);
        assert_eq!(row.username.as_deref(), Some("alice"));
        assert_eq!(row.message_text, "Where is my order?");

        assert_eq!(bot.prompts(), vec!["Where is my order?".to_string()]);
        assert_eq!(*bot.sink.texts.lock().unwrap(), vec![(555, "sure thing".to_string())]);
        assert!(bot.sink.greetings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_greets_without_logging_or_completion() {
        let bot = TestBot::new();

        let flow = bot.deliver(private_text("/start")).await;
        assert!(is_handled(&flow));

        assert_eq!(*bot.sink.greetings.lock().unwrap(), vec![(555, "Alice".to_string())]);
        assert_eq!(bot.log.count().unwrap(), 0);
        assert!(bot.prompts().is_empty());
        assert!(bot.sink.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_addressed_to_us_greets() {
        let bot = TestBot::new();

        bot.deliver(private_text("/start@ashim_bot")).await;

        assert_eq!(bot.sink.greetings.lock().unwrap().len(), 1);
        assert_eq!(bot.log.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_for_another_bot_is_plain_text() {
        let bot = TestBot::new();

        bot.deliver(private_text("/start@other_bot")).await;

        assert!(bot.sink.greetings.lock().unwrap().is_empty());
        assert_eq!(bot.log.count().unwrap(), 1);
        assert_eq!(bot.prompts(), vec!["/start@other_bot".to_string()]);
    }

    #[tokio::test]
    async fn test_start_without_sender_greets_generically() {
        let bot = TestBot::new();

        let flow = bot.deliver(anonymous_group_text("/start")).await;
        assert!(is_handled(&flow));

        assert_eq!(*bot.sink.greetings.lock().unwrap(), vec![(-1001, "there".to_string())]);
    }

    #[tokio::test]
    async fn test_text_without_sender_is_dropped() {
        let bot = TestBot::new();

        let flow = bot.deliver(anonymous_group_text("hello from an admin")).await;
        assert!(is_handled(&flow));

        assert_eq!(bot.log.count().unwrap(), 0);
        assert!(bot.prompts().is_empty());
        assert!(bot.sink.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_message_update_is_not_handled() {
        let bot = TestBot::new();

        let flow = bot
            .deliver(json!({
                "update_id": 3,
                "edited_message": {
                    "message_id": 10,
                    "date": 1_700_000_000,
                    "edit_date": 1_700_000_100,
                    "chat": {"id": 555, "type": "private", "first_name": "Alice"},
                    "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
                    "text": "edited"
                }
            }))
            .await;

        assert!(matches!(flow, ControlFlow::Continue(_)));
        assert_eq!(bot.log.count().unwrap(), 0);
    }
}
