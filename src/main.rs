use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use ashim_relay::completion::CompletionClient;
use ashim_relay::config::Config;
use ashim_relay::relay::{MessageHandler, MessageLog, RelayState, TelegramClient, run_receive_loop};
use ashim_relay::{liveness, supervisor, telegram_log};

const RECEIVE_LOOP_RESTART_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let bot = Bot::new(&config.telegram_token);

    // Setup logging
    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log dir {:?}: {e}", config.log_dir);
        return ExitCode::FAILURE;
    }
    let file_appender = tracing_appender::rolling::never(&config.log_dir, "relay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_chat_id) = config.log_chat_id {
        let tg_layer = telegram_log::TelegramLogLayer::new(bot.clone(), log_chat_id);
        registry.with(tg_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting ASHIM relay...");
    info!("Model: {} at {}", config.groq_model, config.groq_api_url);

    match run(config, bot).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, bot: Bot) -> Result<(), Box<dyn std::error::Error>> {
    let log = Arc::new(MessageLog::open(&config.database_path)?);

    let completion = Arc::new(CompletionClient::new(
        config.groq_api_key.clone(),
        &config.groq_api_url,
        config.groq_model.clone(),
        config.completion_timeout,
    )?);

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id.0, me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            warn!("Failed to get bot info: {e}");
            None
        }
    };

    let telegram = Arc::new(TelegramClient::new(bot.clone()));
    let state = Arc::new(RelayState {
        sink: telegram.clone(),
        handler: MessageHandler::new(log, completion, telegram),
        bot_username,
    });

    tokio::spawn(supervisor::supervise(
        "receive loop",
        RECEIVE_LOOP_RESTART_DELAY,
        move || run_receive_loop(bot.clone(), state.clone()),
    ));

    let liveness = tokio::spawn(liveness::serve(config.port));

    info!("✅ Bot and liveness endpoint running on port {}", config.port);

    tokio::select! {
        result = liveness => match result {
            Ok(Ok(())) => Err("liveness endpoint stopped".into()),
            Ok(Err(e)) => Err(format!("liveness endpoint failed: {e}").into()),
            Err(e) => Err(format!("liveness endpoint crashed: {e}").into()),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    }
}
