//! Telegram bot.
//!
//! Every message is turned into a platform-neutral [`Inbound`] and answered by
//! the [`Orchestrator`]; this crate only adds the teloxide plumbing around it.

use std::sync::Arc;

use engine::Engine;
use teloxide::{prelude::*, utils::command::BotCommands};

mod commands;
mod handlers;
mod orchestrator;
mod parsing;

pub use commands::Command;
pub use orchestrator::{Inbound, Orchestrator};
pub use teloxide::types::UserId;

#[derive(Clone)]
pub(crate) struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    orchestrator: Arc<Orchestrator>,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Arc<Engine>,
}

impl Bot {
    pub fn new(token: &str, allowed_users: Option<Vec<UserId>>, engine: Arc<Engine>) -> Self {
        Self {
            token: token.to_string(),
            allowed_users,
            engine,
        }
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let bot_name = match bot.get_me().await {
            Ok(me) => me.user.username.clone().unwrap_or_default(),
            Err(err) => {
                tracing::warn!("failed to fetch bot identity: {err}");
                String::new()
            }
        };
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("failed to publish the command list: {err}");
        }

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            orchestrator: Arc::new(
                Orchestrator::new(Arc::clone(&self.engine)).with_bot_name(&bot_name),
            ),
        };

        let handler = Update::filter_message().endpoint(handlers::handle_message);

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Option<Arc<Engine>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<UserId>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users);
        }
        self
    }

    pub fn engine(mut self, engine: Arc<Engine>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("missing telegram token".to_string());
        }
        let engine = self
            .engine
            .ok_or_else(|| "missing engine".to_string())?;
        Ok(Bot::new(&self.token, self.allowed_users, engine))
    }
}
