//! Platform-neutral command handling.
//!
//! A transport turns every chat message into an [`Inbound`] and sends back
//! whatever [`Orchestrator::handle`] returns. Nothing in here knows about
//! Telegram.

use std::sync::Arc;

use engine::{Engine, EngineError, ErrorKind, Platform, User};
use teloxide::utils::command::BotCommands;

use crate::{commands::Command, parsing::parse_add};

const GREETING: &str = "Hello! I've created you an account. If you need help, or want to know how to use this bot, run /help!";
const TRY_LATER: &str = "Failed to create transaction, please try again later";

const HELP: &str = "Hi! I'm a bot that will help you track balances between people!

If you want to create a transaction between you and another user, just run /add USERNAME BALANCE

If you want to create a transaction between you and multiple people, run /add USERNAME USERNAME... BALANCE

To view all transactions relating to you, run /history

To view transactions between you and a user, run /history USERNAME

To list all registered users, run /list

To list all account balances, run /status";

/// One chat message, as seen by the orchestrator.
#[derive(Clone, Debug)]
pub struct Inbound {
    /// The registered sender, `None` if the platform identity is unknown.
    pub sender: Option<User>,
    pub platform: Platform,
    pub platform_user_id: String,
    pub username: String,
    pub text: String,
}

pub struct Orchestrator {
    engine: Arc<Engine>,
    bot_name: String,
}

impl Orchestrator {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            bot_name: String::new(),
        }
    }

    /// Accept commands addressed as `/cmd@bot_name`.
    pub fn with_bot_name(mut self, bot_name: &str) -> Self {
        self.bot_name = bot_name.to_string();
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The reply to `inbound`, if any.
    pub async fn handle(&self, inbound: Inbound) -> Option<String> {
        tracing::debug!(
            "got message from {}:{}: {}",
            inbound.platform,
            inbound.platform_user_id,
            inbound.text
        );

        let sender = match inbound.sender.clone() {
            Some(sender) => sender,
            None => return self.welcome(&inbound).await,
        };
        Some(self.dispatch(&sender, inbound.platform, &inbound.text).await)
    }

    /// Registers an unknown sender.
    async fn welcome(&self, inbound: &Inbound) -> Option<String> {
        let username = match inbound.username.trim() {
            "" => inbound.platform_user_id.as_str(),
            name => name,
        };
        match self
            .engine
            .register_user(inbound.platform, &inbound.platform_user_id, username)
            .await
        {
            Ok(_) => Some(GREETING.to_string()),
            // Registered in the meantime: handle the message as theirs.
            Err(EngineError::ExistingKey(_) | EngineError::IdentityConflict(_)) => {
                match self
                    .engine
                    .find_user(inbound.platform, &inbound.platform_user_id)
                    .await
                {
                    Ok(Some(sender)) => {
                        Some(self.dispatch(&sender, inbound.platform, &inbound.text).await)
                    }
                    Ok(None) => None,
                    Err(err) => {
                        tracing::error!("failed to resolve {}: {err}", inbound.platform_user_id);
                        None
                    }
                }
            }
            Err(err) => {
                tracing::error!(
                    "failed to register {}:{}: {err}",
                    inbound.platform,
                    inbound.platform_user_id
                );
                Some("Failed to create your account, please try again later".to_string())
            }
        }
    }

    async fn dispatch(&self, sender: &User, platform: Platform, text: &str) -> String {
        let command = match Command::parse(text.trim(), &self.bot_name) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!("unknown command '{text}': {err}");
                return format!("Unknown command '{text}'");
            }
        };

        match command {
            Command::Help | Command::Start => HELP.to_string(),
            Command::List => self.list(platform).await,
            Command::Status => self.status(sender, platform).await,
            Command::Add { args } => self.add(sender, platform, &args).await,
            Command::History { username } => self.history(sender, platform, &username).await,
        }
    }

    async fn list(&self, platform: Platform) -> String {
        match self.engine.list_users().await {
            Ok(users) => {
                let mut out = "Available Users:\n".to_string();
                for user in users {
                    out.push_str(&format!("• {}\n", user.display_name(platform)));
                }
                out
            }
            Err(err) => {
                tracing::error!("failed to list users: {err}");
                "Failed to list users, please try again later".to_string()
            }
        }
    }

    async fn status(&self, sender: &User, platform: Platform) -> String {
        match self.engine.balance_summary(sender, platform).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!("failed to summarize balances of {}: {err}", sender.id);
                "Failed to retrieve your balances".to_string()
            }
        }
    }

    async fn history(&self, sender: &User, platform: Platform, username: &str) -> String {
        let filter = if username.is_empty() {
            None
        } else {
            match self.engine.find_user_by_username(platform, username).await {
                Ok(user) => Some(user),
                Err(EngineError::KeyNotFound(_)) => {
                    return format!("Failed to find user {username}");
                }
                Err(err) => {
                    tracing::error!("failed to look up {username}: {err}");
                    return "Failed to retrieve your history".to_string();
                }
            }
        };

        match self
            .engine
            .history_statement(sender, filter.as_ref(), platform)
            .await
        {
            Ok(statement) => statement,
            Err(err) => {
                tracing::error!("failed to build history of {}: {err}", sender.id);
                "Failed to retrieve your history".to_string()
            }
        }
    }

    async fn add(&self, sender: &User, platform: Platform, args: &str) -> String {
        let request = match parse_add(args) {
            Ok(request) => request,
            Err(err) => return err.to_string(),
        };

        let mut participants = Vec::with_capacity(request.usernames.len());
        for name in &request.usernames {
            match self.engine.find_user_by_username(platform, name).await {
                Ok(user) => participants.push(user),
                Err(EngineError::KeyNotFound(_)) => return format!("Failed to find user {name}"),
                Err(err) => {
                    tracing::error!("failed to look up {name}: {err}");
                    return TRY_LATER.to_string();
                }
            }
        }

        let ids: Vec<_> = participants.iter().map(|user| user.id).collect();
        match self
            .engine
            .record_expense(sender.id, &ids, request.amount)
            .await
        {
            Ok(receipt) if receipt.is_complete() => "Balance Created".to_string(),
            Ok(receipt) => {
                let failed: Vec<String> = receipt
                    .failures
                    .iter()
                    .map(|failure| {
                        participants
                            .iter()
                            .find(|user| user.id == failure.participant)
                            .map(|user| user.display_name(platform))
                            .unwrap_or_else(|| failure.participant.to_string())
                    })
                    .collect();
                tracing::warn!(
                    "expense by {} only partially applied, failed: {}",
                    sender.id,
                    failed.join(", ")
                );
                format!(
                    "Balance Created, but failed to update the balance with {}",
                    failed.join(", ")
                )
            }
            Err(EngineError::SelfTransaction(_)) => {
                "Cannot create a balance with yourself".to_string()
            }
            Err(EngineError::ZeroAmount(reason)) => {
                tracing::debug!("rejected expense by {}: {reason}", sender.id);
                "Balance cannot be 0".to_string()
            }
            Err(EngineError::InvalidAmount(reason)) => {
                tracing::debug!("rejected expense by {}: {reason}", sender.id);
                format!("Invalid balance: {reason}")
            }
            Err(err) if err.kind() == ErrorKind::InvalidInput => {
                tracing::warn!("rejected expense by {}: {err}", sender.id);
                "Cannot create this balance with these users".to_string()
            }
            Err(err) if err.is_fault() => {
                tracing::error!("failed to record expense by {}: {err}", sender.id);
                TRY_LATER.to_string()
            }
            Err(err) => {
                tracing::warn!("failed to record expense by {}: {err}", sender.id);
                TRY_LATER.to_string()
            }
        }
    }
}
