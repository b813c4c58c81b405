//! Command structs

use teloxide::utils::command::{BotCommands, ParseError};

/// Hands the whole argument string to the variant, untouched but trimmed.
fn rest(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Show how to use the bot.")]
    Help,
    #[command(description = "Show how to use the bot.")]
    Start,
    #[command(description = "List registered users.")]
    List,
    #[command(description = "Show your balances.")]
    Status,
    #[command(
        description = "Record an expense: /add USERNAME... AMOUNT",
        parse_with = rest
    )]
    Add { args: String },
    #[command(
        description = "Show your history, optionally with one user.",
        parse_with = rest
    )]
    History { username: String },
}
