use engine::Platform;
use teloxide::{
    prelude::*,
    types::{ReplyParameters, User},
};

use crate::{ConfigParameters, orchestrator::Inbound};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let platform_user_id = from.id.0.to_string();
    let sender = match cfg
        .orchestrator
        .engine()
        .find_user(Platform::Telegram, &platform_user_id)
        .await
    {
        Ok(sender) => sender,
        Err(err) => {
            tracing::error!("failed to resolve telegram user {platform_user_id}: {err}");
            bot.send_message(msg.chat.id, "Something went wrong, please try again later")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let inbound = Inbound {
        sender,
        platform: Platform::Telegram,
        platform_user_id,
        username: username_of(from),
        text: text.to_string(),
    };

    if let Some(reply) = cfg.orchestrator.handle(inbound).await {
        bot.send_message(msg.chat.id, reply)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
    }
    Ok(())
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}

/// Telegram username, or first and last name when the user has none.
fn username_of(user: &User) -> String {
    let name = match &user.username {
        Some(username) => username.clone(),
        None => format!(
            "{}{}",
            user.first_name,
            user.last_name.as_deref().unwrap_or_default()
        ),
    };
    name.to_lowercase()
}
