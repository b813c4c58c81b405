use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;
use telegram_bot::UserId;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "balance={level},telegram_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .user_cache_ttl(settings.cache.user_ttl())
        .build()
        .await?;

    let Some(telegram) = settings.telegram else {
        tracing::warn!("no telegram settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found telegram settings...");
    let bot = telegram_bot::Bot::builder()
        .token(&telegram.token)
        .allowed_users(telegram.allowed_users.into_iter().map(UserId).collect())
        .engine(Arc::new(engine))
        .build()?;
    bot.run().await;

    tracing::info!("shutting down");
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
