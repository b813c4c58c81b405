use std::sync::Arc;

use engine::{Engine, Money, Platform, User};
use migration::MigratorTrait;
use sea_orm::Database;
use telegram_bot::{Inbound, Orchestrator};

async fn orchestrator() -> Orchestrator {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    Orchestrator::new(Arc::new(engine))
}

async fn send(
    orchestrator: &Orchestrator,
    platform_id: &str,
    username: &str,
    text: &str,
) -> Option<String> {
    let sender = orchestrator
        .engine()
        .find_user(Platform::Telegram, platform_id)
        .await
        .unwrap();
    orchestrator
        .handle(Inbound {
            sender,
            platform: Platform::Telegram,
            platform_user_id: platform_id.to_string(),
            username: username.to_string(),
            text: text.to_string(),
        })
        .await
}

async fn join(orchestrator: &Orchestrator, platform_id: &str, username: &str) -> User {
    let greeting = send(orchestrator, platform_id, username, "/start").await.unwrap();
    assert!(greeting.starts_with("Hello! I've created you an account."));
    orchestrator
        .engine()
        .find_user(Platform::Telegram, platform_id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn first_message_registers_sender() {
    let orchestrator = orchestrator().await;
    let alice = join(&orchestrator, "1", "alice").await;
    assert_eq!(alice.username(Platform::Telegram), Some("alice"));

    let help = send(&orchestrator, "1", "alice", "/help").await.unwrap();
    assert!(help.contains("/add USERNAME BALANCE"));
    assert!(help.contains("/status"));
}

#[tokio::test]
async fn add_then_status_from_both_sides() {
    let orchestrator = orchestrator().await;
    let alice = join(&orchestrator, "1", "alice").await;
    let bob = join(&orchestrator, "2", "bob").await;
    join(&orchestrator, "3", "carol").await;

    let reply = send(&orchestrator, "1", "alice", "/add bob carol 10").await;
    assert_eq!(reply.as_deref(), Some("Balance Created"));

    let account = orchestrator
        .engine()
        .find_between(alice.id, bob.id)
        .await
        .unwrap();
    assert_eq!(account.balance, Money::new(5));

    let alice_status = send(&orchestrator, "1", "alice", "/status").await.unwrap();
    assert!(alice_status.starts_with("Your Accounts (2 Accounts):"));
    assert!(alice_status.contains("bob owes you $5"));
    assert!(alice_status.contains("carol owes you $5"));

    let bob_status = send(&orchestrator, "2", "bob", "/status").await.unwrap();
    assert!(bob_status.contains("You owe alice $5"));

    let reply = send(&orchestrator, "1", "alice", "/add bob -3").await;
    assert_eq!(reply.as_deref(), Some("Balance Created"));
    let bob_status = send(&orchestrator, "2", "bob", "/status").await.unwrap();
    assert!(bob_status.contains("You owe alice $2"));
}

#[tokio::test]
async fn add_rejections() {
    let orchestrator = orchestrator().await;
    join(&orchestrator, "1", "alice").await;
    join(&orchestrator, "2", "bob").await;

    let reply = send(&orchestrator, "1", "alice", "/add bob").await;
    assert_eq!(reply.as_deref(), Some("Balance cannot be 0"));

    let reply = send(&orchestrator, "1", "alice", "/add bob 0").await;
    assert_eq!(reply.as_deref(), Some("Balance cannot be 0"));

    let reply = send(&orchestrator, "1", "alice", "/add alice 10").await;
    assert_eq!(reply.as_deref(), Some("Cannot create a balance with yourself"));

    let reply = send(&orchestrator, "1", "alice", "/add zed 10").await;
    assert_eq!(reply.as_deref(), Some("Failed to find user zed"));

    let status = send(&orchestrator, "1", "alice", "/status").await.unwrap();
    assert!(status.starts_with("You have no balances yet."));
}

#[tokio::test]
async fn add_overflow_is_not_reported_as_zero() {
    let orchestrator = orchestrator().await;
    let alice = join(&orchestrator, "1", "alice").await;
    let bob = join(&orchestrator, "2", "bob").await;

    let reply = send(&orchestrator, "1", "alice", "/add bob 9223372036854775807").await;
    assert_eq!(reply.as_deref(), Some("Balance Created"));

    let reply = send(&orchestrator, "1", "alice", "/add bob 10")
        .await
        .unwrap();
    assert!(reply.starts_with("Invalid balance: "), "{reply}");

    let account = orchestrator
        .engine()
        .find_between(alice.id, bob.id)
        .await
        .unwrap();
    assert_eq!(account.balance, Money::new(i64::MAX));

    let status = send(&orchestrator, "2", "bob", "/status").await.unwrap();
    assert!(status.contains("You owe alice $9223372036854775807"));
}

#[tokio::test]
async fn history_and_list() {
    let orchestrator = orchestrator().await;
    join(&orchestrator, "1", "alice").await;
    join(&orchestrator, "2", "bob").await;

    send(&orchestrator, "1", "alice", "/add @Bob 4").await;

    let history = send(&orchestrator, "2", "bob", "/history").await.unwrap();
    assert!(history.starts_with("Account History\n\n"));
    assert!(history.contains("alice requested $4 from you"));

    let history = send(&orchestrator, "1", "alice", "/history bob").await.unwrap();
    assert!(history.starts_with("Account History (bob)\n\n"));
    assert!(history.contains("alice requested $4 from bob"));

    let reply = send(&orchestrator, "1", "alice", "/history zed").await;
    assert_eq!(reply.as_deref(), Some("Failed to find user zed"));

    let list = send(&orchestrator, "1", "alice", "/list").await.unwrap();
    assert!(list.starts_with("Available Users:\n"));
    assert!(list.contains("• alice\n"));
    assert!(list.contains("• bob\n"));
}

#[tokio::test]
async fn unknown_command_is_echoed() {
    let orchestrator = orchestrator().await;
    join(&orchestrator, "1", "alice").await;

    let reply = send(&orchestrator, "1", "alice", "/pay bob 5").await;
    assert_eq!(reply.as_deref(), Some("Unknown command '/pay bob 5'"));
}
