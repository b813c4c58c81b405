mod common;

use std::time::Duration;

use common::{engine_with_db, register};
use engine::{Engine, EngineError, Platform};

#[tokio::test]
async fn register_then_find_by_platform_and_name() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1001", "@Alice").await;
    assert_eq!(alice.username(Platform::Telegram), Some("Alice"));

    let found = engine
        .find_user(Platform::Telegram, "1001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, alice.id);

    let by_name = engine
        .find_user_by_username(Platform::Telegram, "alice")
        .await
        .unwrap();
    assert_eq!(by_name.id, alice.id);
    let by_name = engine
        .find_user_by_username(Platform::Telegram, "@ALICE")
        .await
        .unwrap();
    assert_eq!(by_name.id, alice.id);

    let err = engine
        .find_user_by_username(Platform::Telegram, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert!(
        engine
            .find_user(Platform::Telegram, "9999")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn register_twice_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    register(&engine, "1001", "alice").await;

    let err = engine
        .register_user(Platform::Telegram, "1001", "other")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.list_users().await.unwrap().len(), 1);

    let err = engine
        .register_user(Platform::Telegram, "  ", "nobody")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidId(_)));
}

#[tokio::test]
async fn resolve_or_register_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let first = engine
        .resolve_or_register(Platform::Telegram, "42", "dave")
        .await
        .unwrap();
    let second = engine
        .resolve_or_register(Platform::Telegram, "42", "dave")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(engine.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn lookups_are_cached_and_cache_can_be_disabled() {
    let (engine, db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;

    engine.user(alice.id).await.unwrap();
    assert_eq!(
        engine
            .identity_cache()
            .by_id(alice.id)
            .map(|u| u.id),
        Some(alice.id)
    );
    assert!(
        engine
            .identity_cache()
            .by_platform(Platform::Telegram, "1")
            .is_some()
    );

    let uncached = Engine::builder()
        .database(db)
        .user_cache_ttl(Duration::ZERO)
        .build()
        .await
        .unwrap();
    assert!(!uncached.identity_cache().enabled());
    let found = uncached.user(alice.id).await.unwrap();
    assert_eq!(found.id, alice.id);
    assert!(uncached.identity_cache().by_id(alice.id).is_none());
}

#[tokio::test]
async fn display_names_skip_unknown_users() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;
    let ghost = uuid::Uuid::new_v4();

    let names = engine
        .display_names(Platform::Telegram, [alice.id, bob.id, ghost, alice.id])
        .await
        .unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(names[&alice.id], "alice");
    assert_eq!(names[&bob.id], "bob");
}

#[tokio::test]
async fn list_users_oldest_first() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let bob = register(&engine, "2", "bob").await;

    let users = engine.list_users().await.unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![alice.id, bob.id]);
}
