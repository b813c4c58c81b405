mod common;

use std::sync::Arc;

use common::{engine_with_db, engine_with_file_db, register};
use engine::{AccountCreation, Direction, EngineError, Money, Role};
use uuid::Uuid;

#[tokio::test]
async fn find_between_is_symmetric() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;

    let created = engine
        .create_account(alice.id, bob.id, Money::new(5))
        .await
        .unwrap();

    let ab = engine.find_between(alice.id, bob.id).await.unwrap();
    let ba = engine.find_between(bob.id, alice.id).await.unwrap();
    assert_eq!(ab.id, created.id);
    assert_eq!(ba.id, created.id);
    assert_eq!(ab.creator_id, alice.id);
    assert_eq!(ab.subject_id, bob.id);
    assert_eq!(ab.balance, Money::new(5));
}

#[tokio::test]
async fn create_account_rejects_second_account_for_pair() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;

    engine
        .create_account(alice.id, bob.id, Money::new(5))
        .await
        .unwrap();

    let err = engine
        .create_account(bob.id, alice.id, Money::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // The first account is untouched.
    let account = engine.find_between(alice.id, bob.id).await.unwrap();
    assert_eq!(account.balance, Money::new(5));
    assert_eq!(engine.accounts_for(alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_account_rejects_self_and_unknown_users() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;

    let err = engine
        .create_account(alice.id, alice.id, Money::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAccount(_)));

    let err = engine
        .create_account(alice.id, Uuid::new_v4(), Money::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAccount(_)));
    assert!(engine.accounts_for(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ensure_account_reports_existing_pair() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;

    let first = engine
        .ensure_account(alice.id, bob.id, Money::new(7))
        .await
        .unwrap();
    assert!(matches!(first, AccountCreation::Created(_)));

    let second = engine
        .ensure_account(bob.id, alice.id, Money::new(3))
        .await
        .unwrap();
    let AccountCreation::AlreadyExisted(existing) = second else {
        panic!("expected AlreadyExisted, got {second:?}");
    };
    assert_eq!(existing.id, first.account().id);
    // The losing opening balance is not applied.
    assert_eq!(existing.balance, Money::new(7));
}

#[tokio::test]
async fn apply_charge_without_account_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;

    let err = engine
        .apply_charge(alice.id, bob.id, Money::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(engine.find_between(alice.id, bob.id).await.is_err());
}

#[tokio::test]
async fn apply_charge_is_oriented_by_initiator_role() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;

    engine
        .create_account(alice.id, bob.id, Money::new(5))
        .await
        .unwrap();

    // bob is the subject: his charge moves the balance down.
    let account = engine
        .apply_charge(bob.id, alice.id, Money::new(8))
        .await
        .unwrap();
    assert_eq!(account.role_of(bob.id), Some(Role::Subject));
    assert_eq!(account.balance, Money::new(-3));

    let alice_view = account.position_for(alice.id).unwrap();
    assert_eq!(alice_view.direction, Direction::YouOwe);
    assert_eq!(alice_view.amount, Money::new(3));
    let bob_view = account.position_for(bob.id).unwrap();
    assert_eq!(bob_view.direction, Direction::TheyOwe);
    assert_eq!(bob_view.amount, Money::new(3));

    // A negative amount from the creator is a payment.
    let account = engine
        .apply_charge(alice.id, bob.id, Money::new(-2))
        .await
        .unwrap();
    assert_eq!(account.balance, Money::new(-5));
}

#[tokio::test]
async fn accounts_for_lists_both_roles() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;
    let carol = register(&engine, "3", "carol").await;

    engine
        .create_account(alice.id, bob.id, Money::new(1))
        .await
        .unwrap();
    engine
        .create_account(carol.id, alice.id, Money::new(2))
        .await
        .unwrap();
    engine
        .create_account(bob.id, carol.id, Money::new(3))
        .await
        .unwrap();

    let accounts = engine.accounts_for(alice.id).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts.iter().all(|a| a.role_of(alice.id).is_some()));
}

#[tokio::test]
async fn concurrent_charges_are_not_lost() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let alice = register(&engine, "1", "alice").await;
    let bob = register(&engine, "2", "bob").await;
    engine
        .create_account(alice.id, bob.id, Money::ZERO)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        let (from, to) = if i % 2 == 0 {
            (alice.id, bob.id)
        } else {
            (bob.id, alice.id)
        };
        handles.push(tokio::spawn(async move {
            engine.apply_charge(from, to, Money::new(3)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Ten charges each way cancel out exactly.
    let account = engine.find_between(alice.id, bob.id).await.unwrap();
    assert_eq!(account.balance, Money::ZERO);

    let mut handles = Vec::new();
    for _ in 0..15 {
        let engine = Arc::clone(&engine);
        let (from, to) = (alice.id, bob.id);
        handles.push(tokio::spawn(async move {
            engine.apply_charge(from, to, Money::new(2)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    let account = engine.find_between(alice.id, bob.id).await.unwrap();
    assert_eq!(account.balance, Money::new(30));

    drop(engine);
    let _ = std::fs::remove_file(path);
}
