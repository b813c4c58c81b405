use sea_orm::{Condition, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, EngineError, Money, ResultEngine, accounts, users, util::is_unique_violation,
};

use super::{Engine, with_tx};

/// Outcome of [`Engine::ensure_account`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountCreation {
    Created(Account),
    /// The pair already had an account; the opening balance was not applied.
    AlreadyExisted(Account),
}

impl AccountCreation {
    pub fn account(&self) -> &Account {
        match self {
            Self::Created(account) | Self::AlreadyExisted(account) => account,
        }
    }
}

/// Accounts whose `{creator, subject}` equals `{u1, u2}`, in either order.
fn between(u1: Uuid, u2: Uuid) -> Condition {
    let (a, b) = (u1.to_string(), u2.to_string());
    Condition::any()
        .add(
            Condition::all()
                .add(accounts::Column::CreatorId.eq(a.clone()))
                .add(accounts::Column::SubjectId.eq(b.clone())),
        )
        .add(
            Condition::all()
                .add(accounts::Column::CreatorId.eq(b))
                .add(accounts::Column::SubjectId.eq(a)),
        )
}

pub(super) async fn find_between_in<C: ConnectionTrait>(
    db: &C,
    u1: Uuid,
    u2: Uuid,
) -> ResultEngine<Account> {
    let mut models = accounts::Entity::find()
        .filter(between(u1, u2))
        .order_by_asc(accounts::Column::CreatedAt)
        .all(db)
        .await?;

    match models.len() {
        0 => Err(EngineError::KeyNotFound("account".to_string())),
        1 => Account::try_from(models.remove(0)),
        n => {
            tracing::error!("{n} accounts found between {u1} and {u2}, expected one");
            Err(EngineError::DataIntegrity(format!(
                "{n} accounts between {u1} and {u2}"
            )))
        }
    }
}

async fn user_exists<C: ConnectionTrait>(db: &C, id: Uuid) -> ResultEngine<bool> {
    Ok(users::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .is_some())
}

impl Engine {
    /// The single account between two users, regardless of who created it.
    pub async fn find_between(&self, u1: Uuid, u2: Uuid) -> ResultEngine<Account> {
        find_between_in(&self.database, u1, u2).await
    }

    pub async fn account(&self, id: Uuid) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account".to_string()))?;
        Account::try_from(model)
    }

    /// Opens the account between `creator` and `subject`.
    ///
    /// Fails with `InvalidAccount` for a self-account or an unknown party and
    /// with `ExistingKey` if the pair already has an account.
    pub async fn create_account(
        &self,
        creator: Uuid,
        subject: Uuid,
        opening: Money,
    ) -> ResultEngine<Account> {
        let account = Account::new(creator, subject, opening)?;
        with_tx!(self, |db_tx| {
            for id in [creator, subject] {
                if !user_exists(&db_tx, id).await? {
                    return Err(EngineError::InvalidAccount(format!("user {id} not exists")));
                }
            }
            match find_between_in(&db_tx, creator, subject).await {
                Ok(_) => return Err(EngineError::ExistingKey(account.pair_key())),
                Err(EngineError::KeyNotFound(_)) => {}
                Err(err) => return Err(err),
            }

            match accounts::ActiveModel::from(&account).insert(&db_tx).await {
                Ok(_) => Ok(account),
                Err(err) if is_unique_violation(&err) => {
                    Err(EngineError::ExistingKey(account.pair_key()))
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Opens the account between `creator` and `subject` unless the pair
    /// already has one.
    ///
    /// Relies on the unique pair key: losing a concurrent creation race is
    /// reported as [`AccountCreation::AlreadyExisted`], not as an error.
    /// Fails with `InvalidAccount` for a self-account or an unknown party.
    pub async fn ensure_account(
        &self,
        creator: Uuid,
        subject: Uuid,
        opening: Money,
    ) -> ResultEngine<AccountCreation> {
        let account = Account::new(creator, subject, opening)?;
        for id in [creator, subject] {
            if !user_exists(&self.database, id).await? {
                return Err(EngineError::InvalidAccount(format!("user {id} not exists")));
            }
        }
        match accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await
        {
            Ok(_) => {
                tracing::info!("opened account {} between {creator} and {subject}", account.id);
                Ok(AccountCreation::Created(account))
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::debug!("account between {creator} and {subject} already exists");
                let existing = self.find_between(creator, subject).await?;
                Ok(AccountCreation::AlreadyExisted(existing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Every account `user` is a party to, oldest first.
    pub async fn accounts_for(&self, user: Uuid) -> ResultEngine<Vec<Account>> {
        let id = user.to_string();
        accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::CreatorId.eq(id.clone()))
                    .add(accounts::Column::SubjectId.eq(id)),
            )
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }
}
