//! Pairwise accounts.
//!
//! An `Account` is the single row holding the running balance between two
//! users. The user who caused the account to exist is the *creator*, the
//! counterparty is the *subject*. Roles are fixed at creation.
//!
//! Sign convention: `balance > 0` means the subject owes the creator,
//! `balance < 0` means the creator owes the subject. [`Role::orient`] is the
//! only place that convention is encoded; both charging and presentation go
//! through it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

/// Side of a pairwise account a user sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Creator,
    Subject,
}

impl Role {
    /// Re-expresses an amount from the account's point of view (creator
    /// positive) into this role's point of view, and back.
    ///
    /// - charging: the balance moves by `role.orient(signed_amount)` where
    ///   `role` is the initiator's role.
    /// - presenting: `role.orient(balance)` is what the other party owes the
    ///   user (negative: what the user owes).
    #[must_use]
    pub fn orient(self, amount: Money) -> Money {
        match self {
            Self::Creator => amount,
            Self::Subject => -amount,
        }
    }
}

/// Which way a debt flows, seen from one party.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The counterparty owes the user.
    TheyOwe,
    /// The user owes the counterparty.
    YouOwe,
    Settled,
}

/// An account seen from one of its parties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub account_id: Uuid,
    pub counterparty: Uuid,
    /// Magnitude of the debt, never negative.
    pub amount: Money,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub subject_id: Uuid,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn new(creator_id: Uuid, subject_id: Uuid, balance: Money) -> ResultEngine<Self> {
        if creator_id.is_nil() || subject_id.is_nil() {
            return Err(EngineError::InvalidAccount(
                "an account must have a creator and a subject".to_string(),
            ));
        }
        if creator_id == subject_id {
            return Err(EngineError::InvalidAccount(
                "cannot open an account with yourself".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            creator_id,
            subject_id,
            balance,
            created_at: now,
            updated_at: now,
        })
    }

    /// Role of `user` in this account, `None` if not a party.
    pub fn role_of(&self, user: Uuid) -> Option<Role> {
        if user == self.creator_id {
            Some(Role::Creator)
        } else if user == self.subject_id {
            Some(Role::Subject)
        } else {
            None
        }
    }

    /// The other party, `None` if `user` is not a party.
    pub fn counterparty_of(&self, user: Uuid) -> Option<Uuid> {
        match self.role_of(user)? {
            Role::Creator => Some(self.subject_id),
            Role::Subject => Some(self.creator_id),
        }
    }

    /// Debt position of `user`, `None` if not a party.
    pub fn position_for(&self, user: Uuid) -> Option<Position> {
        let role = self.role_of(user)?;
        let counterparty = self.counterparty_of(user)?;
        let net = role.orient(self.balance);
        let direction = if net.is_positive() {
            Direction::TheyOwe
        } else if net.is_negative() {
            Direction::YouOwe
        } else {
            Direction::Settled
        };
        Some(Position {
            account_id: self.id,
            counterparty,
            amount: net.magnitude(),
            direction,
        })
    }

    /// Canonical key of the unordered pair `{creator, subject}`.
    pub fn pair_key(&self) -> String {
        pair_key(self.creator_id, self.subject_id)
    }
}

/// Order-independent key for the pair `{a, b}`.
pub(crate) fn pair_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}:{high}")
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub creator_id: String,
    pub subject_id: String,
    #[sea_orm(unique)]
    pub pair_key: String,
    pub balance: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubjectId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Subject,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            creator_id: ActiveValue::Set(account.creator_id.to_string()),
            subject_id: ActiveValue::Set(account.subject_id.to_string()),
            pair_key: ActiveValue::Set(account.pair_key()),
            balance: ActiveValue::Set(account.balance.units()),
            created_at: ActiveValue::Set(account.created_at),
            updated_at: ActiveValue::Set(account.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            creator_id: parse_uuid(&model.creator_id, "creator")?,
            subject_id: parse_uuid(&model.subject_id, "subject")?,
            balance: Money::new(model.balance),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
