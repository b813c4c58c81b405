//! Ledger entries.
//!
//! A `Transaction` is the immutable audit record of one expense event. It is
//! not the source of truth for balances, accounts are.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, Split, transaction_participants, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    /// The user who recorded the expense.
    pub created_by: Uuid,
    /// Users charged by this expense, initiator excluded.
    pub participants: Vec<Uuid>,
    /// Whole amount as recorded, before splitting.
    pub amount: Money,
    /// Amount applied to each participant's account.
    pub share: Money,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(created_by: Uuid, participants: Vec<Uuid>, split: &Split) -> ResultEngine<Self> {
        if participants.is_empty() {
            return Err(EngineError::InvalidAmount(
                "a transaction needs at least one participant".to_string(),
            ));
        }
        if participants.contains(&created_by) {
            return Err(EngineError::SelfTransaction(
                "the initiator cannot be a participant".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            created_by,
            participants,
            amount: split.total(),
            share: split.share(),
            created_at: Utc::now(),
        })
    }

    /// `true` if `user` recorded the expense or was charged by it.
    pub fn involves(&self, user: Uuid) -> bool {
        self.created_by == user || self.participants.contains(&user)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_by: String,
    pub amount: i64,
    pub share: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction_participants::Entity")]
    Participants,
}

impl Related<super::transaction_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            created_by: ActiveValue::Set(tx.created_by.to_string()),
            amount: ActiveValue::Set(tx.amount.units()),
            share: ActiveValue::Set(tx.share.units()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<(Model, Vec<transaction_participants::Model>)> for Transaction {
    type Error = EngineError;

    fn try_from(
        (model, participants): (Model, Vec<transaction_participants::Model>),
    ) -> ResultEngine<Self> {
        let mut participants = participants;
        participants.sort_by_key(|p| p.position);
        let participants = participants
            .iter()
            .map(|p| parse_uuid(&p.user_id, "participant"))
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            created_by: parse_uuid(&model.created_by, "initiator")?,
            participants,
            amount: Money::new(model.amount),
            share: Money::new(model.share),
            created_at: model.created_at,
        })
    }
}
