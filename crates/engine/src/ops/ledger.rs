use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Query,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Split, Transaction, transaction_participants, transactions,
};

use super::{Engine, with_tx};

/// Transactions recorded by `user` or charging `user`.
fn involving(user: Uuid) -> Condition {
    let id = user.to_string();
    Condition::any()
        .add(transactions::Column::CreatedBy.eq(id.clone()))
        .add(
            transactions::Column::Id.in_subquery(
                Query::select()
                    .column(transaction_participants::Column::TransactionId)
                    .from(transaction_participants::Entity)
                    .and_where(transaction_participants::Column::UserId.eq(id))
                    .to_owned(),
            ),
        )
}

/// Attach participants to transaction rows, preserving the input order.
async fn hydrate_transactions<C: ConnectionTrait>(
    db: &C,
    models: Vec<transactions::Model>,
) -> ResultEngine<Vec<Transaction>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
    let mut participants: HashMap<String, Vec<transaction_participants::Model>> = HashMap::new();
    for row in transaction_participants::Entity::find()
        .filter(transaction_participants::Column::TransactionId.is_in(ids))
        .all(db)
        .await?
    {
        participants
            .entry(row.transaction_id.clone())
            .or_default()
            .push(row);
    }

    models
        .into_iter()
        .map(|model| {
            let rows = participants.remove(&model.id).unwrap_or_default();
            Transaction::try_from((model, rows))
        })
        .collect()
}

impl Engine {
    /// Appends one immutable ledger entry for an expense by `initiator`
    /// charging `participants` `split.share()` each.
    pub async fn append(
        &self,
        initiator: Uuid,
        participants: Vec<Uuid>,
        split: &Split,
    ) -> ResultEngine<Transaction> {
        let tx = Transaction::new(initiator, participants, split)?;
        with_tx!(self, |db_tx| {
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            for (position, participant) in tx.participants.iter().enumerate() {
                let position = i32::try_from(position).map_err(|_| {
                    EngineError::InvalidAmount("too many participants".to_string())
                })?;
                transaction_participants::ActiveModel {
                    transaction_id: ActiveValue::Set(tx.id.to_string()),
                    user_id: ActiveValue::Set(participant.to_string()),
                    position: ActiveValue::Set(position),
                }
                .insert(&db_tx)
                .await?;
            }
            Ok::<_, EngineError>(())
        })?;
        Ok(tx)
    }

    /// Ledger entries involving `user`, newest first.
    ///
    /// With `filter`, only entries that also involve `filter` are returned.
    /// Ties on the timestamp are broken by id, descending.
    pub async fn history(
        &self,
        user: Uuid,
        filter: Option<Uuid>,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find().filter(involving(user));
        if let Some(other) = filter {
            query = query.filter(involving(other));
        }
        let models = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        hydrate_transactions(&self.database, models).await
    }

    pub async fn transaction(&self, id: Uuid) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction".to_string()))?;
        hydrate_transactions(&self.database, vec![model])
            .await?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("transaction".to_string()))
    }
}
