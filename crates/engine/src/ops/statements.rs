use uuid::Uuid;

use crate::{Platform, ResultEngine, User, presenter};

use super::Engine;

impl Engine {
    /// Balance summary of `user` with names as shown on `platform`.
    pub async fn balance_summary(&self, user: &User, platform: Platform) -> ResultEngine<String> {
        let accounts = self.accounts_for(user.id).await?;
        let ids: Vec<Uuid> = accounts
            .iter()
            .filter_map(|account| account.counterparty_of(user.id))
            .collect();
        let names = self.display_names(platform, ids).await?;
        Ok(presenter::summarize(user.id, &accounts, &names))
    }

    /// History statement of `user`, optionally restricted to entries
    /// involving `filter`.
    pub async fn history_statement(
        &self,
        user: &User,
        filter: Option<&User>,
        platform: Platform,
    ) -> ResultEngine<String> {
        let transactions = self.history(user.id, filter.map(|f| f.id)).await?;
        let mut ids: Vec<Uuid> = vec![user.id];
        ids.extend(filter.map(|f| f.id));
        for tx in &transactions {
            ids.push(tx.created_by);
            ids.extend(tx.participants.iter().copied());
        }
        let names = self.display_names(platform, ids).await?;
        Ok(presenter::render_history(
            user.id,
            filter.map(|f| f.id),
            &transactions,
            &names,
        ))
    }
}
