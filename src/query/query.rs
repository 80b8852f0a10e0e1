use std::{cmp::Reverse, sync::Arc};

use crate::{
    common::error::MiddlemanError,
    store::TransactionStore,
    transaction::{StatusFilter, Transaction},
};

/// One bounded slice of a listing, newest first, together with how many matched in total.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: usize,
}

impl TransactionPage {
    fn truncate(mut transactions: Vec<Transaction>, page_size: usize) -> Self {
        let total = transactions.len();
        transactions.truncate(page_size);
        Self {
            transactions,
            total,
        }
    }

    pub fn shown(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.shown() < self.total
    }

    /// e.g. `Showing 10 of 14 transactions`
    pub fn summary(&self) -> String {
        format!("Showing {} of {} transactions", self.shown(), self.total)
    }
}

/// Read side. Answers from point in time snapshots of the store and never mutates.
pub(crate) struct QueryService {
    store: Arc<TransactionStore>,
}

impl QueryService {
    pub(crate) fn new(store: Arc<TransactionStore>) -> Self {
        Self { store }
    }

    /// Every transaction `actor` takes part in that passes `filter`, newest first.
    pub(crate) async fn list(&self, actor: &str, filter: StatusFilter) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .store
            .snapshot()
            .await
            .into_iter()
            .filter(|transaction| transaction.is_participant(actor))
            .filter(|transaction| filter.matches(transaction.status))
            .collect();

        // Ties on created_at fall back to id so repeated listings agree
        transactions.sort_by(|a, b| {
            Reverse(a.created_at)
                .cmp(&Reverse(b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        transactions
    }

    pub(crate) async fn page(
        &self,
        actor: &str,
        filter: StatusFilter,
        page_size: usize,
    ) -> TransactionPage {
        TransactionPage::truncate(self.list(actor, filter).await, page_size)
    }

    pub(crate) async fn detail(
        &self,
        actor: &str,
        id: &str,
        is_admin: bool,
    ) -> Result<Transaction, MiddlemanError> {
        let Some(transaction) = self.store.get(id).await else {
            return Err(MiddlemanError::NotFound(id.to_string()));
        };

        if !transaction.is_participant(actor) && !is_admin {
            return Err(MiddlemanError::Unauthorized {
                id: id.to_string(),
                party: actor.to_string(),
            });
        }
        Ok(transaction)
    }
}
