use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    common::{error::MiddlemanError, types::TransactionId},
    interface::Directory,
    store::TransactionStore,
};

use super::{NewTransaction, Transaction, TransactionStatus, NO_DETAILS_PLACEHOLDER};

const TRANSACTION_ID_BYTES: usize = 4;
const MAX_ID_ALLOCATION_ATTEMPTS: usize = 8;

type IdSource = Box<dyn Fn() -> TransactionId + Send + Sync>;

/// Validates creation requests and opens new Transactions in `Pending`.
pub(crate) struct TransactionFactory {
    store: Arc<TransactionStore>,
    directory: Arc<dyn Directory>,
    id_source: IdSource,
}

impl TransactionFactory {
    pub(crate) fn new(store: Arc<TransactionStore>, directory: Arc<dyn Directory>) -> Self {
        Self {
            store,
            directory,
            id_source: Box::new(random_transaction_id),
        }
    }

    #[cfg(test)]
    fn new_with_id_source(
        store: Arc<TransactionStore>,
        directory: Arc<dyn Directory>,
        id_source: IdSource,
    ) -> Self {
        Self {
            store,
            directory,
            id_source,
        }
    }

    pub(crate) async fn create(
        &self,
        request: NewTransaction,
    ) -> Result<Transaction, MiddlemanError> {
        if request.initiator == request.recipient {
            return Err(MiddlemanError::SelfTrade {
                party: request.initiator,
            });
        }

        if self.directory.is_automated_account(&request.recipient).await {
            return Err(MiddlemanError::InvalidCounterparty {
                party: request.recipient,
            });
        }

        let details = request
            .details
            .unwrap_or_else(|| NO_DETAILS_PLACEHOLDER.to_string());

        for _ in 0..MAX_ID_ALLOCATION_ATTEMPTS {
            let transaction = Transaction {
                id: (self.id_source)(),
                initiator: request.initiator.clone(),
                recipient: request.recipient.clone(),
                kind: request.kind.clone(),
                details: details.clone(),
                status: TransactionStatus::Pending,
                initiator_confirmed: false,
                recipient_confirmed: false,
                created_at: SystemTime::now(),
                escrow_at: None,
                completed_at: None,
                cancelled_at: None,
                cancelled_by: None,
                cancel_reason: None,
            };

            if self.store.insert(&transaction).await? {
                info!(
                    "Trade w/ TransactionID {} created by {} with {} for {}",
                    transaction.id,
                    transaction.initiator,
                    transaction.recipient,
                    transaction.kind.summary()
                );
                return Ok(transaction);
            }
            debug!(
                "TransactionID {} collided with an existing record. Retrying",
                transaction.id
            );
        }

        Err(MiddlemanError::Simple(format!(
            "Failed to allocate a unique TransactionID after {} attempts",
            MAX_ID_ALLOCATION_ATTEMPTS
        )))
    }
}

fn random_transaction_id() -> TransactionId {
    // The leading bytes of a v4 UUID are all random
    let uuid = Uuid::new_v4();
    hex::encode(&uuid.as_bytes()[..TRANSACTION_ID_BYTES])
}
