use std::{collections::HashMap, path::Path};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    common::{error::MiddlemanError, persist::Persister, types::TransactionId},
    transaction::Transaction,
};

/// Durable keyed storage of Transaction records. No business rules live here.
///
/// Disk is the record. The in-memory map is rebuilt from disk on restore and only updated
/// after a snapshot has been durably written.
pub(crate) struct TransactionStore {
    persister: Persister,
    cache: RwLock<HashMap<TransactionId, Transaction>>,
}

impl TransactionStore {
    pub(crate) async fn restore(dir_path: impl AsRef<Path>) -> Result<Self, MiddlemanError> {
        let persister = Persister::new(&dir_path).await?;
        let mut cache = HashMap::new();

        for (key, transaction) in persister.restore_all::<Transaction>().await? {
            if key != transaction.id {
                warn!(
                    "Transaction snapshot {} carries TransactionID {}. Keying by the record",
                    key, transaction.id
                );
            }
            cache.insert(transaction.id.clone(), transaction);
        }

        info!(
            "Restored {} transactions from {}",
            cache.len(),
            persister.dir_path().display().to_string()
        );

        Ok(Self {
            persister,
            cache: RwLock::new(cache),
        })
    }

    pub(crate) async fn get(&self, id: &str) -> Option<Transaction> {
        self.cache.read().await.get(id).cloned()
    }

    pub(crate) async fn contains(&self, id: &str) -> bool {
        self.cache.read().await.contains_key(id)
    }

    /// Point in time copy of every record.
    pub(crate) async fn snapshot(&self) -> Vec<Transaction> {
        self.cache.read().await.values().cloned().collect()
    }

    /// Persists a brand new record. Returns `Ok(false)` without writing anything if the id is
    /// already taken.
    pub(crate) async fn insert(&self, transaction: &Transaction) -> Result<bool, MiddlemanError> {
        let mut cache = self.cache.write().await;
        if cache.contains_key(&transaction.id) {
            debug!(
                "Transaction w/ TransactionID {} already exists in store",
                transaction.id
            );
            return Ok(false);
        }
        self.persister.persist(&transaction.id, transaction).await?;
        cache.insert(transaction.id.clone(), transaction.to_owned());
        Ok(true)
    }

    /// Replaces an existing record with a whole new snapshot.
    ///
    /// Callers must serialize updates per id. Updates to different ids do not wait on each
    /// other while writing.
    pub(crate) async fn update(&self, transaction: &Transaction) -> Result<(), MiddlemanError> {
        if !self.contains(&transaction.id).await {
            return Err(MiddlemanError::NotFound(transaction.id.clone()));
        }
        self.persister.persist(&transaction.id, transaction).await?;
        self.cache
            .write()
            .await
            .insert(transaction.id.clone(), transaction.to_owned());
        Ok(())
    }
}
