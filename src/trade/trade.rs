use std::{sync::Arc, time::SystemTime};

use strum_macros::{Display, IntoStaticStr};
use tokio::{
    select,
    sync::{mpsc, oneshot},
};
use tracing::{debug, error, info, warn};

use crate::{
    common::{
        error::MiddlemanError,
        types::{PartyId, TransactionId},
    },
    protocol::{self, TradeAction, Transition},
    store::TransactionStore,
};

#[derive(Clone)]
pub(crate) struct TradeAccess {
    tx: mpsc::Sender<TradeRequest>,
}

impl TradeAccess {
    fn new(tx: mpsc::Sender<TradeRequest>) -> Self {
        Self { tx }
    }

    pub(crate) async fn act(
        &self,
        actor: PartyId,
        action: TradeAction,
    ) -> Result<Transition, MiddlemanError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<Transition, MiddlemanError>>();
        let request = TradeRequest::Act {
            actor,
            action,
            rsp_tx,
        };
        self.tx.send(request).await?;
        rsp_rx.await?
    }

    async fn shutdown(&self) -> Result<(), MiddlemanError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<(), MiddlemanError>>();
        let request = TradeRequest::Shutdown { rsp_tx };
        self.tx.send(request).await?; // Shutdown is allowed to fail if already shutdown
        rsp_rx.await?
    }
}

/// Owns the single writer task of one Transaction. Every action against that id is queued
/// here and handled one at a time, so the read, transition and persist of one action can
/// never interleave with another action on the same id.
pub(crate) struct Trade {
    id: TransactionId,
    tx: mpsc::Sender<TradeRequest>,
    task_handle: tokio::task::JoinHandle<()>,
}

impl Trade {
    pub(crate) fn new(
        id: TransactionId,
        store: Arc<TransactionStore>,
        request_channel_size: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<TradeRequest>(request_channel_size);
        let actor = TradeActor::new(id.clone(), rx, store);
        let task_handle = tokio::spawn(async move { actor.run().await });
        Self {
            id,
            tx,
            task_handle,
        }
    }

    pub(crate) fn new_accessor(&self) -> TradeAccess {
        TradeAccess::new(self.tx.clone())
    }

    /// Stops the task once everything queued ahead of the stop request is handled, and
    /// waits for it to exit.
    pub(crate) async fn stop(self) -> Result<(), MiddlemanError> {
        let shutdown = self.new_accessor().shutdown().await;
        if let Some(error) = self.task_handle.await.err() {
            error!(
                "Trade w/ TransactionID {} failed to terminate cleanly - {}",
                self.id, error
            );
        }
        shutdown
    }
}

#[derive(Display, IntoStaticStr)]
enum TradeRequest {
    Act {
        actor: PartyId,
        action: TradeAction,
        rsp_tx: oneshot::Sender<Result<Transition, MiddlemanError>>,
    },
    Shutdown {
        rsp_tx: oneshot::Sender<Result<(), MiddlemanError>>,
    },
}

struct TradeActor {
    id: TransactionId,
    rx: mpsc::Receiver<TradeRequest>,
    store: Arc<TransactionStore>,
}

impl TradeActor {
    fn new(
        id: TransactionId,
        rx: mpsc::Receiver<TradeRequest>,
        store: Arc<TransactionStore>,
    ) -> Self {
        Self { id, rx, store }
    }

    async fn run(mut self) {
        loop {
            select! {
                Some(request) = self.rx.recv() => {
                    if self.handle_request(request).await {
                        break;
                    }
                },
                else => break,
            }
        }
        info!("Trade w/ TransactionID {} terminating", self.id);
    }

    async fn handle_request(&mut self, request: TradeRequest) -> bool {
        let mut terminate = false;

        debug!(
            "Trade w/ TransactionID {} handle_request() of type {}",
            self.id, request
        );

        match request {
            TradeRequest::Act {
                actor,
                action,
                rsp_tx,
            } => {
                let result = self.act(actor, action).await;
                if rsp_tx.send(result).is_err() {
                    warn!(
                        "Trade w/ TransactionID {} requester went away before the reply",
                        self.id
                    );
                }
            }
            TradeRequest::Shutdown { rsp_tx } => {
                if rsp_tx.send(Ok(())).is_err() {
                    warn!(
                        "Trade w/ TransactionID {} shutdown requester went away",
                        self.id
                    );
                }
                terminate = true;
            }
        }
        terminate
    }

    async fn act(
        &mut self,
        actor: PartyId,
        action: TradeAction,
    ) -> Result<Transition, MiddlemanError> {
        // Always read the latest record. This task is its only writer.
        let Some(transaction) = self.store.get(&self.id).await else {
            return Err(MiddlemanError::NotFound(self.id.clone()));
        };

        let transition = match protocol::apply(&transaction, &actor, &action, SystemTime::now()) {
            Ok(transition) => transition,
            Err(error) => {
                debug!(
                    "Trade w/ TransactionID {} rejected {} from {} - {}",
                    self.id, action, actor, error
                );
                return Err(error);
            }
        };

        if !transition.applied {
            debug!(
                "Trade w/ TransactionID {} {} from {} changed nothing",
                self.id, action, actor
            );
            return Ok(transition);
        }

        if let Some(error) = self.store.update(&transition.transaction).await.err() {
            error!(
                "Trade w/ TransactionID {} failed to persist {} from {} - {}",
                self.id, action, actor, error
            );
            return Err(error);
        }

        info!(
            "Trade w/ TransactionID {} {} by {} now {}",
            self.id, action, actor, transition.transaction.status
        );
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{protocol::TradeEvent, testing::SomeTestParams, transaction::TransactionStatus};

    async fn some_trade(
        dir: &tempfile::TempDir,
    ) -> (Arc<TransactionStore>, TransactionId, Trade) {
        let store = Arc::new(TransactionStore::restore(dir.path()).await.unwrap());
        let transaction = SomeTestParams::crypto_transaction();
        store.insert(&transaction).await.unwrap();
        let trade = Trade::new(transaction.id.clone(), store.clone(), 4);
        (store, transaction.id, trade)
    }

    #[tokio::test]
    async fn test_trade_persists_before_replying() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id, trade) = some_trade(&dir).await;
        let access = trade.new_accessor();

        let transition = access
            .act(SomeTestParams::initiator_id(), TradeAction::Confirm)
            .await
            .unwrap();
        assert!(transition.applied);
        assert_eq!(store.get(&id).await, Some(transition.transaction.clone()));

        let transition = access
            .act(SomeTestParams::recipient_id(), TradeAction::Confirm)
            .await
            .unwrap();
        assert_eq!(transition.event, Some(TradeEvent::BothConfirmed));

        let restored = TransactionStore::restore(dir.path()).await.unwrap();
        let persisted = restored.get(&id).await.unwrap();
        assert_eq!(persisted.status, TransactionStatus::Escrow);
        assert!(persisted.escrow_at.is_some());

        trade.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_trade_rejection_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id, trade) = some_trade(&dir).await;
        let access = trade.new_accessor();
        let before = store.get(&id).await.unwrap();

        let result = access
            .act(SomeTestParams::outsider_id(), TradeAction::Cancel { reason: None })
            .await;
        assert!(matches!(result, Err(MiddlemanError::NotAParticipant { .. })));
        assert_eq!(store.get(&id).await, Some(before));

        access.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_trade_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, _id, trade) = some_trade(&dir).await;
        let access = trade.new_accessor();

        access.shutdown().await.unwrap();
        trade.task_handle.await.unwrap();

        let result = access
            .act(SomeTestParams::initiator_id(), TradeAction::Confirm)
            .await;
        assert!(matches!(result, Err(MiddlemanError::MpscSend(_))));
        assert!(result.unwrap_err().is_trade_closed());
    }

    #[tokio::test]
    async fn test_stop_handles_queued_requests_first() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id, trade) = some_trade(&dir).await;
        let access = trade.new_accessor();

        let (confirmed, stopped) = tokio::join!(
            access.act(SomeTestParams::initiator_id(), TradeAction::Confirm),
            trade.stop()
        );
        assert!(confirmed.unwrap().applied);
        stopped.unwrap();
        assert!(store.get(&id).await.unwrap().initiator_confirmed);
    }
}
