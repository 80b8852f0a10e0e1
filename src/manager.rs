use std::{collections::HashMap, sync::Arc, time::SystemTime};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    common::{
        config::ManagerConfig,
        error::MiddlemanError,
        types::{NotifyTarget, PartyId, TransactionId},
    },
    interface::{Directory, Notifier},
    notification::{Notification, NotificationRouter, PartyNames, UNKNOWN_PARTY_NAME},
    protocol::{self, TradeAction, TradeEvent, Transition},
    query::{QueryService, TransactionPage},
    store::TransactionStore,
    trade::{Trade, TradeAccess},
    transaction::{NewTransaction, StatusFilter, Transaction, TransactionFactory},
};

/// A notification that could not be delivered. The state change it announced stays committed.
#[derive(Clone, Debug)]
pub struct DeliveryFailure {
    pub target: NotifyTarget,
    pub target_name: String,
    pub reason: String,
}

impl DeliveryFailure {
    /// Text suitable for showing back to whoever triggered the action.
    pub fn message(&self) -> String {
        match &self.target {
            NotifyTarget::Party(_) => format!(
                "Couldn't send a direct message to {}. They may have direct messages disabled.",
                self.target_name
            ),
            NotifyTarget::SharedChannel => {
                "Couldn't post the update to the shared channel.".to_string()
            }
        }
    }
}

/// Attempts at reaching a live trade task for one action. A task can stop between handing
/// out its accessor and taking the request.
const MAX_TRADE_ATTEMPTS: usize = 3;

/// Result of an accepted action.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// The committed record after the action.
    pub transaction: Transaction,
    pub event: Option<TradeEvent>,
    /// False when the action was accepted but changed nothing, e.g. a repeated confirm.
    pub applied: bool,
    pub delivery_failures: Vec<DeliveryFailure>,
}

enum TradeSlot {
    Live(TradeAccess),
    /// Completed or Cancelled. Never changes again so it needs no task.
    Finalized(Transaction),
}

pub struct Manager {
    config: ManagerConfig,
    store: Arc<TransactionStore>,
    factory: TransactionFactory,
    query: QueryService,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    trades: RwLock<HashMap<TransactionId, Trade>>,
}

impl Manager {
    // Constructors

    /// Opens (or restores) the transaction store under the configured data directory.
    pub async fn new(
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
        config: ManagerConfig,
    ) -> Result<Manager, MiddlemanError> {
        let store = Arc::new(TransactionStore::restore(config.transactions_dir()).await?);
        let factory = TransactionFactory::new(store.clone(), directory.clone());
        let query = QueryService::new(store.clone());

        Ok(Manager {
            config,
            store,
            factory,
            query,
            directory,
            notifier,
            trades: RwLock::new(HashMap::new()),
        })
    }

    // Commands

    pub async fn create_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<ActionOutcome, MiddlemanError> {
        let transaction = match self.factory.create(request).await {
            Ok(transaction) => transaction,
            Err(error) => {
                debug!("Transaction creation rejected - {}", error);
                return Err(error);
            }
        };

        let delivery_failures = self.notify(TradeEvent::Created, &transaction).await;
        Ok(ActionOutcome {
            transaction,
            event: Some(TradeEvent::Created),
            applied: true,
            delivery_failures,
        })
    }

    pub async fn confirm_transaction(
        &self,
        actor: impl Into<PartyId>,
        id: &str,
    ) -> Result<ActionOutcome, MiddlemanError> {
        self.act(actor.into(), id, TradeAction::Confirm).await
    }

    pub async fn cancel_transaction(
        &self,
        actor: impl Into<PartyId>,
        id: &str,
        reason: Option<String>,
    ) -> Result<ActionOutcome, MiddlemanError> {
        self.act(actor.into(), id, TradeAction::Cancel { reason })
            .await
    }

    /// Administrative Escrow to Completed. `is_admin` comes from the front end's own
    /// permission model.
    pub async fn complete_transaction(
        &self,
        actor: impl Into<PartyId>,
        id: &str,
        is_admin: bool,
    ) -> Result<ActionOutcome, MiddlemanError> {
        self.act(actor.into(), id, TradeAction::Complete { is_admin })
            .await
    }

    // Queries

    /// Newest first, capped to the configured page size. The page reports the full total.
    pub async fn list_transactions(&self, actor: &str, filter: StatusFilter) -> TransactionPage {
        self.query.page(actor, filter, self.config.page_size()).await
    }

    pub async fn get_transaction_detail(
        &self,
        actor: &str,
        id: &str,
        is_admin: bool,
    ) -> Result<Transaction, MiddlemanError> {
        self.query.detail(actor, id, is_admin).await
    }

    pub async fn display_name(&self, party: &str) -> String {
        self.directory
            .resolve_display_name(party)
            .await
            .unwrap_or_else(|| UNKNOWN_PARTY_NAME.to_string())
    }

    /// Stops every trade task. Records stay on disk; a later action on any id spawns a
    /// fresh task for it.
    pub async fn shutdown(&self) -> Result<(), MiddlemanError> {
        // Held until every task has exited, so no id gets a second task meanwhile
        let mut trades = self.trades.write().await;
        info!("Manager shutting down {} trades", trades.len());

        let mut result = Ok(());
        for (id, trade) in trades.drain() {
            if let Err(error) = trade.stop().await {
                warn!(
                    "Trade w/ TransactionID {} did not take shutdown - {}",
                    id, error
                );
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    // Private Functions

    async fn act(
        &self,
        actor: PartyId,
        id: &str,
        action: TradeAction,
    ) -> Result<ActionOutcome, MiddlemanError> {
        let mut attempt = 0;
        let transition = loop {
            attempt += 1;

            let access = match self.trade_slot(id).await? {
                TradeSlot::Live(access) => access,
                TradeSlot::Finalized(transaction) => {
                    break protocol::apply(&transaction, &actor, &action, SystemTime::now())?;
                }
            };

            match access.act(actor.clone(), action.clone()).await {
                Err(error) if error.is_trade_closed() && attempt < MAX_TRADE_ATTEMPTS => {
                    debug!(
                        "Trade w/ TransactionID {} stopped before taking {} - {}. Retrying",
                        id, action, error
                    );
                }
                result => break result?,
            }
        };

        if transition.transaction.is_terminal() {
            self.retire(id).await;
        }
        Ok(self.dispatch(transition).await)
    }

    /// Single writer task of `id`, spawned on first use. Finalized records come back as they
    /// are.
    async fn trade_slot(&self, id: &str) -> Result<TradeSlot, MiddlemanError> {
        if let Some(trade) = self.trades.read().await.get(id) {
            return Ok(TradeSlot::Live(trade.new_accessor()));
        }

        let mut trades = self.trades.write().await;
        if let Some(trade) = trades.get(id) {
            return Ok(TradeSlot::Live(trade.new_accessor()));
        }

        let Some(transaction) = self.store.get(id).await else {
            return Err(MiddlemanError::NotFound(id.to_string()));
        };
        if transaction.is_terminal() {
            return Ok(TradeSlot::Finalized(transaction));
        }

        let trade = Trade::new(id.to_string(), self.store.clone(), self.config.channel_size());
        let accessor = trade.new_accessor();
        trades.insert(id.to_string(), trade);
        Ok(TradeSlot::Live(accessor))
    }

    /// Stops the task of a finalized transaction. The map stays locked until the task has
    /// exited, so requests already queued on it are answered first.
    async fn retire(&self, id: &str) {
        let mut trades = self.trades.write().await;
        let Some(trade) = trades.remove(id) else {
            return;
        };

        match trade.stop().await {
            Ok(()) => debug!("Trade w/ TransactionID {} retired", id),
            Err(error) => warn!(
                "Trade w/ TransactionID {} did not take shutdown - {}",
                id, error
            ),
        }
    }

    /// Runs after the trade task has committed and released the transaction.
    async fn dispatch(&self, transition: Transition) -> ActionOutcome {
        let delivery_failures = match transition.event {
            Some(event) => self.notify(event, &transition.transaction).await,
            None => Vec::new(),
        };

        ActionOutcome {
            transaction: transition.transaction,
            event: transition.event,
            applied: transition.applied,
            delivery_failures,
        }
    }

    async fn notify(&self, event: TradeEvent, transaction: &Transaction) -> Vec<DeliveryFailure> {
        let names = self.party_names(transaction).await;
        let notifications = NotificationRouter::route(event, transaction, &names);
        self.deliver(transaction, &names, notifications).await
    }

    async fn party_names(&self, transaction: &Transaction) -> PartyNames {
        PartyNames {
            initiator: self.display_name(&transaction.initiator).await,
            recipient: self.display_name(&transaction.recipient).await,
        }
    }

    async fn deliver(
        &self,
        transaction: &Transaction,
        names: &PartyNames,
        notifications: Vec<Notification>,
    ) -> Vec<DeliveryFailure> {
        let mut failures = Vec::new();

        for notification in notifications {
            let Some(error) = self
                .notifier
                .send(&notification.target, &notification.content)
                .await
                .err()
            else {
                continue;
            };

            warn!(
                "Trade w/ TransactionID {} failed to notify {} - {}",
                transaction.id, notification.target, error
            );

            let target_name = match &notification.target {
                NotifyTarget::Party(party) if *party == transaction.initiator => {
                    names.initiator.clone()
                }
                NotifyTarget::Party(party) if *party == transaction.recipient => {
                    names.recipient.clone()
                }
                NotifyTarget::Party(party) => party.clone(),
                NotifyTarget::SharedChannel => notification.target.to_string(),
            };

            let reason = match error {
                MiddlemanError::DeliveryFailed { reason, .. } => reason,
                error => error.to_string(),
            };

            failures.push(DeliveryFailure {
                target: notification.target,
                target_name,
                reason,
            });
        }
        failures
    }
}
