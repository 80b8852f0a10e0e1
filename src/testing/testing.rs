use std::{
    collections::{HashMap, HashSet},
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    common::{
        error::MiddlemanError,
        types::{NotifyTarget, PartyId},
    },
    interface::{Directory, Notifier},
    notification::Notification,
    transaction::{
        NewTransaction, NewTransactionBuilder, TradeKind, Transaction, TransactionStatus,
        NO_DETAILS_PLACEHOLDER,
    },
};

pub struct SomeTestParams {}

impl SomeTestParams {
    pub fn initiator_id() -> PartyId {
        "100000000000000001".to_string()
    }

    pub fn recipient_id() -> PartyId {
        "100000000000000002".to_string()
    }

    pub fn outsider_id() -> PartyId {
        "100000000000000003".to_string()
    }

    pub fn admin_id() -> PartyId {
        "100000000000000009".to_string()
    }

    pub fn bot_id() -> PartyId {
        "900000000000000001".to_string()
    }

    pub fn initiator_name() -> String {
        "Alice#0001".to_string()
    }

    pub fn recipient_name() -> String {
        "Bob#0002".to_string()
    }

    pub fn outsider_name() -> String {
        "Carol#0003".to_string()
    }

    pub fn crypto_request() -> NewTransaction {
        let mut builder = NewTransactionBuilder::new();
        builder
            .initiator(Self::initiator_id())
            .recipient(Self::recipient_id())
            .crypto("0.5", "btc");
        match builder.build() {
            Ok(request) => request,
            Err(error) => panic!("SomeTestParams::crypto_request() failed - {}", error),
        }
    }

    pub fn in_game_request() -> NewTransaction {
        let mut builder = NewTransactionBuilder::new();
        builder
            .initiator(Self::initiator_id())
            .recipient(Self::recipient_id())
            .in_game_items("Minecraft", "64 diamonds")
            .details("Meet at spawn");
        match builder.build() {
            Ok(request) => request,
            Err(error) => panic!("SomeTestParams::in_game_request() failed - {}", error),
        }
    }

    pub fn some_created_at() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    /// A freshly created, pending crypto transaction between initiator and recipient.
    pub fn crypto_transaction() -> Transaction {
        Transaction {
            id: "a1b2c3d4".to_string(),
            initiator: Self::initiator_id(),
            recipient: Self::recipient_id(),
            kind: TradeKind::Crypto {
                amount: "0.5".to_string(),
                currency: "BTC".to_string(),
            },
            details: NO_DETAILS_PLACEHOLDER.to_string(),
            status: TransactionStatus::Pending,
            initiator_confirmed: false,
            recipient_confirmed: false,
            created_at: Self::some_created_at(),
            escrow_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancel_reason: None,
        }
    }

    /// A freshly created, pending in-game items transaction between initiator and recipient.
    pub fn in_game_transaction() -> Transaction {
        Transaction {
            id: "e5f6a7b8".to_string(),
            kind: TradeKind::InGameItems {
                game: "Minecraft".to_string(),
                items: "64 diamonds".to_string(),
            },
            details: "Meet at spawn".to_string(),
            ..Self::crypto_transaction()
        }
    }
}

/// In-memory Directory. Knows the three test parties and treats the bot id as automated.
pub struct TestDirectory {
    names: HashMap<PartyId, String>,
    automated: HashSet<PartyId>,
}

impl TestDirectory {
    pub fn new() -> Self {
        let names = HashMap::from([
            (SomeTestParams::initiator_id(), SomeTestParams::initiator_name()),
            (SomeTestParams::recipient_id(), SomeTestParams::recipient_name()),
            (SomeTestParams::outsider_id(), SomeTestParams::outsider_name()),
        ]);
        let automated = HashSet::from([SomeTestParams::bot_id()]);
        Self { names, automated }
    }
}

impl Default for TestDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for TestDirectory {
    async fn resolve_display_name(&self, party: &str) -> Option<String> {
        self.names.get(party).cloned()
    }

    async fn is_automated_account(&self, party: &str) -> bool {
        self.automated.contains(party)
    }
}

/// In-memory Notifier that records every successful delivery. Targets can be marked
/// unreachable to exercise delivery failures.
pub struct TestNotifier {
    sent: Mutex<Vec<Notification>>,
    unreachable: Mutex<HashSet<NotifyTarget>>,
}

impl TestNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            unreachable: Mutex::new(HashSet::new()),
        }
    }

    pub async fn set_unreachable(&self, target: NotifyTarget) {
        self.unreachable.lock().await.insert(target);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, target: &NotifyTarget) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|notification| notification.target == *target)
            .map(|notification| notification.content.clone())
            .collect()
    }
}

impl Default for TestNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for TestNotifier {
    async fn send(&self, target: &NotifyTarget, content: &str) -> Result<(), MiddlemanError> {
        if self.unreachable.lock().await.contains(target) {
            return Err(MiddlemanError::DeliveryFailed {
                target: target.to_owned(),
                reason: "unreachable".to_string(),
            });
        }
        self.sent.lock().await.push(Notification {
            target: target.to_owned(),
            content: content.to_string(),
        });
        Ok(())
    }
}
