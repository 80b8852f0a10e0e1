use std::sync::Arc;

use crusty_middleman::{
    common::{error::MiddlemanError, types::PartyId},
    manager::{ActionOutcome, Manager},
};
use tokio::sync::{oneshot, Barrier};

#[derive(Clone, Debug)]
pub enum PartyMove {
    Confirm,
    Cancel(Option<String>),
}

/// Drives one party's move against a transaction from its own task. All testers sharing a
/// Barrier fire at the same moment, which is how the tests race parties against each other.
pub struct PartyTester {
    cmpl_rx: oneshot::Receiver<Result<ActionOutcome, MiddlemanError>>,
}

impl PartyTester {
    pub fn start(
        manager: Arc<Manager>,
        party: PartyId,
        id: String,
        party_move: PartyMove,
        barrier: Arc<Barrier>,
    ) -> Self {
        let (cmpl_tx, cmpl_rx) = oneshot::channel::<Result<ActionOutcome, MiddlemanError>>();
        let actor = PartyTesterActor {
            cmpl_tx,
            manager,
            party,
            id,
            party_move,
            barrier,
        };
        tokio::spawn(async move { actor.run().await });
        Self { cmpl_rx }
    }

    pub async fn wait_for_completion(self) -> Result<ActionOutcome, MiddlemanError> {
        self.cmpl_rx.await.unwrap()
    }
}

struct PartyTesterActor {
    cmpl_tx: oneshot::Sender<Result<ActionOutcome, MiddlemanError>>,
    manager: Arc<Manager>,
    party: PartyId,
    id: String,
    party_move: PartyMove,
    barrier: Arc<Barrier>,
}

impl PartyTesterActor {
    async fn run(self) {
        self.barrier.wait().await;

        let result = match self.party_move {
            PartyMove::Confirm => {
                self.manager
                    .confirm_transaction(self.party.clone(), &self.id)
                    .await
            }
            PartyMove::Cancel(reason) => {
                self.manager
                    .cancel_transaction(self.party.clone(), &self.id, reason)
                    .await
            }
        };

        // Send Completion
        self.cmpl_tx.send(result).unwrap();
    }
}
