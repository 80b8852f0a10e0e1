mod common;

#[cfg(test)]
mod restore_tests {
    use std::sync::Arc;

    use crusty_middleman::{
        common::error::MiddlemanError,
        protocol::TradeEvent,
        testing::{SomeTestParams, TestNotifier},
        transaction::{StatusFilter, TradeKind, TransactionStatus},
    };

    use super::common::{logger::setup as logger_setup, new_manager};

    #[tokio::test]
    async fn test_restart_continues_where_it_left_off() {
        logger_setup();

        let dir = tempfile::tempdir().unwrap();
        let alice = SomeTestParams::initiator_id();
        let bob = SomeTestParams::recipient_id();

        let (pending_id, cancelled_id) = {
            let manager = new_manager(&dir, Arc::new(TestNotifier::new())).await;

            let pending = manager
                .create_transaction(SomeTestParams::in_game_request())
                .await
                .unwrap();
            manager
                .confirm_transaction(alice.clone(), &pending.transaction.id)
                .await
                .unwrap();

            let cancelled = manager
                .create_transaction(SomeTestParams::crypto_request())
                .await
                .unwrap();
            manager
                .cancel_transaction(bob.clone(), &cancelled.transaction.id, None)
                .await
                .unwrap();

            manager.shutdown().await.unwrap();
            (pending.transaction.id, cancelled.transaction.id)
        };

        let notifier = Arc::new(TestNotifier::new());
        let manager = new_manager(&dir, notifier.clone()).await;

        let restored = manager
            .get_transaction_detail(&bob, &pending_id, false)
            .await
            .unwrap();
        assert_eq!(restored.status, TransactionStatus::Pending);
        assert!(restored.initiator_confirmed);
        assert_eq!(restored.details, "Meet at spawn");
        assert_eq!(
            restored.kind,
            TradeKind::InGameItems {
                game: "Minecraft".to_string(),
                items: "64 diamonds".to_string()
            }
        );

        // Bob's confirm after the restart completes the pair
        let escrowed = manager
            .confirm_transaction(bob.clone(), &pending_id)
            .await
            .unwrap();
        assert_eq!(escrowed.event, Some(TradeEvent::BothConfirmed));
        assert_eq!(escrowed.transaction.status, TransactionStatus::Escrow);

        let result = manager.confirm_transaction(alice.clone(), &cancelled_id).await;
        assert!(matches!(result, Err(MiddlemanError::TerminalState { .. })));

        let page = manager.list_transactions(&alice, StatusFilter::All).await;
        assert_eq!(page.total, 2);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_then_act_again() {
        let dir = tempfile::tempdir().unwrap();
        let manager = new_manager(&dir, Arc::new(TestNotifier::new())).await;

        let created = manager
            .create_transaction(SomeTestParams::crypto_request())
            .await
            .unwrap();
        manager
            .confirm_transaction(SomeTestParams::initiator_id(), &created.transaction.id)
            .await
            .unwrap();
        manager.shutdown().await.unwrap();

        let outcome = manager
            .confirm_transaction(SomeTestParams::recipient_id(), &created.transaction.id)
            .await
            .unwrap();
        assert_eq!(outcome.transaction.status, TransactionStatus::Escrow);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_temp_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let transactions_dir = dir.path().join("transactions");
        std::fs::create_dir_all(&transactions_dir).unwrap();
        std::fs::write(transactions_dir.join(".deadbeef.json.tmp"), b"{ half written").unwrap();

        let manager = new_manager(&dir, Arc::new(TestNotifier::new())).await;
        let page = manager
            .list_transactions(&SomeTestParams::initiator_id(), StatusFilter::All)
            .await;
        assert_eq!(page.total, 0);
        assert!(!transactions_dir.join(".deadbeef.json.tmp").exists());
    }
}
