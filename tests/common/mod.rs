#![allow(dead_code)]

pub mod logger;
pub mod party_testers;

use std::sync::Arc;

use crusty_middleman::{
    common::config::ManagerConfig,
    manager::Manager,
    testing::{TestDirectory, TestNotifier},
};

/// Manager rooted in `data_dir`, wired to the in-memory test collaborators.
pub async fn new_manager(
    data_dir: &tempfile::TempDir,
    notifier: Arc<TestNotifier>,
) -> Manager {
    let mut config = ManagerConfig::new();
    config.data_dir(data_dir.path());
    Manager::new(Arc::new(TestDirectory::new()), notifier, config)
        .await
        .unwrap()
}
