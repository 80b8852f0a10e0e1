use async_trait::async_trait;

use crate::common::{error::MiddlemanError, types::NotifyTarget};

/// Delivers human readable updates. Failures are expected to come back as
/// [`MiddlemanError::DeliveryFailed`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &NotifyTarget, content: &str) -> Result<(), MiddlemanError>;
}
