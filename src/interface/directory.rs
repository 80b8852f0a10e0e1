use async_trait::async_trait;

/// Resolves opaque party identifiers on behalf of the chat platform or whatever front end
/// the parties come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    /// `None` when the party cannot be resolved.
    async fn resolve_display_name(&self, party: &str) -> Option<String>;

    /// Bots and other non-human accounts are not eligible trade counterparties.
    async fn is_automated_account(&self, party: &str) -> bool;
}
