/// Outbound messaging functionality
pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::error::RelayError;

/// Trait for message delivery backends
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the given chat. One attempt; retrying is the
    /// caller's concern.
    async fn send_message(&self, chat: &str, text: &str) -> Result<(), RelayError>;
}
