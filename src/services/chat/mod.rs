pub mod telegram;

use async_trait::async_trait;

/// Outbound side of the chat transport. The bot only ever needs to push a
/// text message into a chat; everything else is the transport's business.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}
