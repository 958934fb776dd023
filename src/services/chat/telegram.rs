use anyhow::Context;
use async_trait::async_trait;

use super::ChatProvider;

pub struct TelegramChatApi {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramChatApi {
    pub fn new(token: String) -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatProvider for TelegramChatApi {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);

        self.client
            .post(&url)
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .context("failed to send chat message")?
            .error_for_status()
            .context("chat API returned error")?;

        Ok(())
    }
}
