//! Telegram Bot API channel.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ChannelResponse, TelegramConfig};

use super::{MessageChannel, ParseMode};

/// Posts messages to one Telegram chat through `sendMessage`.
pub struct TelegramChannel {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::config("telegram.bot_token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token.trim()
            ),
            chat_id: config.chat_room.clone(),
        })
    }
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn post_message(&self, text: &str, mode: ParseMode) -> ChannelResponse {
        let mut form = vec![("chat_id", self.chat_id.as_str()), ("text", text)];
        if mode == ParseMode::Html {
            form.push(("parse_mode", "HTML"));
        }

        let response = match self.client.post(&self.endpoint).form(&form).send().await {
            Ok(response) => response,
            // The error text may embed the request URL, which carries the token
            Err(e) => return ChannelResponse::unreachable(e.without_url().to_string()),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => e.without_url().to_string(),
        };

        if !status.is_success() {
            log::warn!("Telegram returned {status}: {body}");
        }

        ChannelResponse {
            ok: status.is_success(),
            status: Some(status.as_u16()),
            body: Some(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_token() {
        assert!(TelegramChannel::new(&TelegramConfig::default()).is_err());
    }

    #[test]
    fn test_endpoint() {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_room: "@deptos".into(),
            api_base: "http://localhost:8081/".into(),
            timeout_secs: 10,
        };
        let channel = TelegramChannel::new(&config).unwrap();
        assert_eq!(channel.endpoint, "http://localhost:8081/bot123:abc/sendMessage");
        assert_eq!(channel.chat_id, "@deptos");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_response_not_an_error() {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_room: "1".into(),
            api_base: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
        };
        let channel = TelegramChannel::new(&config).unwrap();
        let response = channel.post_message("hola", ParseMode::Plain).await;

        assert!(!response.ok);
        assert_eq!(response.status, None);
        assert!(!response.body.unwrap().contains("123:abc"));
    }
}
