use std::time::Duration;

use async_trait::async_trait;
use teloxide::Bot;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::requests::Request;
use teloxide::types::{ChatId, ParseMode, Recipient};

use super::Notifier;
use crate::error::RelayError;

/// Telegram delivery backend built on teloxide's `Bot`.
pub struct TelegramNotifier {
    bot: Bot,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: &str, timeout: Duration) -> Self {
        Self {
            bot: Bot::new(token),
            timeout,
        }
    }
}

/// A chat target is either a numeric id (groups are negative) or a public
/// `@channelname`.
fn parse_chat_target(chat: &str) -> Result<Recipient, RelayError> {
    if chat.starts_with('@') {
        return Ok(Recipient::ChannelUsername(chat.to_string()));
    }
    chat.parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| {
            RelayError::Configuration(format!(
                "TELEGRAM_CHAT_ID must be a numeric id or @channelname, got {chat:?}"
            ))
        })
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat: &str, text: &str) -> Result<(), RelayError> {
        let recipient = parse_chat_target(chat)?;
        let request = self
            .bot
            .send_message(recipient, text)
            .parse_mode(ParseMode::Markdown);

        match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(RelayError::NotificationDelivery {
                attempts: 1,
                reason: err.to_string(),
            }),
            Err(_) => Err(RelayError::Timeout("notification send")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_username() {
        let target = parse_chat_target("@market_updates").unwrap();
        assert_eq!(
            target,
            Recipient::ChannelUsername("@market_updates".to_string())
        );
    }

    #[test]
    fn test_parse_numeric_chat_id() {
        let target = parse_chat_target("-1001234567890").unwrap();
        assert_eq!(target, Recipient::Id(ChatId(-1001234567890)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_chat_target("not-a-chat").unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }
}
