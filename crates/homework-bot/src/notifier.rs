//! Telegram delivery of status and failure messages

use async_trait::async_trait;
use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::Recipient;

use crate::config::{ChatTarget, Config};
use crate::error::BotResult;

/// Sink for outgoing chat messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> BotResult<()>;
}

/// Sends plain-text messages to one chat through the Bot API.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    /// Creates a notifier bound to the configured bot token and chat
    ///
    /// The underlying HTTP client shares the API request timeout, so a hung
    /// Bot API cannot stall the poll loop.
    pub fn new(config: &Config) -> BotResult<Self> {
        let client = ClientBuilder::new().timeout(config.request_timeout).build()?;
        let bot = Bot::with_client(config.telegram_token.clone(), client);
        Ok(Self::with_bot(bot, &config.chat))
    }

    pub fn with_bot(bot: Bot, chat: &ChatTarget) -> Self {
        let recipient = match chat {
            ChatTarget::Id(id) => Recipient::Id(ChatId(*id)),
            ChatTarget::Username(name) => Recipient::ChannelUsername(name.clone()),
        };
        Self { bot, recipient }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> BotResult<()> {
        self.bot.send_message(self.recipient.clone(), text).await?;
        Ok(())
    }
}

/// Sends `text`, logging the outcome instead of propagating failures.
///
/// # Returns
/// * `true` - Message delivered
/// * `false` - Delivery failed (already logged)
pub async fn send_message<N: Notifier + ?Sized>(notifier: &N, text: &str) -> bool {
    match notifier.send(text).await {
        Ok(()) => {
            log::info!("Message sent to Telegram: {}", text);
            true
        }
        Err(e) => {
            log::error!("Failed to send message to Telegram: {}", e);
            false
        }
    }
}
