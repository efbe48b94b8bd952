//! Practicum homework-status API client

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{BotError, BotResult};

/// Source of homework status updates.
///
/// The poll loop only depends on this trait so tests can feed it canned
/// payloads.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetches all status changes since `from_date` (Unix time) and returns
    /// the decoded JSON body untouched.
    async fn fetch(&self, from_date: i64) -> BotResult<Value>;
}

pub struct PracticumClient {
    client: Client,
    endpoint: Url,
    token: String,
}

impl PracticumClient {
    /// Creates a client with the configured endpoint, token and timeout
    ///
    /// # Returns
    /// * `Ok(PracticumClient)` - Client ready to poll
    /// * `Err(BotError::Transport)` - The HTTP client could not be built (TLS backend init)
    pub fn new(config: &Config) -> BotResult<Self> {
        let client = ClientBuilder::new().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(
            client,
            config.endpoint.clone(),
            config.practicum_token.clone(),
        ))
    }

    pub fn with_client(client: Client, endpoint: Url, token: String) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> BotResult<Value> {
        log::debug!("Requesting {} with from_date={}", self.endpoint, from_date);

        let response = self
            .client
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Status {
                status,
                endpoint: self.endpoint.to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}
