//! Common test utilities
//!
//! Shared by the integration tests: mock servers standing in for the
//! Practicum API and the Telegram Bot API, and a manual clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homework_bot::{ChatTarget, Clock, PracticumClient, TelegramNotifier};
use serde_json::{json, Value};
use teloxide::Bot;
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_ID: i64 = 424242;

/// Clock whose time only moves when the loop sleeps.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, period: Duration) {
        self.now.fetch_add(period.as_secs() as i64, Ordering::SeqCst);
    }
}

pub fn practicum_client(server: &MockServer) -> PracticumClient {
    let endpoint = Url::parse(&format!("{}/api/user_api/homework_statuses/", server.uri())).unwrap();
    PracticumClient::with_client(reqwest::Client::new(), endpoint, "practicum-token".to_string())
}

pub fn telegram_notifier(server: &MockServer) -> TelegramNotifier {
    let bot = Bot::new("123456:TEST").set_api_url(reqwest::Url::parse(&server.uri()).unwrap());
    TelegramNotifier::with_bot(bot, &ChatTarget::Id(CHAT_ID))
}

/// Starts a Bot API mock that accepts every `sendMessage` call.
pub async fn start_telegram_mock() -> MockServer {
    let server = MockServer::start().await;
    let reply = json!({
        "ok": true,
        "result": {
            "message_id": 1,
            "date": 1700000000,
            "chat": {"id": CHAT_ID, "type": "private", "first_name": "Student"},
            "from": {"id": 123456, "is_bot": true, "first_name": "Bot"},
            "text": "ok"
        }
    });
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;
    server
}

/// Texts of all messages the Bot API mock received, in order.
pub async fn sent_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter_map(|body| body.get("text").and_then(Value::as_str).map(str::to_string))
        .collect()
}
