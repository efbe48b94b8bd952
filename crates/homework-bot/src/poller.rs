//! The poll loop: fetch → validate → translate → notify → sleep.
//!
//! A [`Poller`] owns the cursor and the memo of the last error reported to
//! the chat. It never terminates on a failed cycle: the error is logged,
//! reported once per distinct message, and polling goes on after the usual
//! retry period. Only the shutdown future (or a cycle cap) ends [`Poller::run`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::HomeworkApi;
use crate::error::{BotResult, ErrorKind};
use crate::homework::{check_response, failure_message, parse_status};
use crate::notifier::{send_message, Notifier};

/// Time source and sleep used by the loop; swapped out in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds
    fn now(&self) -> i64;

    async fn sleep(&self, period: Duration);
}

/// Wall clock backed by `chrono` and `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// What happened during one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle finished; `sent` verdict messages were delivered
    Completed { sent: usize },
    /// Cycle aborted with an error; `reported` tells whether a failure
    /// message went out to the chat for it
    Failed { kind: ErrorKind, reported: bool },
}

pub struct Poller<A, N, C = SystemClock> {
    api: A,
    notifier: N,
    clock: C,
    retry_period: Duration,
    cursor: i64,
    last_error: Option<String>,
}

impl<A, N, C> Poller<A, N, C>
where
    A: HomeworkApi,
    N: Notifier,
    C: Clock,
{
    /// Creates a poller starting from the epoch, so the first cycle picks
    /// up the whole status history.
    pub fn new(api: A, notifier: N, clock: C, retry_period: Duration) -> Self {
        Self {
            api,
            notifier,
            clock,
            retry_period,
            cursor: 0,
            last_error: None,
        }
    }

    /// Starts polling from `from_date` instead of the epoch.
    pub fn with_cursor(mut self, from_date: i64) -> Self {
        self.cursor = from_date;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Text of the last error reported to the chat, if it is still current.
    pub fn last_reported_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs one cycle without any error handling.
    ///
    /// The cursor moves to "now" right after a successful fetch, before the
    /// payload is validated. A translation error aborts the remaining
    /// homeworks of this response. Delivery failures are logged by
    /// [`send_message`] and do not abort the cycle.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of verdict messages delivered
    /// * `Err(BotError)` - Transport, protocol, shape or semantic failure
    pub async fn run_cycle(&mut self) -> BotResult<usize> {
        let response = self.api.fetch(self.cursor).await?;
        self.cursor = self.clock.now();

        let homeworks = check_response(&response)?;
        if homeworks.is_empty() {
            log::debug!("No new homework statuses");
            return Ok(0);
        }

        let mut sent = 0;
        for homework in homeworks {
            let message = parse_status(homework)?;
            if send_message(&self.notifier, &message).await {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Runs one cycle and handles its failure.
    ///
    /// A failure is reported to the chat only if its text differs from the
    /// last one that was successfully reported. A completed cycle forgets
    /// the last error, so the same failure is reported again if it comes
    /// back later.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        match self.run_cycle().await {
            Ok(sent) => {
                if self.last_error.take().is_some() {
                    log::info!("Polling recovered after an error");
                }
                CycleOutcome::Completed { sent }
            }
            Err(e) => {
                let kind = e.kind();
                let message = failure_message(&e);
                log::error!("{} (kind: {})", message, kind);

                let text = e.to_string();
                let reported = if self.last_error.as_deref() == Some(text.as_str()) {
                    log::debug!("Same error as last reported, not notifying again");
                    false
                } else if send_message(&self.notifier, &message).await {
                    self.last_error = Some(text);
                    true
                } else {
                    false
                };

                CycleOutcome::Failed { kind, reported }
            }
        }
    }

    /// Polls until `shutdown` resolves, sleeping the retry period between
    /// cycles. With `max_cycles` set, stops after that many cycles.
    pub async fn run<F>(&mut self, shutdown: F, max_cycles: Option<usize>)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0usize;

        log::info!(
            "Polling started (cursor: {}, retry period: {}s)",
            self.cursor,
            self.retry_period.as_secs()
        );

        loop {
            log::debug!("Poll cycle #{} (from_date={})", cycles + 1, self.cursor);
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.poll_once() => {}
            }
            cycles += 1;

            if max_cycles.is_some_and(|max| cycles >= max) {
                log::info!("Reached {} poll cycle(s), stopping", cycles);
                return;
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.clock.sleep(self.retry_period) => {}
            }
        }

        log::info!("Shutdown requested, polling stopped after {} cycle(s)", cycles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedApi {
        responses: Mutex<VecDeque<BotResult<Value>>>,
        cursors: Mutex<Vec<i64>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<BotResult<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HomeworkApi for ScriptedApi {
        async fn fetch(&self, from_date: i64) -> BotResult<Value> {
            self.cursors.lock().unwrap().push(from_date);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": []})))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> BotResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeClock {
        now: Arc<AtomicI64>,
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }

        async fn sleep(&self, period: Duration) {
            self.now.fetch_add(period.as_secs() as i64, Ordering::SeqCst);
        }
    }

    fn poller(
        responses: Vec<BotResult<Value>>,
    ) -> Poller<ScriptedApi, RecordingNotifier, FakeClock> {
        let clock = FakeClock::default();
        clock.now.store(1_000, Ordering::SeqCst);
        Poller::new(
            ScriptedApi::new(responses),
            RecordingNotifier::default(),
            clock,
            Duration::from_secs(600),
        )
    }

    #[tokio::test]
    async fn test_cycle_sends_one_message_per_homework() {
        let mut poller = poller(vec![Ok(json!({"homeworks": [
            {"homework_name": "hw1", "status": "approved"},
            {"homework_name": "hw0", "status": "rejected"}
        ]}))]);

        let outcome = poller.poll_once().await;
        assert_eq!(outcome, CycleOutcome::Completed { sent: 2 });

        let sent = poller.notifier.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                "Изменился статус проверки работы \"hw1\". Работа проверена: ревьюеру всё понравилось. Ура!".to_string(),
                "Изменился статус проверки работы \"hw0\". Работа проверена: у ревьюера есть замечания.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_cursor_starts_at_epoch_and_advances() {
        let mut poller = poller(vec![]);
        assert_eq!(poller.cursor(), 0);

        poller.poll_once().await;
        assert_eq!(poller.cursor(), 1_000);
        assert_eq!(*poller.api.cursors.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_cursor_not_advanced_when_fetch_fails() {
        let mut poller = poller(vec![Err(BotError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            endpoint: "http://x/".to_string(),
        })])
        .with_cursor(500);

        let outcome = poller.poll_once().await;
        assert_eq!(
            outcome,
            CycleOutcome::Failed {
                kind: ErrorKind::Protocol,
                reported: true
            }
        );
        assert_eq!(poller.cursor(), 500);
    }

    #[tokio::test]
    async fn test_empty_homeworks_sends_nothing() {
        let mut poller = poller(vec![Ok(json!({"homeworks": [], "current_date": 1000}))]);

        assert_eq!(poller.poll_once().await, CycleOutcome::Completed { sent: 0 });
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_reported_once() {
        let bogus = || Ok(json!({"homeworks": [{"homework_name": "hw2", "status": "bogus"}]}));
        let mut poller = poller(vec![bogus(), bogus(), bogus()]);

        let first = poller.poll_once().await;
        let second = poller.poll_once().await;
        let third = poller.poll_once().await;

        assert_eq!(
            first,
            CycleOutcome::Failed {
                kind: ErrorKind::Semantic,
                reported: true
            }
        );
        assert_eq!(
            second,
            CycleOutcome::Failed {
                kind: ErrorKind::Semantic,
                reported: false
            }
        );
        assert_eq!(second, third);

        let sent = poller.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec!["Сбой в работе программы: unknown work status: bogus".to_string()]);
    }

    #[tokio::test]
    async fn test_different_errors_are_each_reported() {
        let mut poller = poller(vec![
            Ok(json!([])),
            Ok(json!({"homeworks": [{"status": "approved"}]})),
        ]);

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = poller.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "Сбой в работе программы: no homework name in API response");
    }

    #[tokio::test]
    async fn test_error_reported_again_after_recovery() {
        let bogus = || Ok(json!({"homeworks": [{"homework_name": "hw2", "status": "bogus"}]}));
        let mut poller = poller(vec![bogus(), Ok(json!({"homeworks": []})), bogus()]);

        poller.poll_once().await;
        assert!(poller.last_reported_error().is_some());
        poller.poll_once().await;
        assert!(poller.last_reported_error().is_none());
        poller.poll_once().await;

        assert_eq!(poller.notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_after_max_cycles_and_sleeps_between() {
        let mut poller = poller(vec![]);

        poller.run(std::future::pending(), Some(3)).await;

        // Three fetches, two sleeps of 600s in between.
        assert_eq!(*poller.api.cursors.lock().unwrap(), vec![0, 1_000, 1_600]);
        assert_eq!(poller.clock.now(), 2_200);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut poller = poller(vec![]);

        poller.run(async {}, None).await;

        assert!(poller.api.cursors.lock().unwrap().len() <= 1);
    }
}
