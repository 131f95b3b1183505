// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! State of the dashboard screen and the one fetch it makes when it is shown.

use tokio::sync::watch;

use crate::channel::{ChannelController, Feed};
use crate::display::DisplayModel;

/// Number of feeds requested when the screen is shown.
pub const RECENT_FEED_COUNT: u32 = 30;

/// What the dashboard screen currently shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScreenState {
    /// The fetch is still running.
    #[default]
    Loading,
    /// The fetch succeeded, possibly with no feeds at all.
    Ready(Vec<Feed>),
    /// The fetch failed. Drawn exactly like an empty `Ready`.
    Failed(String),
}

impl ScreenState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The feeds to chart, empty unless the fetch succeeded.
    pub fn feeds(&self) -> &[Feed] {
        match self {
            Self::Ready(feeds) => feeds,
            Self::Loading | Self::Failed(_) => &[],
        }
    }

    pub fn display_model(&self) -> DisplayModel {
        DisplayModel::from_feeds(self.feeds())
    }
}

/// Owned by the mounted screen. Cancelling or dropping it cancels every [CancelSignal] it handed out.
pub struct FetchGuard {
    sender: watch::Sender<bool>,
}

impl FetchGuard {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for FetchGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Tells a running fetch that its result is no longer wanted.
#[derive(Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        // A dropped guard means the screen is gone.
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Resolves once the guard is cancelled or dropped.
    pub async fn cancelled(&mut self) {
        let _ = self.receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Fetches the most recent feeds and returns the state the screen should switch to.
///
/// Returns `None` if `cancel` fired before the result could be committed.
pub async fn load(controller: &dyn ChannelController, mut cancel: CancelSignal) -> Option<ScreenState> {
    let state = tokio::select! {
        result = controller.recent_feeds(RECENT_FEED_COUNT) => match result {
            Ok(response) => {
                log::info!("Fetched {} feeds of channel {}", response.feeds.len(), response.channel.id);
                ScreenState::Ready(response.feeds)
            }
            Err(e) => {
                log::error!("Error fetching feeds: {e}");
                ScreenState::Failed(e.to_string())
            }
        },
        _ = cancel.cancelled() => {
            log::debug!("Screen went away while fetching feeds");
            return None;
        }
    };

    if cancel.is_cancelled() {
        log::debug!("Discarding feeds fetched for a screen that went away");
        return None;
    }

    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelError, ChannelResponse, DummyChannelController, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Keeps every log record so tests can check what was reported.
    struct CapturingLogger {
        records: Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger {
        records: Mutex::new(Vec::new()),
    };

    /// Installs the capturing logger; the first call in the test binary wins.
    fn capture_logs() -> &'static CapturingLogger {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
        &LOGGER
    }

    /// Answers every read with a canned result and records the requested counts.
    struct MockController {
        feeds: Option<Vec<Feed>>,
        requested: Mutex<Vec<u32>>,
    }

    impl MockController {
        fn new(feeds: Option<Vec<Feed>>) -> Self {
            Self {
                feeds,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChannelController for MockController {
        async fn recent_feeds(&self, count: u32) -> Result<ChannelResponse> {
            self.requested.lock().unwrap().push(count);
            match &self.feeds {
                Some(feeds) => Ok(ChannelResponse {
                    feeds: feeds.clone(),
                    ..Default::default()
                }),
                None => Err(ChannelError::Status(503)),
            }
        }

        async fn field_series(&self, _field: u8, count: u32) -> Result<ChannelResponse> {
            self.recent_feeds(count).await
        }

        async fn submit_field_value(&self, _value: f64) -> Result<u64> {
            Ok(1)
        }
    }

    /// Never answers.
    struct HangingController;

    #[async_trait]
    impl ChannelController for HangingController {
        async fn recent_feeds(&self, _count: u32) -> Result<ChannelResponse> {
            std::future::pending().await
        }

        async fn field_series(&self, _field: u8, _count: u32) -> Result<ChannelResponse> {
            std::future::pending().await
        }

        async fn submit_field_value(&self, _value: f64) -> Result<u64> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_initial_state() {
        let state = ScreenState::default();

        assert!(state.is_loading());
        assert!(state.feeds().is_empty());
    }

    #[tokio::test]
    async fn test_load_success() {
        let controller = DummyChannelController::new().unwrap();
        let guard = FetchGuard::new();

        let state = load(&controller, guard.signal()).await.unwrap();

        assert!(!state.is_loading());
        assert_eq!(state.feeds().len(), 7);
        assert_eq!(state.display_model().voltage.values.len(), 7);
        assert_eq!(state.display_model().labels.len(), 3);
    }

    #[tokio::test]
    async fn test_load_requests_recent_feeds() {
        let controller = MockController::new(Some(Vec::new()));
        let guard = FetchGuard::new();

        let state = load(&controller, guard.signal()).await.unwrap();

        assert_eq!(state, ScreenState::Ready(Vec::new()));
        assert_eq!(*controller.requested.lock().unwrap(), vec![RECENT_FEED_COUNT]);
    }

    #[tokio::test]
    async fn test_load_failure() {
        let logger = capture_logs();
        let controller = MockController::new(None);
        let guard = FetchGuard::new();

        let state = load(&controller, guard.signal()).await.unwrap();

        assert!(matches!(state, ScreenState::Failed(ref reason) if reason.contains("503")));
        assert!(state.feeds().is_empty());
        assert_eq!(state.display_model(), ScreenState::Ready(Vec::new()).display_model());

        let records = logger.records.lock().unwrap();
        assert!(records
            .iter()
            .any(|(level, message)| *level == log::Level::Error && message.contains("503")));
    }

    #[tokio::test]
    async fn test_cancel_while_fetching() {
        let guard = FetchGuard::new();
        let signal = guard.signal();

        let (state, _) = tokio::join!(load(&HangingController, signal), async { guard.cancel() });

        assert_eq!(state, None);
    }

    #[tokio::test]
    async fn test_dropped_guard_discards_result() {
        let controller = MockController::new(Some(Vec::new()));
        let guard = FetchGuard::new();
        let signal = guard.signal();
        drop(guard);

        assert!(signal.is_cancelled());
        assert_eq!(load(&controller, signal).await, None);
    }

    #[test]
    fn test_signal_not_cancelled_while_guard_lives() {
        let guard = FetchGuard::new();
        let signal = guard.signal();

        assert!(!signal.is_cancelled());
        guard.cancel();
        assert!(signal.is_cancelled());
    }
}
