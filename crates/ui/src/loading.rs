//! Rotating messages shown while a quiz is being generated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const ROTATION_PERIOD: Duration = Duration::from_millis(3000);

pub const WITTY_MESSAGES: [&str; 9] = [
    "🤖 Don't worry, AGI won't take over the world...",
    "🎓 You will definitely pass XM_Cloud certification!",
    "🧠 Analyzing your topic knowledge...",
    "🔍 Preparing challenging questions just for you...",
    "💡 Fun fact: Sitecore was founded in 2001 in Denmark",
    "☕ Brewing the perfect quiz experience...",
    "⏳ Loading brain-teasing questions...",
    "🤔 Remember: The answer is always 'headless architecture'... or is it?",
    "✨ Tip: Read each question carefully before answering",
];

/// Background task advancing a message index on a fixed period.
///
/// The task is aborted by `stop` or when the ticker is dropped.
pub struct LoadingTicker {
    messages: Arc<Mutex<Vec<String>>>,
    index: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl LoadingTicker {
    /// Start rotating through `WITTY_MESSAGES`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn start() -> Self {
        Self::with_messages(
            WITTY_MESSAGES.iter().map(|m| (*m).to_string()).collect(),
            ROTATION_PERIOD,
        )
    }

    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn with_messages(messages: Vec<String>, period: Duration) -> Self {
        let index = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::clone(&index);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        });

        Self {
            messages: Arc::new(Mutex::new(messages)),
            index,
            handle: Some(handle),
        }
    }

    /// Message for the current tick, or `None` if there are no messages.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        if messages.is_empty() {
            return None;
        }
        let index = self.index.load(Ordering::Relaxed) % messages.len();
        messages.get(index).cloned()
    }

    pub fn replace_messages(&self, messages: Vec<String>) {
        *self.messages.lock().unwrap_or_else(PoisonError::into_inner) = messages;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for LoadingTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(items: &[&str]) -> Vec<String> {
        items.iter().map(|m| (*m).to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn advances_every_period() {
        let ticker = LoadingTicker::with_messages(messages(&["a", "b", "c"]), Duration::from_secs(3));
        tokio::task::yield_now().await;
        assert_eq!(ticker.current().as_deref(), Some("a"));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(ticker.current().as_deref(), Some("b"));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ticker.current().as_deref(), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_messages_mid_rotation_is_safe() {
        let ticker = LoadingTicker::with_messages(messages(&["a", "b", "c"]), Duration::from_secs(3));
        tokio::time::sleep(Duration::from_millis(6100)).await;
        assert_eq!(ticker.current().as_deref(), Some("c"));

        ticker.replace_messages(messages(&["only"]));
        assert_eq!(ticker.current().as_deref(), Some("only"));

        ticker.replace_messages(Vec::new());
        assert_eq!(ticker.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_rotation() {
        let mut ticker = LoadingTicker::start();
        assert!(ticker.is_running());
        ticker.stop();
        assert!(!ticker.is_running());

        let frozen = ticker.current();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticker.current(), frozen);
        assert_eq!(frozen.as_deref(), Some(WITTY_MESSAGES[0]));
    }
}
