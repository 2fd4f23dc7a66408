use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

pub const LAST_NOTIFICATION_KEY: &str = "lastNotification";

/// Receives a short human readable summary after a successful refresh.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str);
}

/// Forwards to `inner` at most once per `interval`, remembering the last
/// delivery in the key/value store so the limit holds across runs.
pub struct ThrottledNotifier<N: Notifier> {
    inner: N,
    collection: Arc<dyn KeyValueCollection>,
    interval: Duration,
}

impl<N: Notifier> ThrottledNotifier<N> {
    pub fn new(inner: N, collection: Arc<dyn KeyValueCollection>) -> Self {
        Self {
            inner,
            collection,
            interval: Duration::hours(24),
        }
    }

    async fn last_sent(&self) -> Option<i64> {
        let bytes = self.collection.get(LAST_NOTIFICATION_KEY.as_bytes()).await?;
        String::from_utf8(bytes).ok()?.trim().parse().ok()
    }

    pub async fn should_send(&self, now: DateTime<Utc>) -> bool {
        match self.last_sent().await {
            Some(last) => now.timestamp_millis() - last > self.interval.num_milliseconds(),
            None => true,
        }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for ThrottledNotifier<N> {
    async fn notify(&self, summary: &str) {
        let now = Utc::now();
        if !self.should_send(now).await {
            debug!("Notification throttled");
            return;
        }
        self.inner.notify(summary).await;
        self.collection
            .put(
                LAST_NOTIFICATION_KEY.as_bytes(),
                now.timestamp_millis().to_string().into_bytes(),
            )
            .await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Arc<RecordingNotifier> {
        async fn notify(&self, summary: &str) {
            self.sent.lock().await.push(summary.to_string());
        }
    }

    #[tokio::test]
    async fn test_sends_once_per_day() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier =
            ThrottledNotifier::new(Arc::clone(&recorder), Arc::new(MemoryCollection::new()));

        notifier.notify("first").await;
        notifier.notify("second").await;

        assert_eq!(*recorder.sent.lock().await, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_sends_again_after_interval() {
        let recorder = Arc::new(RecordingNotifier::default());
        let collection = Arc::new(MemoryCollection::new());
        let stale = (Utc::now() - Duration::hours(25)).timestamp_millis();
        collection
            .put(LAST_NOTIFICATION_KEY.as_bytes(), stale.to_string().into_bytes())
            .await;
        let notifier = ThrottledNotifier::new(Arc::clone(&recorder), collection);

        notifier.notify("again").await;

        assert_eq!(recorder.sent.lock().await.len(), 1);
        assert!(!notifier.should_send(Utc::now()).await);
    }
}
