//! Periodic triggers decoupled from the work they trigger.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Emits a copy of `job` into a channel every `period` until stopped. The
/// consumer decides how jobs run; a single consumer runs them one at a time.
pub struct PeriodicTask {
    name: String,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    pub fn start<J>(name: &str, period: Duration, sender: mpsc::Sender<J>, job: J) -> Self
    where
        J: Clone + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        debug!(task = %task_name, "Periodic task fired");
                        if sender.send(job.clone()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            name: name.to_string(),
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = self.handle.await;
        debug!(task = %self.name, "Periodic task stopped");
    }
}
