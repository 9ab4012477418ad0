//! Periodic cache maintenance owned by the service

use super::ImageCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to the background sweep task. Dropping it stops the task.
#[derive(Debug)]
pub struct SweepHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Spawn a task that sweeps `cache` every `period`, first tick after one
    /// full period. Must be called inside a Tokio runtime.
    pub fn spawn(cache: Arc<ImageCache>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        debug!("Cache sweep removed {} entries, {} remain", removed, cache.len());
                    }
                }
            }
            debug!("Cache sweeper stopped");
        });

        info!("Cache sweeper running every {:?}", period);
        Self {
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
