use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cache::RecordCache;

/// Background task evicting idle records on a fixed period.
///
/// Dropping the handle cancels the task without waiting for it.
#[derive(Debug)]
pub struct Sweeper {
	cancel: CancellationToken,
	task: JoinHandle<()>,
}

impl Sweeper {
	/// Spawns the sweep loop on the current tokio runtime.
	///
	/// # Panics
	///
	/// Panics if called outside a tokio runtime.
	pub fn spawn(cache: Arc<RecordCache>, interval: Duration) -> Self {
		let cancel = CancellationToken::new();
		let task_cancel = cancel.clone();
		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			// The first tick completes immediately.
			ticker.tick().await;
			tracing::debug!(?interval, "sweeper.start");
			loop {
				tokio::select! {
					_ = task_cancel.cancelled() => break,
					_ = ticker.tick() => {
						cache.evict_expired();
					}
				}
			}
			tracing::debug!("sweeper.stop");
		});
		Self { cancel, task }
	}

	/// A token that stops the sweeper when cancelled.
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Cancels the task and waits for it to exit.
	pub async fn stop(mut self) {
		self.cancel.cancel();
		if let Err(error) = (&mut self.task).await {
			tracing::warn!(%error, "sweeper task did not exit cleanly");
		}
	}
}

impl Drop for Sweeper {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}
