use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Time source for idle expiry.
pub trait Clock: Send + Sync + fmt::Debug {
	fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// A clock that only moves when told to.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
	base: Instant,
	offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self {
			base: Instant::now(),
			offset: Arc::new(Mutex::new(Duration::ZERO)),
		}
	}

	/// Moves every clone of this clock forward by `by`.
	pub fn advance(&self, by: Duration) {
		*self.offset.lock() += by;
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.base + *self.offset.lock()
	}
}
