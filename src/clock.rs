//! Time sources consulted by every primitive.
//!
//! [`TokioClock`] follows tokio's clock, so paused or manually advanced runtime time in tests
//! is observed by the gate, throttle, and cache alike. [`ManualClock`] only moves when told to
//! and is meant for synchronous, fully deterministic tests.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Debug + Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> Instant;
}

/// Clock backed by [`tokio::time::Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
impl Clock for TokioClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// Manually driven clock; clones share the same reading.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<Instant>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: Instant) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward by `by`.
	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: Instant) {
		*self.0.lock() = instant;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(Instant::now())
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		*self.0.lock()
	}
}
