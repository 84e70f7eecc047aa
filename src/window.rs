//! Fixed-window counters shared by the admission gate and the throttle.
//!
//! A window admits up to `limit` operations until `reset_at`; the first observation at or
//! after `reset_at` starts a fresh window of length `interval` measured from that moment.
//! Windows are fixed rather than sliding, so a burst straddling a boundary can see up to
//! twice the limit within a short span.

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated `(limit, interval)` pair describing a fixed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RateWindow {
	limit: u32,
	interval: Duration,
}
impl RateWindow {
	/// Creates a window admitting `limit` operations per `interval`.
	pub fn new(limit: u32, interval: Duration) -> Result<Self, ConfigError> {
		if limit == 0 {
			return Err(ConfigError::ZeroLimit);
		}
		if interval.is_zero() {
			return Err(ConfigError::ZeroInterval);
		}

		Ok(Self { limit, interval })
	}

	/// Shorthand for a window measured in milliseconds.
	pub fn per_millis(limit: u32, interval_ms: u64) -> Result<Self, ConfigError> {
		Self::new(limit, Duration::from_millis(interval_ms))
	}

	/// Maximum number of operations admitted per window.
	pub fn limit(&self) -> u32 {
		self.limit
	}

	/// Length of each window.
	pub fn interval(&self) -> Duration {
		self.interval
	}
}

/// Mutable `{count, reset_at}` state of a fixed window.
#[derive(Debug)]
pub(crate) struct WindowState {
	window: RateWindow,
	count: u32,
	reset_at: Instant,
}
impl WindowState {
	pub(crate) fn new(window: RateWindow, now: Instant) -> Self {
		Self { window, count: 0, reset_at: now + window.interval }
	}

	/// Starts a new window when `now` has reached the current window's end.
	pub(crate) fn roll(&mut self, now: Instant) {
		if now >= self.reset_at {
			self.count = 0;
			self.reset_at = now + self.window.interval;
		}
	}

	/// Consumes one slot of the current window if any remain.
	pub(crate) fn try_acquire(&mut self) -> bool {
		if self.count < self.window.limit {
			self.count += 1;

			true
		} else {
			false
		}
	}

	pub(crate) fn is_exhausted(&self) -> bool {
		self.count >= self.window.limit
	}

	pub(crate) fn reset_at(&self) -> Instant {
		self.reset_at
	}

	/// Whole seconds until the window resets, rounded up from millisecond precision.
	pub(crate) fn retry_after_secs(&self, now: Instant) -> u64 {
		let remaining_ms = self.reset_at.saturating_duration_since(now).as_millis();

		u64::try_from(remaining_ms.div_ceil(1_000)).unwrap_or(u64::MAX)
	}
}
