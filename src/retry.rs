//! Bounded retry with a fixed delay between attempts.
//!
//! Intermediate failures are swallowed (and logged when `tracing` is enabled); only the error of
//! the final attempt reaches the caller, unchanged.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::{self, Component, ComponentSpan, Outcome},
};

/// Validated attempt budget and inter-attempt delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
	max_attempts: u32,
	delay: Duration,
}
impl RetryPolicy {
	const DEFAULT_ATTEMPTS: u32 = 4;
	const DEFAULT_DELAY: Duration = Duration::from_secs(1);

	/// Creates a policy running the operation at most `max_attempts` times, `delay` apart.
	pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, ConfigError> {
		if max_attempts == 0 {
			return Err(ConfigError::ZeroAttempts);
		}

		Ok(Self { max_attempts, delay })
	}

	/// Total number of invocations allowed, including the first.
	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Pause between a failed attempt and the next one.
	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Runs `operation` until it succeeds or the attempt budget is spent.
	pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		retry_with_delay(operation, self.max_attempts, self.delay).await
	}
}
impl Default for RetryPolicy {
	/// Four attempts (three retries after the first call), one second apart.
	fn default() -> Self {
		Self { max_attempts: Self::DEFAULT_ATTEMPTS, delay: Self::DEFAULT_DELAY }
	}
}

/// Invokes `operation` up to `max_attempts` times, waiting `delay` after each failure.
///
/// Returns the first success, or the error of the last attempt once the budget is exhausted.
/// A budget of zero still runs the operation once.
pub async fn retry_with_delay<F, Fut, T, E>(
	mut operation: F,
	max_attempts: u32,
	delay: Duration,
) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let span = ComponentSpan::new(Component::Retry, "retry_with_delay");
	let max_attempts = max_attempts.max(1);
	let mut attempt = 1;

	loop {
		obs::record_outcome(Component::Retry, Outcome::Attempt);

		match span.instrument(operation()).await {
			Ok(value) => {
				obs::record_outcome(Component::Retry, Outcome::Success);

				return Ok(value);
			},
			Err(e) if attempt >= max_attempts => {
				obs::record_outcome(Component::Retry, Outcome::Failure);

				return Err(e);
			},
			Err(_) => {
				obs::retry_scheduled(attempt, max_attempts - attempt, delay);

				tokio::time::sleep(delay).await;

				attempt += 1;
			},
		}
	}
}
