// self
use crate::{_prelude::*, obs::Component};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// A span builder used around component work.
#[derive(Clone, Debug)]
pub struct ComponentSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ComponentSpan {
	/// Creates a new span tagged with the provided component + stage.
	pub fn new(component: Component, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::debug_span!("pacekeeper.component", component = component.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (component, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn gate_denied(retry_after_secs: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(retry_after_secs, "admission gate rejected a call");
	#[cfg(not(feature = "tracing"))]
	let _ = retry_after_secs;
}

pub(crate) fn throttle_parked(queued: usize, resume_in: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		queued,
		resume_in_ms = u64::try_from(resume_in.as_millis()).unwrap_or(u64::MAX),
		"throttle window exhausted; deferring queued work"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (queued, resume_in);
}

pub(crate) fn throttle_unscheduled() {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		"no tokio runtime available; dispatch postponed until the submission is polled"
	);
}

pub(crate) fn throttle_drained(dispatched: usize, queued: usize) {
	#[cfg(feature = "tracing")]
	tracing::trace!(dispatched, queued, "throttle drained queue");
	#[cfg(not(feature = "tracing"))]
	let _ = (dispatched, queued);
}

pub(crate) fn cache_miss(key: &str, stale: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, stale, "cache miss");
	#[cfg(not(feature = "tracing"))]
	let _ = (key, stale);
}

pub(crate) fn retry_scheduled(attempt: u32, attempts_left: u32, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt,
		attempts_left,
		delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
		"operation failed; retrying"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, attempts_left, delay);
}
