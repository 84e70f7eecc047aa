//! Optional observability hooks for the gate, throttle, cache, and retry primitives.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `pacekeeper.component` with the
//!   `component` and `stage` fields, plus debug/warn events at queueing, dispatch, cache misses,
//!   and retry failures.
//! - Enable `metrics` to increment the `pacekeeper_events_total` counter, labeled by
//!   `component` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Primitives observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
	/// Fixed-window admission gate.
	AdmissionGate,
	/// Queued throttle.
	Throttle,
	/// TTL cache.
	Cache,
	/// Bounded retry helper.
	Retry,
}
impl Component {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Component::AdmissionGate => "admission_gate",
			Component::Throttle => "throttle",
			Component::Cache => "cache",
			Component::Retry => "retry",
		}
	}
}
impl Display for Component {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per component event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Gate admitted a call.
	Allow,
	/// Gate rejected a call.
	Deny,
	/// Throttle parked a submission behind an exhausted window.
	Queued,
	/// Throttle released a submission.
	Dispatched,
	/// Cache served a fresh entry.
	Hit,
	/// Cache had no fresh entry.
	Miss,
	/// Retry invoked the wrapped operation.
	Attempt,
	/// Wrapped operation eventually succeeded.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Allow => "allow",
			Outcome::Deny => "deny",
			Outcome::Queued => "queued",
			Outcome::Dispatched => "dispatched",
			Outcome::Hit => "hit",
			Outcome::Miss => "miss",
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
