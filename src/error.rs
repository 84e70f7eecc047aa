//! Crate-level error types shared by the gate, throttle, cache, and retry primitives.
//!
//! Gate rejections are ordinary [`Admission`](crate::gate::Admission) values and wrapped
//! operation failures are forwarded untouched, so these types only cover construction and
//! encoding problems raised by the crate itself.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Invalid construction parameters.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Rejection body could not be encoded.
	#[error("Rejection body could not be serialized.")]
	Serialization(
		#[from]
		#[source]
		serde_json::Error,
	),
}

/// Validation failures raised while building limiter, cache, or retry configuration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A window must admit at least one operation.
	#[error("Rate limit must be greater than zero.")]
	ZeroLimit,
	/// A window must have a positive length.
	#[error("Window interval must be greater than zero.")]
	ZeroInterval,
	/// Cached values must live for a positive duration.
	#[error("Cache TTL must be greater than zero.")]
	ZeroTtl,
	/// A retry policy must run the operation at least once.
	#[error("Retry policy must allow at least one attempt.")]
	ZeroAttempts,
}
