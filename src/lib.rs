//! Fixed-window admission gates, paced async throttles, TTL caches, and bounded retries for
//! protecting a downstream resource from overload and smoothing transient failures.
//!
//! Every primitive owns its state behind a cloneable handle and reads time through an
//! injectable [`Clock`](clock::Clock), so independent instances never share counters and
//! tests can drive time deterministically.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod clock;
pub mod error;
pub mod gate;
pub mod obs;
pub mod retry;
pub mod throttle;
pub mod window;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, TokioClock};
pub use error::{ConfigError, Error, Result};
pub use gate::{Admission, AdmissionGate, Rejection, RejectionBody};
pub use retry::{RetryPolicy, retry_with_delay};
pub use throttle::Throttle;
pub use window::RateWindow;

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use tokio::time::Instant;

	pub use crate::{clock::Clock, error::Result};
}
