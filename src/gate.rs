//! Synchronous fixed-window admission gate.
//!
//! The gate is meant to sit in front of a request handler: call [`AdmissionGate::check`] once
//! per inbound unit of work, forward on [`Admission::Allow`], and answer a
//! [`Admission::Deny`] with [`Rejection::STATUS_CODE`] and [`Rejection::body`].

pub mod response;

pub use response::*;

// self
use crate::{
	_prelude::*,
	clock::TokioClock,
	obs::{self, Component, Outcome},
	window::{RateWindow, WindowState},
};

/// Decision returned by [`AdmissionGate::check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
	/// The call may proceed.
	Allow,
	/// The window is exhausted.
	Deny(Rejection),
}
impl Admission {
	/// Returns `true` for [`Admission::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}
}

/// Fixed-window gate; clones share one window.
#[derive(Clone)]
pub struct AdmissionGate {
	state: Arc<Mutex<WindowState>>,
	clock: Arc<dyn Clock>,
	window: RateWindow,
}
impl AdmissionGate {
	/// Creates a gate reading time from [`TokioClock`].
	pub fn new(window: RateWindow) -> Self {
		Self::with_clock(window, Arc::new(TokioClock))
	}

	/// Creates a gate reading time from the provided clock.
	pub fn with_clock(window: RateWindow, clock: Arc<dyn Clock>) -> Self {
		let state = WindowState::new(window, clock.now());

		Self { state: Arc::new(Mutex::new(state)), clock, window }
	}

	/// Window configuration the gate enforces.
	pub fn window(&self) -> RateWindow {
		self.window
	}

	/// Counts the call against the current window, or rejects it when the window is full.
	pub fn check(&self) -> Admission {
		let now = self.clock.now();
		let admission = {
			let mut state = self.state.lock();

			state.roll(now);

			if state.try_acquire() {
				Admission::Allow
			} else {
				Admission::Deny(Rejection::new(state.retry_after_secs(now)))
			}
		};

		match admission {
			Admission::Allow => obs::record_outcome(Component::AdmissionGate, Outcome::Allow),
			Admission::Deny(rejection) => {
				obs::gate_denied(rejection.retry_after_secs);
				obs::record_outcome(Component::AdmissionGate, Outcome::Deny);
			},
		}

		admission
	}
}
impl Debug for AdmissionGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdmissionGate")
			.field("window", &self.window)
			.field("clock", &self.clock)
			.finish()
	}
}
