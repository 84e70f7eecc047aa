//! Queued fixed-window throttle that paces async work instead of rejecting it.
//!
//! [`Throttle::submit`] appends the operation to a FIFO queue and immediately drains the queue:
//! while the current window has budget, head submissions are spawned on the tokio runtime and
//! run concurrently. Work left behind an exhausted window is picked up by a single
//! worker task that sleeps until the window resets and drains again, looping until the queue is
//! empty. At most one worker exists per throttle.

// std
use std::{future, marker::PhantomData, panic};
// crates.io
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	clock::TokioClock,
	obs::{self, Component, ComponentSpan, Outcome},
	window::{RateWindow, WindowState},
};

/// Paces submitted operations to at most `limit` dispatches per fixed window.
///
/// Clones share the same queue and window. Operation outcomes, including errors, are returned
/// verbatim; a failed operation neither frees its slot nor affects other queued work.
#[derive(Clone)]
pub struct Throttle {
	shared: Arc<Shared>,
	window: RateWindow,
}
impl Throttle {
	/// Creates a throttle reading time from [`TokioClock`].
	pub fn new(window: RateWindow) -> Self {
		Self::with_clock(window, Arc::new(TokioClock))
	}

	/// Creates a throttle reading time from the provided clock.
	///
	/// Deferred drains sleep on tokio's timer, so the clock must advance together with tokio
	/// time for queued work to be released on schedule. A clock that lags tokio time (such as a
	/// [`ManualClock`](crate::clock::ManualClock) nobody advances) makes the worker re-check
	/// every millisecond until the clock catches up.
	pub fn with_clock(window: RateWindow, clock: Arc<dyn Clock>) -> Self {
		let state = ThrottleState {
			window: WindowState::new(window, clock.now()),
			queue: VecDeque::new(),
			wakeup_scheduled: false,
		};

		Self { shared: Arc::new(Shared { state: Mutex::new(state), clock }), window }
	}

	/// Window configuration the throttle enforces.
	pub fn window(&self) -> RateWindow {
		self.window
	}

	/// Number of submissions waiting for dispatch, excluding withdrawn ones.
	pub fn queued(&self) -> usize {
		self.shared.state.lock().queue.iter().filter(|task| !task.is_withdrawn()).count()
	}

	/// Queues `operation` and returns a future resolving to its output once it has been
	/// dispatched and run.
	///
	/// The submission is enqueued when this method is called, so dispatch order follows call
	/// order regardless of when the returned futures are first polled. Dispatch spawns the
	/// operation on the tokio runtime right away; the returned future only relays its output.
	/// Dropping the future before dispatch withdraws the submission without consuming window
	/// budget, while dropping it afterwards leaves the operation running to completion.
	///
	/// A panic inside the operation is resumed on the task awaiting the returned future.
	pub fn submit<F, Fut>(&self, operation: F) -> impl Future<Output = Fut::Output> + use<F, Fut>
	where
		F: 'static + Send + FnOnce() -> Fut,
		Fut: 'static + Send + Future,
		Fut::Output: 'static + Send,
	{
		let (reply, dispatched) = oneshot::channel();
		let submission = Submission { operation, reply, _future: PhantomData };
		let shared = self.shared.clone();

		shared.state.lock().queue.push_back(Box::new(submission));

		if Shared::pump(&shared) {
			obs::record_outcome(Component::Throttle, Outcome::Queued);
		}

		async move {
			// Retry scheduling from inside the runtime in case submission happened outside one.
			Shared::pump(&shared);

			// The sender lives in the queue, which `shared` keeps alive until dispatch.
			let Ok(task) = dispatched.await else {
				return future::pending().await;
			};

			drop(shared);

			match task.await {
				Ok(output) => output,
				Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
				// Only reachable while the runtime shuts down.
				Err(_) => future::pending().await,
			}
		}
	}
}
impl Debug for Throttle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Throttle")
			.field("window", &self.window)
			.field("queued", &self.queued())
			.finish()
	}
}

/// Type-erased queued submission.
trait PendingTask
where
	Self: Send,
{
	/// The submitter dropped its future before dispatch.
	fn is_withdrawn(&self) -> bool;

	/// Spawns the operation and hands its join handle to the submitter.
	fn launch(self: Box<Self>, runtime: &Handle);
}

struct Submission<F, Fut>
where
	Fut: Future,
{
	operation: F,
	reply: oneshot::Sender<JoinHandle<Fut::Output>>,
	_future: PhantomData<fn() -> Fut>,
}
impl<F, Fut> PendingTask for Submission<F, Fut>
where
	F: 'static + Send + FnOnce() -> Fut,
	Fut: 'static + Send + Future,
	Fut::Output: 'static + Send,
{
	fn is_withdrawn(&self) -> bool {
		self.reply.is_closed()
	}

	fn launch(self: Box<Self>, runtime: &Handle) {
		let Self { operation, reply, .. } = *self;
		let span = ComponentSpan::new(Component::Throttle, "operation");
		let task = runtime.spawn(span.instrument(async move { operation().await }));

		// A submitter gone since the withdrawal check leaves the task detached.
		let _ = reply.send(task);
	}
}

struct Shared {
	state: Mutex<ThrottleState>,
	clock: Arc<dyn Clock>,
}
impl Shared {
	/// Drains on behalf of a submitter and spawns the deferred worker when one is needed.
	///
	/// Returns `true` when work is still queued afterwards.
	fn pump(shared: &Arc<Self>) -> bool {
		let Ok(runtime) = Handle::try_current() else {
			obs::throttle_unscheduled();

			return !shared.state.lock().queue.is_empty();
		};
		let (wake_at, queued) = shared.drain(Drainer::Submitter, &runtime);

		if let Some(wake_at) = wake_at {
			runtime.spawn(Self::run_worker(shared.clone(), runtime.clone(), wake_at));
		}

		queued > 0
	}

	/// Dispatches queued submissions while the window has budget.
	///
	/// Returns the instant the caller must wake up at to drain again (if it is responsible for
	/// that) and the number of submissions still queued.
	fn drain(&self, drainer: Drainer, runtime: &Handle) -> (Option<Instant>, usize) {
		let now = self.clock.now();
		let mut state = self.state.lock();
		let mut dispatched = 0;

		state.window.roll(now);

		while !state.window.is_exhausted() {
			let Some(task) = state.queue.pop_front() else {
				break;
			};

			// Withdrawn submissions keep their slot for the next one.
			if task.is_withdrawn() {
				continue;
			}

			state.window.try_acquire();
			task.launch(runtime);

			dispatched += 1;
		}

		let queued = state.queue.len();
		let wake_at = match (queued, drainer) {
			(0, Drainer::Worker) => {
				state.wakeup_scheduled = false;

				None
			},
			(0, Drainer::Submitter) => None,
			(_, Drainer::Worker) => Some(state.window.reset_at()),
			(_, Drainer::Submitter) if state.wakeup_scheduled => None,
			(_, Drainer::Submitter) => {
				state.wakeup_scheduled = true;

				Some(state.window.reset_at())
			},
		};

		if queued > 0 && wake_at.is_some() {
			obs::throttle_parked(queued, state.window.reset_at().saturating_duration_since(now));
		}

		drop(state);

		for _ in 0..dispatched {
			obs::record_outcome(Component::Throttle, Outcome::Dispatched);
		}

		obs::throttle_drained(dispatched, queued);

		(wake_at, queued)
	}

	async fn run_worker(shared: Arc<Self>, runtime: Handle, mut wake_at: Instant) {
		let mut guard = WorkerGuard { shared: shared.clone(), armed: true };

		loop {
			// Guards against clocks that lag tokio's timer.
			tokio::time::sleep_until(wake_at.max(Instant::now() + MIN_RECHECK)).await;

			match shared.drain(Drainer::Worker, &runtime) {
				(Some(next), _) => wake_at = next,
				(None, _) => break,
			}
		}

		// The final drain already cleared the flag under the lock.
		guard.armed = false;
	}
}

const MIN_RECHECK: Duration = Duration::from_millis(1);

/// Clears `wakeup_scheduled` when a worker is dropped mid-sleep (e.g. runtime shutdown), so
/// later submissions can spawn a replacement.
struct WorkerGuard {
	shared: Arc<Shared>,
	armed: bool,
}
impl Drop for WorkerGuard {
	fn drop(&mut self) {
		if self.armed {
			self.shared.state.lock().wakeup_scheduled = false;
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drainer {
	Submitter,
	Worker,
}

struct ThrottleState {
	window: WindowState,
	queue: VecDeque<Box<dyn PendingTask>>,
	wakeup_scheduled: bool,
}
