// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Duration,
};
// crates.io
use tokio::{sync::Mutex, time::Instant};
// self
use pacekeeper::{RateWindow, Throttle};

fn build_throttle(limit: u32, interval_ms: u64) -> Throttle {
	Throttle::new(
		RateWindow::per_millis(limit, interval_ms)
			.expect("Failed to build rate window for throttle tests."),
	)
}

#[tokio::test(start_paused = true)]
async fn seven_items_limit_five_dispatch_across_two_windows() {
	let throttle = build_throttle(5, 10_000);
	let started = Instant::now();
	let log = Arc::new(Mutex::new(Vec::new()));
	let handles = (0..7)
		.map(|id| {
			let log = log.clone();
			let fut = throttle.submit(move || async move {
				log.lock().await.push((id, started.elapsed()));

				id
			});

			tokio::spawn(fut)
		})
		.collect::<Vec<_>>();

	assert_eq!(throttle.queued(), 2);

	let mut results = Vec::new();

	for handle in handles {
		results.push(handle.await.expect("Throttled task should not panic."));
	}

	assert_eq!(results, (0..7).collect::<Vec<_>>());

	let log = log.lock().await;
	let first_window = log.iter().filter(|(_, at)| *at < Duration::from_millis(10_000)).count();
	let order = log.iter().map(|(id, _)| *id).collect::<Vec<_>>();

	assert_eq!(first_window, 5);
	assert!(
		log.iter()
			.filter(|(id, _)| *id >= 5)
			.all(|(_, at)| *at == Duration::from_millis(10_000))
	);
	assert_eq!(order, (0..7).collect::<Vec<_>>());
	assert_eq!(throttle.queued(), 0);
}

#[tokio::test(start_paused = true)]
async fn dispatch_follows_submission_order_not_poll_order() {
	let throttle = build_throttle(1, 100);
	let log = Arc::new(Mutex::new(Vec::new()));
	let mut futures = (0..4)
		.map(|id| {
			let log = log.clone();

			throttle.submit(move || async move {
				log.lock().await.push(id);
			})
		})
		.collect::<Vec<_>>();

	futures.reverse();

	let handles = futures.into_iter().map(tokio::spawn).collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Throttled task should not panic.");
	}

	assert_eq!(*log.lock().await, vec![0, 1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn failed_operation_leaves_queue_intact() {
	let throttle = build_throttle(1, 1_000);
	let calls = Arc::new(AtomicU32::new(0));
	let failing = {
		let calls = calls.clone();

		throttle.submit(move || async move {
			calls.fetch_add(1, Ordering::SeqCst);

			Err::<u32, _>("upstream failure")
		})
	};
	let succeeding = {
		let calls = calls.clone();

		throttle.submit(move || async move {
			calls.fetch_add(1, Ordering::SeqCst);

			Ok::<_, &str>(2)
		})
	};

	assert_eq!(failing.await, Err("upstream failure"));
	assert_eq!(succeeding.await, Ok(2));
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn dispatched_operations_run_concurrently() {
	let throttle = build_throttle(3, 60_000);
	let started = Instant::now();
	let handles = (0..3)
		.map(|_| {
			tokio::spawn(throttle.submit(|| async {
				tokio::time::sleep(Duration::from_millis(500)).await;
			}))
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Throttled task should not panic.");
	}

	assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn idle_throttle_starts_fresh_window() {
	let throttle = build_throttle(2, 1_000);

	throttle.submit(|| async {}).await;
	throttle.submit(|| async {}).await;
	tokio::time::sleep(Duration::from_millis(1_500)).await;

	let started = Instant::now();

	throttle.submit(|| async {}).await;
	throttle.submit(|| async {}).await;

	assert_eq!(started.elapsed(), Duration::ZERO);

	throttle.submit(|| async {}).await;

	assert_eq!(started.elapsed(), Duration::from_millis(1_000));
}

type StartLog = Arc<Mutex<Vec<(&'static str, Duration)>>>;

async fn record_start(log: StartLog, name: &'static str, origin: Instant) -> &'static str {
	log.lock().await.push((name, origin.elapsed()));

	name
}

#[tokio::test(start_paused = true)]
async fn operation_starts_when_dispatched_not_when_awaited() {
	let throttle = build_throttle(1, 1_000);
	let origin = Instant::now();
	let log = Arc::new(Mutex::new(Vec::new()));
	let a = {
		let log = log.clone();

		throttle.submit(move || record_start(log, "a", origin))
	};

	tokio::time::sleep(Duration::from_millis(1_500)).await;

	let b = {
		let log = log.clone();

		throttle.submit(move || record_start(log, "b", origin))
	};

	assert_eq!(tokio::join!(a, b), ("a", "b"));
	assert_eq!(
		*log.lock().await,
		vec![("a", Duration::ZERO), ("b", Duration::from_millis(1_500))]
	);
}

#[tokio::test(start_paused = true)]
async fn queued_operation_starts_at_window_reset_without_being_awaited() {
	let throttle = build_throttle(1, 1_000);
	let origin = Instant::now();
	let log = Arc::new(Mutex::new(Vec::new()));
	let a = {
		let log = log.clone();

		throttle.submit(move || record_start(log, "a", origin))
	};
	let b = {
		let log = log.clone();

		throttle.submit(move || record_start(log, "b", origin))
	};

	tokio::time::sleep(Duration::from_millis(2_500)).await;

	assert_eq!(
		*log.lock().await,
		vec![("a", Duration::ZERO), ("b", Duration::from_millis(1_000))]
	);
	assert_eq!(tokio::join!(a, b), ("a", "b"));
	assert_eq!(origin.elapsed(), Duration::from_millis(2_500));
}

#[tokio::test(start_paused = true)]
async fn dropping_after_dispatch_lets_operation_finish() {
	let throttle = build_throttle(1, 1_000);
	let finished = Arc::new(AtomicU32::new(0));
	let detached = {
		let finished = finished.clone();

		throttle.submit(move || async move {
			tokio::time::sleep(Duration::from_millis(100)).await;
			finished.fetch_add(1, Ordering::SeqCst);
		})
	};

	drop(detached);
	tokio::time::sleep(Duration::from_millis(200)).await;

	assert_eq!(finished.load(Ordering::SeqCst), 1);
	assert_eq!(throttle.queued(), 0);
}

#[tokio::test(start_paused = true)]
async fn operation_panic_reaches_awaiting_task() {
	let throttle = build_throttle(1, 1_000);
	let handle = tokio::spawn(throttle.submit(|| async { panic!("operation blew up") }));
	let err = handle.await.expect_err("Panicking operation should fail its awaiting task.");

	assert!(err.is_panic());
}

#[test]
fn worker_lost_with_runtime_is_replaced() {
	let throttle = build_throttle(1, 50);
	let first = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.build()
		.expect("Failed to build first runtime.");
	let pending = first.block_on(async {
		drop(throttle.submit(|| async { 1 }));

		throttle.submit(|| async { 2 })
	});

	assert_eq!(throttle.queued(), 1);

	// Tears down the sleeping worker together with its runtime.
	drop(first);

	let second = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.build()
		.expect("Failed to build second runtime.");
	let value = second
		.block_on(async { tokio::time::timeout(Duration::from_secs(1), pending).await })
		.expect("Queued submission should be released by a replacement worker.");

	assert_eq!(value, 2);
	assert_eq!(throttle.queued(), 0);
}
