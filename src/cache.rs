//! In-process TTL cache with lazy expiry.
//!
//! Entries are never swept in the background: a reader that finds a stale entry evicts it, and
//! [`TtlCache::get_or_fetch`] replaces it with a freshly produced value.

// self
use crate::{
	_prelude::*,
	clock::TokioClock,
	error::ConfigError,
	obs::{self, Component, ComponentSpan, Outcome},
};

type EntryMap<V> = Arc<Mutex<HashMap<String, CacheEntry<V>>>>;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
	value: V,
	expires_at: Instant,
}
impl<V> CacheEntry<V> {
	fn is_fresh_at(&self, now: Instant) -> bool {
		self.expires_at > now
	}
}

/// String-keyed cache whose entries expire a fixed duration after they were written.
///
/// Clones share the same entries. Concurrent [`TtlCache::get_or_fetch`] calls for one missing
/// or stale key each run their own producer; there is no in-flight deduplication, and the last
/// producer to finish wins.
#[derive(Clone)]
pub struct TtlCache<V> {
	entries: EntryMap<V>,
	clock: Arc<dyn Clock>,
	default_ttl: Duration,
}
impl<V> TtlCache<V>
where
	V: Clone,
{
	/// TTL applied when none is configured.
	pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

	/// Creates a cache using [`TtlCache::DEFAULT_TTL`] and [`TokioClock`].
	pub fn new() -> Self {
		Self {
			entries: Default::default(),
			clock: Arc::new(TokioClock),
			default_ttl: Self::DEFAULT_TTL,
		}
	}

	/// Creates a cache whose entries live for `default_ttl` unless overridden per call.
	pub fn with_default_ttl(default_ttl: Duration) -> Result<Self, ConfigError> {
		if default_ttl.is_zero() {
			return Err(ConfigError::ZeroTtl);
		}

		Ok(Self { default_ttl, ..Self::new() })
	}

	/// Replaces the clock used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// TTL applied by [`TtlCache::set`] and [`TtlCache::get_or_fetch`].
	pub fn default_ttl(&self) -> Duration {
		self.default_ttl
	}

	/// Stores `value` under `key` for the default TTL, replacing any existing entry.
	pub fn set(&self, key: impl Into<String>, value: V) {
		self.set_with_ttl(key, value, self.default_ttl);
	}

	/// Stores `value` under `key` for `ttl`, replacing any existing entry.
	pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
		let expires_at = self.clock.now() + ttl;

		self.entries.lock().insert(key.into(), CacheEntry { value, expires_at });
	}

	/// Returns the value under `key` if it is still fresh, evicting it when it is stale.
	pub fn get(&self, key: &str) -> Option<V> {
		let now = self.clock.now();
		let mut entries = self.entries.lock();
		let (value, stale) = match entries.get(key) {
			Some(entry) if entry.is_fresh_at(now) => (Some(entry.value.clone()), false),
			Some(_) => (None, true),
			None => (None, false),
		};

		if stale {
			entries.remove(key);
		}

		drop(entries);

		if value.is_some() {
			obs::record_outcome(Component::Cache, Outcome::Hit);
		} else {
			obs::cache_miss(key, stale);
			obs::record_outcome(Component::Cache, Outcome::Miss);
		}

		value
	}

	/// Returns the fresh value under `key`, or awaits `producer` and caches its output for the
	/// default TTL.
	pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		self.get_or_fetch_with_ttl(key, producer, self.default_ttl).await
	}

	/// Returns the fresh value under `key`, or awaits `producer` and caches its output for
	/// `ttl`.
	///
	/// A failing producer leaves the cache untouched and its error is returned as is.
	pub async fn get_or_fetch_with_ttl<F, Fut, E>(
		&self,
		key: &str,
		producer: F,
		ttl: Duration,
	) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		if let Some(value) = self.get(key) {
			return Ok(value);
		}

		let value =
			ComponentSpan::new(Component::Cache, "get_or_fetch").instrument(producer()).await?;

		self.set_with_ttl(key, value.clone(), ttl);

		Ok(value)
	}

	/// Drops the entry under `key`, returning its value if it was still fresh.
	pub fn remove(&self, key: &str) -> Option<V> {
		let now = self.clock.now();

		self.entries
			.lock()
			.remove(key)
			.filter(|entry| entry.is_fresh_at(now))
			.map(|entry| entry.value)
	}

	/// Removes every entry.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	/// Number of entries held, including stale ones no reader has observed yet.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
impl<V> Default for TtlCache<V>
where
	V: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<V> Debug for TtlCache<V> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TtlCache")
			.field("entries", &self.entries.lock().len())
			.field("default_ttl", &self.default_ttl)
			.finish()
	}
}
