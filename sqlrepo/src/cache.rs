use std::{
	sync::Arc,
	time::{
		Duration,
		Instant,
	},
};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CacheError;

/// Key/value store backing [`crate::CachingRepository`]. Payloads are
/// serialized JSON.
#[async_trait]
pub trait CacheStore: Send + Sync {
	async fn has(&self, key: &str) -> Result<bool, CacheError>;

	async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

	async fn put(
		&self,
		key: &str,
		value: String,
		ttl: Duration,
	) -> Result<(), CacheError>;

	async fn forget(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<C: CacheStore + ?Sized> CacheStore for Arc<C> {
	async fn has(&self, key: &str) -> Result<bool, CacheError> {
		(**self).has(key).await
	}

	async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		(**self).get(key).await
	}

	async fn put(
		&self,
		key: &str,
		value: String,
		ttl: Duration,
	) -> Result<(), CacheError> {
		(**self).put(key, value, ttl).await
	}

	async fn forget(&self, key: &str) -> Result<(), CacheError> {
		(**self).forget(key).await
	}
}

/// Expiry used when `ttl` is too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

fn expiry(now: Instant, ttl: Duration) -> Instant {
	now.checked_add(ttl)
		.or_else(|| now.checked_add(FAR_FUTURE))
		.unwrap_or(now)
}

#[derive(Debug, Clone)]
struct Entry {
	value:   String,
	expires: Instant,
}

/// In-process store. Expired entries are dropped lazily on read.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
	entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn live(&self, key: &str) -> Option<String> {
		let now = Instant::now();
		let value = self
			.entries
			.get(key)
			.filter(|e| e.expires > now)
			.map(|e| e.value.clone());

		if value.is_none() {
			self.entries.remove_if(key, |_, e| e.expires <= now);
		}

		value
	}
}

#[async_trait]
impl CacheStore for MemoryCache {
	async fn has(&self, key: &str) -> Result<bool, CacheError> {
		Ok(self.live(key).is_some())
	}

	async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		Ok(self.live(key))
	}

	async fn put(
		&self,
		key: &str,
		value: String,
		ttl: Duration,
	) -> Result<(), CacheError> {
		self.entries.insert(key.to_owned(), Entry {
			value,
			expires: expiry(Instant::now(), ttl),
		});
		Ok(())
	}

	async fn forget(&self, key: &str) -> Result<(), CacheError> {
		self.entries.remove(key);
		Ok(())
	}
}
