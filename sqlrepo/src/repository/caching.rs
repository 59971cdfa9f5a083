use std::{
	future::Future,
	marker::PhantomData,
	time::Duration,
};

use async_trait::async_trait;
use serde::{
	de::DeserializeOwned,
	Serialize,
};
use sqlrepo_traits::{
	Entity,
	Value,
};
use uuid::Uuid;

use crate::{
	blocks::{
		Page,
		Pagination,
		SortOrder,
	},
	cache::CacheStore,
	config::CacheConfig,
	criteria::FilterInput,
	cursor::{
		CursorRequest,
		CursorResult,
	},
	eager::Loaded,
	error::Result,
	Repository,
};

/// Read-through cache in front of another repository.
///
/// Single records live under `<prefix>:<id>`. Every other read is keyed by
/// `<prefix>:<generation>:<operation>:<hash of arguments>`, so rotating the
/// generation stored at `<prefix>:generation` drops all of them at once.
/// Misses and empty results are never stored, and a failing store only
/// costs a trip to the wrapped repository.
pub struct CachingRepository<M, R, C> {
	inner:  R,
	cache:  C,
	prefix: String,
	ttl:    Duration,
	model:  PhantomData<fn() -> M>,
}

impl<M, R, C> CachingRepository<M, R, C>
where
	M: Entity + Serialize + DeserializeOwned,
	R: Repository<M>,
	C: CacheStore,
{
	pub fn new(inner: R, cache: C, config: &CacheConfig) -> Self {
		Self {
			inner,
			cache,
			prefix: config
				.prefix
				.clone()
				.unwrap_or_else(|| M::TABLE.to_owned()),
			ttl: Duration::from_secs(config.ttl_secs),
			model: PhantomData,
		}
	}

	pub fn inner(&self) -> &R {
		&self.inner
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Key of a single record. The id is normalized to the key type first,
	/// so `find_or_fail` and the eviction after a write agree on it.
	pub fn record_key(&self, id: &Value) -> String {
		let id = M::KEY_KIND.accept(id).unwrap_or_else(|| id.clone());
		format!("{}:{}", self.prefix, id)
	}

	fn generation_key(&self) -> String {
		format!("{}:generation", self.prefix)
	}

	async fn generation(&self) -> Result<String> {
		let key = self.generation_key();
		if let Some(generation) = self.cache.get(&key).await? {
			return Ok(generation);
		}

		let generation = Uuid::new_v4().simple().to_string();
		self.cache.put(&key, generation.clone(), self.ttl).await?;

		Ok(generation)
	}

	/// Invalidates every cached list, page, count and lookup.
	pub async fn rotate_generation(&self) -> Result<()> {
		let generation = Uuid::new_v4().simple().to_string();
		self.cache
			.put(&self.generation_key(), generation, self.ttl)
			.await?;
		tracing::debug!(prefix = %self.prefix, "generation rotated");

		Ok(())
	}

	async fn invalidate(&self, written: Option<&M>) {
		if let Some(entity) = written {
			let key = self.record_key(&entity.key());
			if let Err(e) = self.cache.forget(&key).await {
				tracing::warn!(error = %e, "cache eviction failed");
			}
		}

		if let Err(e) = self.rotate_generation().await {
			tracing::warn!(error = %e, "generation rotation failed");
		}
	}

	async fn list_key<A>(&self, operation: &str, args: &A) -> Result<String>
	where
		A: Serialize + Sync + ?Sized,
	{
		let generation = self.generation().await?;
		let payload = serde_json::to_vec(args)?;

		Ok(format!(
			"{}:{}:{}:{}",
			self.prefix,
			generation,
			operation,
			blake3::hash(&payload).to_hex()
		))
	}

	async fn remember<T, F, Fut>(
		&self,
		key: Result<String>,
		keep: fn(&T) -> bool,
		load: F,
	) -> Result<T>
	where
		T: Serialize + DeserializeOwned + Send + Sync,
		F: FnOnce() -> Fut + Send,
		Fut: Future<Output = Result<T>> + Send,
	{
		let key = match key {
			Ok(key) => Some(key),
			Err(e) => {
				tracing::warn!(error = %e, "cache key unavailable");
				None
			}
		};
		let Some(key) = key else {
			return load().await;
		};

		match self.lookup::<T>(&key).await {
			Ok(Some(value)) => {
				tracing::trace!(key = %key, "cache hit");
				return Ok(value);
			}
			Ok(None) => tracing::trace!(key = %key, "cache miss"),
			Err(e) => tracing::warn!(error = %e, "cache read failed"),
		}

		let value = load().await?;
		if keep(&value) {
			if let Err(e) = self.store(&key, &value).await {
				tracing::warn!(error = %e, "cache write failed");
			}
		}

		Ok(value)
	}

	async fn lookup<T>(&self, key: &str) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		match self.cache.get(key).await? {
			Some(json) => Ok(Some(serde_json::from_str(&json)?)),
			None => Ok(None),
		}
	}

	async fn store<T>(&self, key: &str, value: &T) -> Result<()>
	where
		T: Serialize + Sync,
	{
		let json = serde_json::to_string(value)?;
		self.cache.put(key, json, self.ttl).await?;

		Ok(())
	}
}

fn always<T>(_: &T) -> bool {
	true
}

#[async_trait]
impl<M, R, C> Repository<M> for CachingRepository<M, R, C>
where
	M: Entity + Serialize + DeserializeOwned,
	R: Repository<M>,
	C: CacheStore,
{
	fn entity_name(&self) -> &'static str {
		self.inner.entity_name()
	}

	async fn find_or_fail(&self, id: Value) -> Result<M> {
		let key = self.record_key(&id);
		self.remember(Ok(key), always, || self.inner.find_or_fail(id))
			.await
	}

	async fn find_where(
		&self,
		criteria: &FilterInput,
		sort: Option<&SortOrder>,
	) -> Result<Option<M>> {
		let key = self.list_key("find_where", &(criteria, sort)).await;
		self.remember(key, Option::is_some, || {
			self.inner.find_where(criteria, sort)
		})
		.await
	}

	async fn create(&self, entity: &M) -> Result<M> {
		let created = self.inner.create(entity).await?;
		self.invalidate(None).await;

		Ok(created)
	}

	async fn save(&self, entity: &M) -> Result<M> {
		let saved = self.inner.save(entity).await?;
		self.invalidate(Some(&saved)).await;

		Ok(saved)
	}

	async fn delete(&self, entity: &M) -> Result<()> {
		self.inner.delete(entity).await?;
		self.invalidate(Some(entity)).await;

		Ok(())
	}

	async fn get(
		&self,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<M>> {
		let key = self.list_key("get", &(criteria, sort)).await;
		self.remember(key, always, || self.inner.get(criteria, sort))
			.await
	}

	async fn get_page(
		&self,
		paging: Pagination,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Page<M>> {
		let key = self.list_key("page", &(paging, criteria, sort)).await;
		self.remember(key, always, || {
			self.inner.get_page(paging, criteria, sort)
		})
		.await
	}

	async fn get_cursor_page(
		&self,
		cursor: CursorRequest,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<CursorResult<M>> {
		let key = self.list_key("cursor", &(cursor, criteria, sort)).await;
		self.remember(key, always, || {
			self.inner.get_cursor_page(cursor, criteria, sort)
		})
		.await
	}

	async fn count(&self, criteria: Option<&FilterInput>) -> Result<i64> {
		let key = self.list_key("count", &criteria).await;
		self.remember(key, always, || self.inner.count(criteria))
			.await
	}

	async fn get_with(
		&self,
		with: &[String],
		with_counts: &[String],
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<Loaded<M>>> {
		let key = self
			.list_key("get_with", &(with, with_counts, criteria, sort))
			.await;
		self.remember(key, always, || {
			self.inner.get_with(with, with_counts, criteria, sort)
		})
		.await
	}
}
