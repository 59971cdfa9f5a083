//! Uniform data-access contract over one entity type.

use async_trait::async_trait;
use sqlrepo_traits::{
	Entity,
	Value,
};

use crate::{
	blocks::{
		Page,
		Pagination,
		SortOrder,
	},
	criteria::FilterInput,
	cursor::{
		CursorRequest,
		CursorResult,
	},
	eager::Loaded,
	error::Result,
};

mod caching;
mod registry;
mod sql;

pub use caching::CachingRepository;
pub use registry::{
	RepositoryRegistry,
	RepositoryRegistryBuilder,
};
pub use sql::SqlRepository;

#[async_trait]
pub trait Repository<M: Entity>: Send + Sync {
	fn entity_name(&self) -> &'static str {
		M::NAME
	}

	/// Fails with [`crate::Error::NotFound`] when no row has key `id`.
	async fn find_or_fail(&self, id: Value) -> Result<M>;

	/// First row matching `criteria`.
	async fn find_where(
		&self,
		criteria: &FilterInput,
		sort: Option<&SortOrder>,
	) -> Result<Option<M>>;

	async fn create(&self, entity: &M) -> Result<M>;

	async fn save(&self, entity: &M) -> Result<M>;

	async fn delete(&self, entity: &M) -> Result<()>;

	async fn get(
		&self,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<M>>;

	async fn get_page(
		&self,
		paging: Pagination,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Page<M>>;

	/// Rows are numbered in `sort` order, or by primary key without one.
	async fn get_cursor_page(
		&self,
		cursor: CursorRequest,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<CursorResult<M>>;

	async fn count(&self, criteria: Option<&FilterInput>) -> Result<i64>;

	/// Rows with the relations in `with` loaded and the relations in
	/// `with_counts` counted.
	async fn get_with(
		&self,
		with: &[String],
		with_counts: &[String],
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<Loaded<M>>>;
}
