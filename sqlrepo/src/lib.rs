#![forbid(unsafe_code)]
extern crate self as sqlrepo;

pub use smallvec;
pub use sqlrepo_traits::*;

pub mod prelude {
	pub use super::{
		criteria::{
			Boolean,
			Criterion,
			FilterEntry,
			FilterInput,
			RelationCriterion,
		},
		Entity,
		Repository,
		Value,
	};
}

pub mod blocks;
pub mod cache;
pub mod config;
pub mod criteria;
pub mod cursor;
pub mod database;
pub mod eager;
pub mod error;
pub mod join;
pub mod repository;

mod delete;
mod insert;
mod read;
mod update;

pub use cursor::{
	CursorPlan,
	CursorRequest,
	CursorResult,
};
pub use delete::{
	DeleteQueryBuilder,
	DeleteQueryPlan,
};
pub use eager::Loaded;
pub use error::{
	Error,
	RepositoryOperation,
	Result,
};
pub use insert::{
	InsertQueryBuilder,
	InsertQueryPlan,
};
pub use read::{
	ReadQueryBuilder,
	ReadQueryPlan,
};
pub use repository::{
	CachingRepository,
	Repository,
	RepositoryRegistry,
	SqlRepository,
};
use sqlx::{
	Executor,
	Postgres,
};
pub use update::{
	UpdateQueryBuilder,
	UpdateQueryPlan,
};

pub struct QueryBuilder<M> {
	_phantom: std::marker::PhantomData<M>,
}

impl<M> QueryBuilder<M>
where
	M: Entity,
{
	pub fn read() -> ReadQueryBuilder<M> {
		ReadQueryBuilder::from_ctx()
	}

	pub fn delete() -> DeleteQueryBuilder<M> {
		DeleteQueryBuilder::from_ctx()
	}

	pub fn update() -> UpdateQueryBuilder<M> {
		UpdateQueryBuilder::from_ctx()
	}

	pub fn insert() -> InsertQueryBuilder<M> {
		InsertQueryBuilder::from_ctx()
	}
}

#[async_trait::async_trait]
pub trait ExecutablePlan {
	async fn execute<'e, E>(&self, exec: E) -> Result<u64, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>;
}

#[async_trait::async_trait]
pub trait FetchablePlan<Row> {
	async fn fetch_one<'e, E>(&self, exec: E) -> Result<Row, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>;

	async fn fetch_all<'e, E>(&self, exec: E) -> Result<Vec<Row>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>;

	async fn fetch_optional<'e, E>(
		&self,
		exec: E,
	) -> Result<Option<Row>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>;
}

pub trait Buildable<M: Entity> {
	type Plan;

	fn from_ctx() -> Self;
	fn build(self) -> Self::Plan;
}
