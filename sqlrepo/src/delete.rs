use std::marker::PhantomData;

use sqlrepo_traits::{
	Entity,
	SqlWrite,
	Value,
};
use sqlx::{
	Executor,
	Postgres,
};

use crate::{
	blocks::{
		DeleteHead,
		Predicate,
		SqlWriter,
		WhereGroup,
	},
	Buildable,
	ExecutablePlan,
	FetchablePlan,
};

pub struct DeleteQueryPlan<M: Entity> {
	pub(crate) where_expr: Option<WhereGroup>,
	pub(crate) table:      &'static str,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> DeleteQueryPlan<M> {
	fn to_writer(&self, returning: bool) -> SqlWriter {
		let mut w = SqlWriter::new(DeleteHead::new(self.table));

		if let Some(e) = &self.where_expr {
			w.push_where(e);
		}

		if returning {
			w.push(" RETURNING *");
		}

		w
	}

	fn prepared(
		&self,
		returning: bool,
	) -> sqlx::QueryBuilder<'static, Postgres> {
		let w = self.to_writer(returning);
		tracing::debug!(
			entity = M::NAME,
			sql = w.sql(),
			params = w.params().len(),
			"executing delete"
		);
		w.into_builder()
	}

	pub fn sql(&self) -> String {
		self.to_writer(false).sql().to_owned()
	}

	pub fn params(&self) -> Vec<Value> {
		self.to_writer(false).params().to_vec()
	}
}

#[async_trait::async_trait]
impl<M: Entity> ExecutablePlan for DeleteQueryPlan<M> {
	async fn execute<'e, E>(&self, exec: E) -> Result<u64, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let rows = self
			.prepared(false)
			.build()
			.execute(exec)
			.await?
			.rows_affected();

		Ok(rows)
	}
}

#[async_trait::async_trait]
impl<M: Entity> FetchablePlan<M> for DeleteQueryPlan<M> {
	async fn fetch_one<'e, E>(&self, exec: E) -> Result<M, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		self.prepared(true)
			.build_query_as::<M>()
			.fetch_one(exec)
			.await
	}

	async fn fetch_all<'e, E>(&self, exec: E) -> Result<Vec<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		self.prepared(true)
			.build_query_as::<M>()
			.fetch_all(exec)
			.await
	}

	async fn fetch_optional<'e, E>(
		&self,
		exec: E,
	) -> Result<Option<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		self.prepared(true)
			.build_query_as::<M>()
			.fetch_optional(exec)
			.await
	}
}

pub struct DeleteQueryBuilder<M: Entity> {
	pub(crate) table:      &'static str,
	pub(crate) where_expr: Option<WhereGroup>,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> DeleteQueryBuilder<M> {
	/// Targets the row of `model` by primary key.
	pub fn model(self, model: &M) -> Self {
		self.r#where(
			WhereGroup::new().and(Predicate::compare(
				M::PRIMARY_KEY,
				"=",
				model.key(),
			)),
		)
	}

	pub fn r#where(mut self, e: WhereGroup) -> Self {
		match self.where_expr {
			Some(existing) => self.where_expr = Some(existing.and_group(e)),
			None => self.where_expr = Some(e),
		};

		self
	}
}

impl<M: Entity> Buildable<M> for DeleteQueryBuilder<M> {
	type Plan = DeleteQueryPlan<M>;

	fn from_ctx() -> Self {
		Self {
			table:      M::TABLE,
			where_expr: None,
			model:      PhantomData,
		}
	}

	fn build(self) -> Self::Plan {
		DeleteQueryPlan {
			where_expr: self.where_expr,
			table:      self.table,
			model:      PhantomData,
		}
	}
}
