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
		Predicate,
		SqlWriter,
		UpdateHead,
		WhereGroup,
	},
	Buildable,
	ExecutablePlan,
	FetchablePlan,
};

pub struct UpdateQueryPlan<M: Entity> {
	pub(crate) table:      &'static str,
	pub(crate) values:     Vec<(&'static str, Value)>,
	pub(crate) where_expr: Option<WhereGroup>,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> UpdateQueryPlan<M> {
	fn to_writer(&self, returning: bool) -> SqlWriter {
		let mut w = SqlWriter::new(UpdateHead::new(self.table));

		for (i, (column, value)) in self.values.iter().enumerate() {
			if i > 0 {
				w.push(", ");
			}
			w.push_ident(column);
			w.push(" = ");
			w.bind(value);
		}

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
			"executing update"
		);
		w.into_builder()
	}

	pub fn sql(&self) -> String {
		self.to_writer(true).sql().to_owned()
	}

	pub fn params(&self) -> Vec<Value> {
		self.to_writer(true).params().to_vec()
	}
}

#[async_trait::async_trait]
impl<M: Entity> ExecutablePlan for UpdateQueryPlan<M> {
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
impl<M: Entity> FetchablePlan<M> for UpdateQueryPlan<M> {
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

pub struct UpdateQueryBuilder<M: Entity> {
	pub(crate) table:      &'static str,
	pub(crate) values:     Vec<(&'static str, Value)>,
	pub(crate) where_expr: Option<WhereGroup>,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> UpdateQueryBuilder<M> {
	/// Sets every non-key column of `model` and targets its row.
	pub fn model(mut self, model: &M) -> Self {
		self.values = M::columns()
			.iter()
			.filter(|&&column| column != M::PRIMARY_KEY)
			.map(|&column| (column, model.attribute(column).unwrap_or_default()))
			.collect();

		self.r#where(
			WhereGroup::new().and(Predicate::compare(
				M::PRIMARY_KEY,
				"=",
				model.key(),
			)),
		)
	}

	pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
		self.values.push((column, value.into()));
		self
	}

	pub fn r#where(mut self, e: WhereGroup) -> Self {
		match self.where_expr {
			Some(existing) => self.where_expr = Some(existing.and_group(e)),
			None => self.where_expr = Some(e),
		};

		self
	}
}

impl<M: Entity> Buildable<M> for UpdateQueryBuilder<M> {
	type Plan = UpdateQueryPlan<M>;

	fn from_ctx() -> Self {
		Self {
			table:      M::TABLE,
			values:     Vec::new(),
			where_expr: None,
			model:      PhantomData,
		}
	}

	fn build(self) -> Self::Plan {
		UpdateQueryPlan {
			table:      self.table,
			values:     self.values,
			where_expr: self.where_expr,
			model:      PhantomData,
		}
	}
}
