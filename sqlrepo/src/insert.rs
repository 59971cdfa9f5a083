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
		InsertHead,
		SqlWriter,
	},
	Buildable,
	ExecutablePlan,
	FetchablePlan,
};

pub struct InsertQueryPlan<M: Entity> {
	pub(crate) table:  &'static str,
	pub(crate) values: Vec<(&'static str, Value)>,
	model:             PhantomData<fn() -> M>,
}

impl<M: Entity> InsertQueryPlan<M> {
	fn to_writer(&self, returning: bool) -> SqlWriter {
		let mut w = SqlWriter::new(InsertHead::new(self.table));

		if self.values.is_empty() {
			w.push(" DEFAULT VALUES");
		} else {
			w.push(" (");
			for (i, (column, _)) in self.values.iter().enumerate() {
				if i > 0 {
					w.push(", ");
				}
				w.push_ident(column);
			}
			w.push(") VALUES (");
			for (i, (_, value)) in self.values.iter().enumerate() {
				if i > 0 {
					w.push(", ");
				}
				w.bind(value);
			}
			w.push(")");
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
			"executing insert"
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
impl<M: Entity> ExecutablePlan for InsertQueryPlan<M> {
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
impl<M: Entity> FetchablePlan<M> for InsertQueryPlan<M> {
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

pub struct InsertQueryBuilder<M: Entity> {
	pub(crate) table:  &'static str,
	pub(crate) values: Vec<(&'static str, Value)>,
	model:             PhantomData<fn() -> M>,
}

impl<M: Entity> InsertQueryBuilder<M> {
	/// Takes every column of `model`. A null primary key is left to the
	/// database default.
	pub fn model(mut self, model: &M) -> Self {
		self.values = M::columns()
			.iter()
			.filter_map(|&column| {
				let value = model.attribute(column).unwrap_or_default();
				if column == M::PRIMARY_KEY && value.is_null() {
					None
				} else {
					Some((column, value))
				}
			})
			.collect();
		self
	}

	pub fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
		self.values.push((column, value.into()));
		self
	}
}

impl<M: Entity> Buildable<M> for InsertQueryBuilder<M> {
	type Plan = InsertQueryPlan<M>;

	fn from_ctx() -> Self {
		Self {
			table:  M::TABLE,
			values: Vec::new(),
			model:  PhantomData,
		}
	}

	fn build(self) -> Self::Plan {
		InsertQueryPlan {
			table:  self.table,
			values: self.values,
			model:  PhantomData,
		}
	}
}
