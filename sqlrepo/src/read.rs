use std::marker::PhantomData;

use sqlrepo_traits::{
	Entity,
	Value,
};
use sqlx::{
	postgres::PgRow,
	Executor,
	Postgres,
};

use crate::{
	blocks::{
		Page,
		Pagination,
		ReadHead,
		SelectType,
		SortOrder,
		SqlFragment,
		SqlWriter,
		WhereGroup,
	},
	criteria::{
		CriteriaCompiler,
		FilterInput,
	},
	error::Result,
	join::RelationJoins,
	order_by,
	Buildable,
	FetchablePlan,
};

pub struct ReadQueryPlan<M: Entity> {
	pub(crate) table:      &'static str,
	pub(crate) joins:      RelationJoins,
	pub(crate) where_expr: Option<WhereGroup>,
	pub(crate) sort_expr:  Option<SortOrder>,
	pub(crate) pagination: Option<Pagination>,
	pub(crate) extra:      Vec<SqlFragment>,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> ReadQueryPlan<M> {
	/// Everything but `LIMIT`/`OFFSET`. Counts carry no `ORDER BY`, an
	/// aggregate without `GROUP BY` cannot be sorted by a plain column.
	pub(crate) fn write_base(&self, w: &mut SqlWriter, select: SelectType) {
		let counting = select == SelectType::Count;
		let head = ReadHead::new(self.table, select).with_extra(&self.extra);
		crate::blocks::WriteHead::write_head(&head, w);

		w.push_joins(self.joins.clauses());

		if let Some(e) = &self.where_expr {
			w.push_where(e);
		}

		if counting {
			return;
		}

		if let Some(s) = &self.sort_expr {
			w.push_sort(s);
		}
	}

	pub fn is_sorted(&self) -> bool {
		self.sort_expr.as_ref().is_some_and(|s| !s.is_empty())
	}

	fn to_writer(&self, select: SelectType) -> SqlWriter {
		let mut w = SqlWriter::empty();
		self.write_base(&mut w, select.clone());

		if select != SelectType::Count {
			if let Some(p) = &self.pagination {
				w.push_pagination(p);
			}
		}

		w
	}

	fn log(w: &SqlWriter, operation: &str) {
		tracing::debug!(
			entity = M::NAME,
			operation,
			sql = w.sql(),
			params = w.params().len(),
			"executing read"
		);
	}

	pub(crate) async fn fetch_rows<'e, E>(
		&self,
		exec: E,
	) -> Result<Vec<PgRow>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer(SelectType::Star);
		Self::log(&w, "fetch_rows");

		w.into_builder().build().fetch_all(exec).await
	}

	/// One page plus the total row count. A page past the end carries no
	/// window count, so the total is queried separately.
	pub async fn fetch_page<'e, E>(
		&self,
		exec: E,
	) -> Result<Page<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres> + Copy,
	{
		#[derive(sqlx::FromRow)]
		struct RowWithCount<M> {
			#[sqlx(flatten)]
			model:       M,
			total_count: i64,
		}

		let w = self.to_writer(SelectType::StarAndCount);
		Self::log(&w, "fetch_page");

		let rows: Vec<RowWithCount<M>> = w
			.into_builder()
			.build_query_as::<RowWithCount<M>>()
			.fetch_all(exec)
			.await?;

		let pagination = self.pagination.unwrap_or_default();

		let Some(first) = rows.first() else {
			let total = if pagination.page > 0 {
				self.count(exec).await?
			} else {
				0
			};
			return Ok(Page::new(vec![], pagination, total));
		};

		let total = first.total_count;
		let items = rows.into_iter().map(|r| r.model).collect();

		Ok(Page::new(items, pagination, total))
	}

	pub async fn count<'e, E>(&self, exec: E) -> Result<i64, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer(SelectType::Count);
		Self::log(&w, "count");

		w.into_builder()
			.build_query_scalar::<i64>()
			.fetch_one(exec)
			.await
	}

	pub fn sql(&self, select: SelectType) -> String {
		self.to_writer(select).sql().to_owned()
	}

	pub fn params(&self, select: SelectType) -> Vec<Value> {
		self.to_writer(select).params().to_vec()
	}
}

#[async_trait::async_trait]
impl<M: Entity> FetchablePlan<M> for ReadQueryPlan<M> {
	async fn fetch_one<'e, E>(&self, exec: E) -> Result<M, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer(SelectType::Star);
		Self::log(&w, "fetch_one");

		w.into_builder().build_query_as::<M>().fetch_one(exec).await
	}

	async fn fetch_all<'e, E>(&self, exec: E) -> Result<Vec<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer(SelectType::Star);
		Self::log(&w, "fetch_all");

		w.into_builder().build_query_as::<M>().fetch_all(exec).await
	}

	async fn fetch_optional<'e, E>(
		&self,
		exec: E,
	) -> Result<Option<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer(SelectType::Star);
		Self::log(&w, "fetch_optional");

		w.into_builder()
			.build_query_as::<M>()
			.fetch_optional(exec)
			.await
	}
}

pub struct ReadQueryBuilder<M: Entity> {
	pub(crate) table:      &'static str,
	pub(crate) joins:      RelationJoins,
	pub(crate) where_expr: Option<WhereGroup>,
	pub(crate) sort_expr:  Option<SortOrder>,
	pub(crate) pagination: Option<Pagination>,
	pub(crate) extra:      Vec<SqlFragment>,
	model:                 PhantomData<fn() -> M>,
}

impl<M: Entity> Buildable<M> for ReadQueryBuilder<M> {
	type Plan = ReadQueryPlan<M>;

	fn from_ctx() -> Self {
		Self {
			table:      M::TABLE,
			joins:      RelationJoins::new::<M>(),
			where_expr: None,
			sort_expr:  None,
			pagination: None,
			extra:      Vec::new(),
			model:      PhantomData,
		}
	}

	fn build(self) -> Self::Plan {
		ReadQueryPlan {
			table:      self.table,
			joins:      self.joins,
			where_expr: self.where_expr,
			sort_expr:  self.sort_expr,
			pagination: self.pagination,
			extra:      self.extra,
			model:      PhantomData,
		}
	}
}

impl<M: Entity> ReadQueryBuilder<M> {
	/// Adds a compiled predicate, `AND`ed with any existing one.
	pub fn r#where(mut self, e: WhereGroup) -> Self {
		match self.where_expr {
			Some(existing) => self.where_expr = Some(existing.and_group(e)),
			None => self.where_expr = Some(e),
		};

		self
	}

	/// Compiles `input` against `M` and adds it as a predicate.
	pub fn filter(self, input: &FilterInput) -> Result<Self> {
		let group = CriteriaCompiler::for_entity::<M>().compile(input)?;
		Ok(self.r#where(group))
	}

	/// Joins the relations along a dotted path like `profile.phones`.
	pub fn join_relation(mut self, path: &str) -> Result<Self> {
		self.joins.join(path)?;
		Ok(self)
	}

	pub fn order_by(mut self, s: impl Into<SortOrder>) -> Self {
		let s = s.into();
		match self.sort_expr {
			Some(existing) => self.sort_expr = Some(order_by![existing, s]),
			None => self.sort_expr = Some(s),
		}

		self
	}

	pub fn paginate(mut self, p: Pagination) -> Self {
		self.pagination = Some(p);
		self
	}

	/// Adds a computed column after `"table".*`.
	pub fn select(mut self, column: SqlFragment) -> Self {
		self.extra.push(column);
		self
	}
}
