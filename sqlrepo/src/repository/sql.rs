use std::marker::PhantomData;

use async_trait::async_trait;
use sqlrepo_traits::{
	Entity,
	Value,
};
use sqlx::PgPool;

use crate::{
	blocks::{
		Page,
		Pagination,
		Predicate,
		SortOrder,
		WhereGroup,
	},
	criteria::FilterInput,
	cursor::{
		CursorRequest,
		CursorResult,
	},
	eager::{
		self,
		Loaded,
	},
	error::{
		Error,
		RepositoryOperation,
		Result,
	},
	Buildable,
	DeleteQueryBuilder,
	ExecutablePlan,
	FetchablePlan,
	InsertQueryBuilder,
	ReadQueryBuilder,
	Repository,
	UpdateQueryBuilder,
};

/// Repository running its statements on a postgres pool.
pub struct SqlRepository<M: Entity> {
	pool:  PgPool,
	model: PhantomData<fn() -> M>,
}

impl<M: Entity> Clone for SqlRepository<M> {
	fn clone(&self) -> Self {
		Self::new(self.pool.clone())
	}
}

impl<M: Entity> SqlRepository<M> {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool,
			model: PhantomData,
		}
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	/// Unfiltered read query over `M`, for anything the contract does not
	/// cover.
	pub fn query(&self) -> ReadQueryBuilder<M> {
		ReadQueryBuilder::from_ctx()
	}

	fn base(
		&self,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<ReadQueryBuilder<M>> {
		let mut q = self.query();

		if let Some(criteria) = criteria {
			q = q.filter(criteria)?;
		}

		if let Some(sort) = sort {
			q = q.order_by(sort.clone());
		}

		Ok(q)
	}

	fn store(op: RepositoryOperation) -> impl FnOnce(sqlx::Error) -> Error {
		move |e| Error::store(M::NAME, op, e)
	}

	/// Rejects empty ids and ids whose type differs from the key type.
	fn check_id(id: &Value) -> Result<Value> {
		if id.is_empty() {
			return Err(Error::repository(
				M::NAME,
				RepositoryOperation::FindById,
				"Provided id can not be empty.",
			));
		}

		M::KEY_KIND.accept(id).ok_or_else(|| {
			Error::repository(
				M::NAME,
				RepositoryOperation::FindById,
				"Provided id type does not match model primary key type.",
			)
		})
	}

	fn by_key(key: Value) -> WhereGroup {
		WhereGroup::new().and(Predicate::compare(M::PRIMARY_KEY, "=", key))
	}
}

#[async_trait]
impl<M: Entity> Repository<M> for SqlRepository<M> {
	async fn find_or_fail(&self, id: Value) -> Result<M> {
		let key = Self::check_id(&id)?;

		self.query()
			.r#where(Self::by_key(key))
			.build()
			.fetch_optional(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::FindById))?
			.ok_or_else(|| Error::not_found(M::NAME, &id))
	}

	async fn find_where(
		&self,
		criteria: &FilterInput,
		sort: Option<&SortOrder>,
	) -> Result<Option<M>> {
		self.base(Some(criteria), sort)?
			.paginate(Pagination {
				page:      0,
				page_size: 1,
			})
			.build()
			.fetch_optional(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::FindWhere))
	}

	async fn create(&self, entity: &M) -> Result<M> {
		InsertQueryBuilder::<M>::from_ctx()
			.model(entity)
			.build()
			.fetch_optional(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Create))?
			.ok_or_else(|| {
				Error::repository(
					M::NAME,
					RepositoryOperation::Create,
					format!("Cannot create {} record", M::NAME),
				)
			})
	}

	async fn save(&self, entity: &M) -> Result<M> {
		let cannot = || {
			Error::repository(
				M::NAME,
				RepositoryOperation::Update,
				format!("Cannot update {} record", M::NAME),
			)
		};

		if entity.key().is_null() {
			return Err(cannot());
		}

		UpdateQueryBuilder::<M>::from_ctx()
			.model(entity)
			.build()
			.fetch_optional(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Update))?
			.ok_or_else(cannot)
	}

	async fn delete(&self, entity: &M) -> Result<()> {
		let cannot = || {
			Error::repository(
				M::NAME,
				RepositoryOperation::Delete,
				format!("Cannot delete {} record", M::NAME),
			)
		};

		if entity.key().is_null() {
			return Err(cannot());
		}

		let rows = DeleteQueryBuilder::<M>::from_ctx()
			.model(entity)
			.build()
			.execute(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Delete))?;

		if rows == 0 {
			return Err(cannot());
		}

		Ok(())
	}

	async fn get(
		&self,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<M>> {
		self.base(criteria, sort)?
			.build()
			.fetch_all(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Get))
	}

	async fn get_page(
		&self,
		paging: Pagination,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Page<M>> {
		if paging.page < 0 || paging.page_size <= 0 {
			return Err(Error::InvalidPaging(format!(
				"page {} of size {} is out of range",
				paging.page, paging.page_size
			)));
		}

		self.base(criteria, sort)?
			.paginate(paging)
			.build()
			.fetch_page(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Page))
	}

	async fn get_cursor_page(
		&self,
		cursor: CursorRequest,
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<CursorResult<M>> {
		if cursor.page_size <= 0 {
			return Err(Error::InvalidPaging(format!(
				"cursor page size must be positive, got {}",
				cursor.page_size
			)));
		}

		self.base(criteria, sort)?
			.build()
			.cursor(cursor)
			.fetch(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::CursorPage))
	}

	async fn count(&self, criteria: Option<&FilterInput>) -> Result<i64> {
		self.base(criteria, None)?
			.build()
			.count(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::Count))
	}

	async fn get_with(
		&self,
		with: &[String],
		with_counts: &[String],
		criteria: Option<&FilterInput>,
		sort: Option<&SortOrder>,
	) -> Result<Vec<Loaded<M>>> {
		let columns = eager::columns::<M>(with, with_counts)?;
		let plan = columns
			.into_iter()
			.fold(self.base(criteria, sort)?, |q, c| q.select(c))
			.build();

		let rows = plan
			.fetch_rows(&self.pool)
			.await
			.map_err(Self::store(RepositoryOperation::GetWith))?;

		rows.iter()
			.map(|row| eager::decode::<M>(row, with, with_counts))
			.collect::<Result<Vec<_>, sqlx::Error>>()
			.map_err(Self::store(RepositoryOperation::GetWith))
	}
}
