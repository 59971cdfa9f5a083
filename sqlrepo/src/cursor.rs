//! Cursor pagination over arbitrary read queries.
//!
//! The base query is wrapped so every output row gets a sequence number
//! in the base query's final order:
//!
//! ```sql
//! SELECT * FROM (
//!     SELECT "t1".*, ROW_NUMBER() OVER () AS "row_num"
//!     FROM (<base query without LIMIT/OFFSET>) AS "t1"
//! ) AS "<table>"
//! WHERE "row_num" > $n ORDER BY "row_num" LIMIT $m
//! ```
//!
//! Numbering happens inside the derived table, so the cursor filter on the
//! outer query only ever sees finished numbers. The base query's filter
//! and binds are written once, inside. An unsorted base query is ordered by
//! the primary key so page boundaries hold between calls.

use serde::{
	Deserialize,
	Serialize,
};
use sqlrepo_traits::{
	Entity,
	SqlWrite,
	Value,
};
use sqlx::{
	Executor,
	FromRow,
	Postgres,
	Row,
};

use crate::{
	blocks::{
		SelectType,
		SortOptions,
		SortOrder,
		SqlWriter,
	},
	error::{
		Error,
		Result,
	},
	ReadQueryPlan,
};

pub const ROW_NUM_COLUMN: &str = "row_num";

/// Position after the last seen row; 0 starts from the beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorRequest {
	pub current:   i64,
	pub page_size: i64,
}

impl CursorRequest {
	pub fn new(current: i64, page_size: i64) -> Result<Self> {
		if page_size <= 0 {
			return Err(Error::InvalidPaging(format!(
				"cursor page size must be positive, got {page_size}"
			)));
		}

		Ok(Self { current, page_size })
	}

	pub fn start(page_size: i64) -> Result<Self> {
		Self::new(0, page_size)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorResult<T> {
	pub items:     Vec<T>,
	pub current:   i64,
	/// Sequence number of the last row, or `current` for an empty page.
	pub next:      i64,
	pub page_size: i64,
	/// The page came back full, so another request may return rows.
	pub has_more:  bool,
}

impl<T> CursorResult<T> {
	/// `rows` pairs each item with its sequence number.
	pub fn new(request: CursorRequest, rows: Vec<(i64, T)>) -> Self {
		let next = rows.last().map_or(request.current, |(n, _)| *n);
		let has_more = rows.len() as i64 >= request.page_size;

		Self {
			items: rows.into_iter().map(|(_, item)| item).collect(),
			current: request.current,
			next,
			page_size: request.page_size,
			has_more,
		}
	}

	/// Request for the page after this one.
	pub fn next_request(&self) -> CursorRequest {
		CursorRequest {
			current:   self.next,
			page_size: self.page_size,
		}
	}

	pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorResult<U> {
		CursorResult {
			items:     self.items.into_iter().map(f).collect(),
			current:   self.current,
			next:      self.next,
			page_size: self.page_size,
			has_more:  self.has_more,
		}
	}
}

pub struct CursorPlan<'p, M: Entity> {
	base:    &'p ReadQueryPlan<M>,
	request: CursorRequest,
}

impl<M: Entity> ReadQueryPlan<M> {
	pub fn cursor(&self, request: CursorRequest) -> CursorPlan<'_, M> {
		CursorPlan {
			base: self,
			request,
		}
	}
}

impl<M: Entity> CursorPlan<'_, M> {
	fn to_writer(&self) -> SqlWriter {
		let mut w = SqlWriter::empty();

		w.push("SELECT * FROM (SELECT ");
		w.push_ident("t1");
		w.push(".*, ROW_NUMBER() OVER () AS ");
		w.push_ident(ROW_NUM_COLUMN);
		w.push(" FROM (");
		self.base.write_base(&mut w, SelectType::Star);
		if !self.base.is_sorted() {
			let key = format!("{}.{}", M::TABLE, M::PRIMARY_KEY);
			w.push_sort(&SortOrder::from(SortOptions::asc(key)));
		}
		w.push(") AS ");
		w.push_ident("t1");
		w.push(") AS ");
		w.push_ident(M::TABLE);

		w.push(" WHERE ");
		w.push_ident(ROW_NUM_COLUMN);
		w.push(" > ");
		w.bind(&Value::Int(self.request.current));
		w.push(" ORDER BY ");
		w.push_ident(ROW_NUM_COLUMN);
		w.push(" LIMIT ");
		w.bind(&Value::Int(self.request.page_size));

		w
	}

	pub fn sql(&self) -> String {
		self.to_writer().sql().to_owned()
	}

	pub fn params(&self) -> Vec<Value> {
		self.to_writer().params().to_vec()
	}

	pub async fn fetch<'e, E>(
		&self,
		exec: E,
	) -> Result<CursorResult<M>, sqlx::Error>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let w = self.to_writer();
		tracing::debug!(
			entity = M::NAME,
			current = self.request.current,
			page_size = self.request.page_size,
			sql = w.sql(),
			"executing cursor page"
		);

		let rows = w.into_builder().build().fetch_all(exec).await?;

		let rows = rows
			.iter()
			.map(|row| -> Result<(i64, M), sqlx::Error> {
				let n: i64 = row.try_get(ROW_NUM_COLUMN)?;
				Ok((n, M::from_row(row)?))
			})
			.collect::<Result<Vec<_>, sqlx::Error>>()?;

		Ok(CursorResult::new(self.request, rows))
	}
}
