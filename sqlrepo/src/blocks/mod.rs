use chrono::{
	DateTime,
	Utc,
};
use sqlrepo_traits::{
	quote_ident,
	SqlWrite,
	Value,
};
use sqlx::Postgres;
use uuid::Uuid;

mod fragment;
mod head;
mod pagination;
mod predicate;
mod sort;

pub use fragment::SqlFragment;
pub use head::{
	DeleteHead,
	InsertHead,
	ReadHead,
	SelectType,
	UpdateHead,
	WriteHead,
};
pub use pagination::{
	Page,
	Pagination,
};
pub use predicate::{
	Boolean,
	Clause,
	Predicate,
	WhereGroup,
};
pub use sort::{
	SortDirection,
	SortOptions,
	SortOrder,
};

/// `LEFT JOIN "table" ON "left" = "right"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
	pub table: String,
	pub alias: Option<String>,
	pub left:  String,
	pub right: String,
}

impl JoinClause {
	pub fn new(
		table: impl Into<String>,
		left: impl Into<String>,
		right: impl Into<String>,
	) -> Self {
		Self {
			table: table.into(),
			alias: None,
			left:  left.into(),
			right: right.into(),
		}
	}

	/// Name the joined table is addressed by.
	pub fn name(&self) -> &str {
		self.alias.as_deref().unwrap_or(&self.table)
	}

	pub(crate) fn write<W: SqlWrite>(&self, w: &mut W, keyword: &str) {
		w.push(keyword);
		w.push_ident(&self.table);
		if let Some(alias) = &self.alias {
			w.push(" AS ");
			w.push_ident(alias);
		}
		w.push(" ON ");
		w.push_ident(&self.left);
		w.push(" = ");
		w.push_ident(&self.right);
	}
}

/// Wraps a [`sqlx::QueryBuilder`], keeping a readable copy of the SQL and
/// the bound values for logging and inspection.
pub struct SqlWriter {
	qb:             sqlx::QueryBuilder<'static, Postgres>,
	sql:            String,
	params:         Vec<Value>,
	has_join:       bool,
	has_where:      bool,
	has_sort:       bool,
	has_pagination: bool,
}

impl SqlWriter {
	pub fn new(head: impl WriteHead) -> Self {
		let mut w = Self::empty();
		head.write_head(&mut w);
		w
	}

	pub fn empty() -> Self {
		Self {
			qb:             sqlx::QueryBuilder::new(""),
			sql:            String::new(),
			params:         Vec::new(),
			has_join:       false,
			has_where:      false,
			has_sort:       false,
			has_pagination: false,
		}
	}

	#[cfg(test)]
	fn mirrors_builder(&mut self) -> bool {
		use sqlx::Execute;
		let sql = self.sql.clone();
		self.qb.build().sql() == sql
	}

	pub fn into_builder(self) -> sqlx::QueryBuilder<'static, Postgres> {
		self.qb
	}

	pub fn sql(&self) -> &str {
		&self.sql
	}

	/// Values bound so far, in placeholder order.
	pub fn params(&self) -> &[Value] {
		&self.params
	}

	pub fn push_joins(&mut self, joins: &[JoinClause]) {
		if self.has_join {
			return;
		}

		self.has_join = true;
		for j in joins {
			j.write(self, " LEFT JOIN ");
		}
	}

	pub fn push_where(&mut self, group: &WhereGroup) {
		if self.has_where || group.is_empty() {
			return;
		}

		self.push(" WHERE ");
		self.has_where = true;
		group.write(self);
	}

	pub fn push_sort(&mut self, sort: &SortOrder) {
		if self.has_sort || sort.is_empty() {
			return;
		}

		self.push(" ORDER BY ");
		self.has_sort = true;
		sort.write(self);
	}

	pub fn push_pagination(&mut self, p: &Pagination) {
		if self.has_pagination {
			return;
		}

		self.has_pagination = true;
		self.push(" LIMIT ");
		self.bind(&Value::Int(p.page_size));
		self.push(" OFFSET ");
		self.bind(&Value::Int(p.offset()));
	}
}

impl SqlWrite for SqlWriter {
	fn push(&mut self, s: &str) {
		self.qb.push(s);
		self.sql.push_str(s);
	}

	fn bind(&mut self, value: &Value) {
		match value {
			// typed NULL binds clash with non-text columns
			Value::Null => {
				self.push("NULL");
				return;
			}
			Value::Bool(b) => self.qb.push_bind(*b),
			Value::Int(i) => self.qb.push_bind(*i),
			Value::Float(x) => self.qb.push_bind(*x),
			Value::Uuid(id) => self.qb.push_bind::<Uuid>(*id),
			Value::DateTime(ts) => self.qb.push_bind::<DateTime<Utc>>(*ts),
			Value::Text(s) => self.qb.push_bind(s.clone()),
			Value::List(_) => self.qb.push_bind(sqlx::types::Json(value.clone())),
		};

		self.params.push(value.clone());
		self.sql.push_str(&format!("${}", self.params.len()));
	}

	fn push_ident(&mut self, ident: &str) {
		self.push(&quote_ident(ident));
	}
}
