use sqlrepo_traits::SqlWrite;

use crate::blocks::SqlFragment;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SelectType {
	Star,
	Count,
	StarAndCount,
}

/// Writes the leading part of a statement.
pub trait WriteHead {
	fn write_head<W: SqlWrite>(&self, w: &mut W);
}

pub struct ReadHead<'a> {
	table:  &'a str,
	select: SelectType,
	extra:  &'a [SqlFragment],
}

impl<'a> ReadHead<'a> {
	pub fn new(table: &'a str, select: SelectType) -> Self {
		Self {
			table,
			select,
			extra: &[],
		}
	}

	/// Appends computed columns after the row itself.
	pub fn with_extra(mut self, extra: &'a [SqlFragment]) -> Self {
		self.extra = extra;
		self
	}
}

impl WriteHead for ReadHead<'_> {
	fn write_head<W: SqlWrite>(&self, w: &mut W) {
		w.push("SELECT ");
		match self.select {
			SelectType::Count => w.push("COUNT(*)"),
			SelectType::Star | SelectType::StarAndCount => {
				w.push_ident(self.table);
				w.push(".*");
			}
		}

		if self.select != SelectType::Count {
			for e in self.extra {
				w.push(", ");
				e.write(w);
			}
		}

		if self.select == SelectType::StarAndCount {
			w.push(r#", COUNT(*) OVER() AS "total_count""#);
		}

		w.push(" FROM ");
		w.push_ident(self.table);
	}
}

pub struct InsertHead<'a> {
	table: &'a str,
}

impl<'a> InsertHead<'a> {
	pub fn new(table: &'a str) -> Self {
		Self { table }
	}
}

impl WriteHead for InsertHead<'_> {
	fn write_head<W: SqlWrite>(&self, w: &mut W) {
		w.push("INSERT INTO ");
		w.push_ident(self.table);
	}
}

pub struct UpdateHead<'a> {
	table: &'a str,
}

impl<'a> UpdateHead<'a> {
	pub fn new(table: &'a str) -> Self {
		Self { table }
	}
}

impl WriteHead for UpdateHead<'_> {
	fn write_head<W: SqlWrite>(&self, w: &mut W) {
		w.push("UPDATE ");
		w.push_ident(self.table);
		w.push(" SET ");
	}
}

pub struct DeleteHead<'a> {
	table: &'a str,
}

impl<'a> DeleteHead<'a> {
	pub fn new(table: &'a str) -> Self {
		Self { table }
	}
}

impl WriteHead for DeleteHead<'_> {
	fn write_head<W: SqlWrite>(&self, w: &mut W) {
		w.push("DELETE FROM ");
		w.push_ident(self.table);
	}
}
