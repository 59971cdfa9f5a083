use std::{
	fmt,
	str::FromStr,
};

use serde::{
	Deserialize,
	Serialize,
};
use sqlrepo_traits::{
	SqlWrite,
	Value,
};

use crate::blocks::JoinClause;

/// How a clause combines with the sibling before it.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Boolean {
	#[default]
	And,
	Or,
}

impl Boolean {
	fn keyword(self) -> &'static str {
		match self {
			Self::And => " AND ",
			Self::Or => " OR ",
		}
	}
}

impl FromStr for Boolean {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"and" => Ok(Self::And),
			"or" => Ok(Self::Or),
			other => Err(format!("`{other}` is not a boolean joiner")),
		}
	}
}

impl fmt::Display for Boolean {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::And => f.write_str("and"),
			Self::Or => f.write_str("or"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	/// `"column" <op> $n`
	Compare {
		column:   String,
		operator: String,
		value:    Value,
	},
	/// `"column" IS [NOT] NULL`
	Null { column: String, negated: bool },
	/// `"column" [NOT] IN ($1, ..)`
	In {
		column:  String,
		values:  Vec<Value>,
		negated: bool,
	},
	/// `"left" = "right"`
	Columns { left: String, right: String },
	Group(WhereGroup),
	/// `EXISTS (SELECT * FROM "table" [AS "alias"] .. WHERE ..)`
	Exists {
		table:  String,
		alias:  Option<String>,
		joins:  Vec<JoinClause>,
		filter: WhereGroup,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
	pub boolean:   Boolean,
	pub predicate: Predicate,
}

/// Ordered clauses rendered inside one pair of parentheses. The joiner of
/// the first clause is never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereGroup {
	clauses: Vec<Clause>,
}

impl WhereGroup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, boolean: Boolean, predicate: Predicate) {
		if let Predicate::Group(g) = &predicate {
			if g.is_empty() {
				return;
			}
		}

		self.clauses.push(Clause { boolean, predicate });
	}

	pub fn and(mut self, predicate: Predicate) -> Self {
		self.push(Boolean::And, predicate);
		self
	}

	pub fn or(mut self, predicate: Predicate) -> Self {
		self.push(Boolean::Or, predicate);
		self
	}

	/// Both groups, each parenthesized, joined by `AND`.
	pub fn and_group(self, other: WhereGroup) -> Self {
		if self.is_empty() {
			return other;
		}
		if other.is_empty() {
			return self;
		}

		Self::new()
			.and(Predicate::Group(self))
			.and(Predicate::Group(other))
	}

	pub fn clauses(&self) -> &[Clause] {
		&self.clauses
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn len(&self) -> usize {
		self.clauses.len()
	}

	pub fn write<W: SqlWrite>(&self, w: &mut W) {
		w.push("(");
		self.write_clauses(w);
		w.push(")");
	}

	/// Clauses without the surrounding parentheses.
	pub(crate) fn write_clauses<W: SqlWrite>(&self, w: &mut W) {
		for (i, c) in self.clauses.iter().enumerate() {
			if i > 0 {
				w.push(c.boolean.keyword());
			}
			c.predicate.write(w);
		}
	}
}

impl Predicate {
	pub fn compare(
		column: impl Into<String>,
		operator: impl Into<String>,
		value: impl Into<Value>,
	) -> Self {
		Self::Compare {
			column:   column.into(),
			operator: operator.into(),
			value:    value.into(),
		}
	}

	pub fn columns(left: impl Into<String>, right: impl Into<String>) -> Self {
		Self::Columns {
			left:  left.into(),
			right: right.into(),
		}
	}

	pub fn write<W: SqlWrite>(&self, w: &mut W) {
		match self {
			Self::Compare {
				column,
				operator,
				value,
			} => {
				w.push_ident(column);
				w.push(" ");
				w.push(&sql_operator(operator));
				w.push(" ");
				w.bind(value);
			}
			Self::Null { column, negated } => {
				w.push_ident(column);
				w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
			}
			Self::In {
				values, negated, ..
			} if values.is_empty() => {
				w.push(if *negated { "1 = 1" } else { "0 = 1" });
			}
			Self::In {
				column,
				values,
				negated,
			} => {
				w.push_ident(column);
				w.push(if *negated { " NOT IN (" } else { " IN (" });
				for (i, v) in values.iter().enumerate() {
					if i > 0 {
						w.push(", ");
					}
					w.bind(v);
				}
				w.push(")");
			}
			Self::Columns { left, right } => {
				w.push_ident(left);
				w.push(" = ");
				w.push_ident(right);
			}
			Self::Group(g) => g.write(w),
			Self::Exists {
				table,
				alias,
				joins,
				filter,
			} => {
				w.push("EXISTS (SELECT * FROM ");
				w.push_ident(table);
				if let Some(alias) = alias {
					w.push(" AS ");
					w.push_ident(alias);
				}
				for j in joins {
					j.write(w, " INNER JOIN ");
				}
				if !filter.is_empty() {
					w.push(" WHERE ");
					filter.write_clauses(w);
				}
				w.push(")");
			}
		}
	}
}

/// Word operators are upper-cased, symbolic ones kept verbatim.
fn sql_operator(op: &str) -> String {
	if op.chars().any(|c| c.is_ascii_alphabetic()) {
		op.to_ascii_uppercase()
	} else {
		op.to_owned()
	}
}
