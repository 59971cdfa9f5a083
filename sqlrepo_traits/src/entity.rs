use std::fmt::{
	self,
	Display,
	Formatter,
};

use chrono::{
	DateTime,
	Utc,
};
use sqlx::postgres::PgRow;

use crate::{
	RelationRegistry,
	Value,
};

/// Sink for generated SQL. Implementors own placeholder numbering.
pub trait SqlWrite {
	fn push(&mut self, s: &str);

	fn bind(&mut self, value: &Value);

	fn push_ident(&mut self, ident: &str) {
		self.push(&quote_ident(ident));
	}
}

/// Quotes a possibly qualified identifier: `users.role_id` becomes
/// `"users"."role_id"`. A `*` segment is left bare.
pub fn quote_ident(ident: &str) -> String {
	let mut out = String::with_capacity(ident.len() + 4);

	for (i, part) in ident.split('.').enumerate() {
		if i > 0 {
			out.push('.');
		}

		if part == "*" {
			out.push('*');
			continue;
		}

		out.push('"');
		out.push_str(&part.replace('"', "\"\""));
		out.push('"');
	}

	out
}

/// Storage type of an entity's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
	Int,
	Text,
	Uuid,
}

impl KeyKind {
	/// Checks `id` against the key type and normalizes it for binding.
	/// Integer keys only accept integers; textual keys reject integers.
	pub fn accept(self, id: &Value) -> Option<Value> {
		match (self, id) {
			(Self::Int, Value::Int(_)) => Some(id.clone()),
			(Self::Text, Value::Text(_)) | (Self::Uuid, Value::Uuid(_)) => {
				Some(id.clone())
			}
			(Self::Text, Value::Uuid(u)) => Some(Value::Text(u.to_string())),
			(Self::Uuid, Value::Text(s)) => {
				uuid::Uuid::parse_str(s).ok().map(Value::Uuid)
			}
			_ => None,
		}
	}
}

/// Storage type of a column, as far as binding filter values cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
	Int,
	Text,
	Uuid,
	Timestamp,
}

impl ColumnKind {
	/// Reinterprets a loosely typed value for a column of this kind. Values
	/// that do not convert are returned unchanged and fail in the store.
	pub fn coerce(self, value: Value) -> Value {
		match (self, value) {
			(_, Value::List(xs)) => {
				Value::List(xs.into_iter().map(|x| self.coerce(x)).collect())
			}
			(Self::Int, Value::Text(s)) => match s.trim().parse::<i64>() {
				Ok(i) => Value::Int(i),
				Err(_) => Value::Text(s),
			},
			(Self::Uuid, Value::Text(s)) => match uuid::Uuid::parse_str(&s) {
				Ok(id) => Value::Uuid(id),
				Err(_) => Value::Text(s),
			},
			(Self::Timestamp, Value::Text(s)) => {
				match DateTime::parse_from_rfc3339(&s) {
					Ok(ts) => Value::DateTime(ts.with_timezone(&Utc)),
					Err(_) => Value::Text(s),
				}
			}
			(Self::Text, Value::Int(i)) => Value::Text(i.to_string()),
			(Self::Text, Value::Uuid(id)) => Value::Text(id.to_string()),
			(Self::Text, Value::DateTime(ts)) => Value::Text(ts.to_rfc3339()),
			(_, value) => value,
		}
	}
}

impl From<KeyKind> for ColumnKind {
	fn from(kind: KeyKind) -> Self {
		match kind {
			KeyKind::Int => Self::Int,
			KeyKind::Text => Self::Text,
			KeyKind::Uuid => Self::Uuid,
		}
	}
}

impl Display for KeyKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int => f.write_str("int"),
			Self::Text => f.write_str("string"),
			Self::Uuid => f.write_str("uuid"),
		}
	}
}

/// A stored record type managed by a repository.
pub trait Entity:
	Send + Sync + Unpin + Clone + for<'r> sqlx::FromRow<'r, PgRow> + 'static
{
	/// Name used in error messages and logs.
	const NAME: &'static str;
	const TABLE: &'static str;
	const PRIMARY_KEY: &'static str = "id";
	const KEY_KIND: KeyKind = KeyKind::Int;

	/// Writable columns in insert order, primary key included.
	fn columns() -> &'static [&'static str];

	fn attribute(&self, name: &str) -> Option<Value>;

	/// Kind of `column`, used to bind filter values with the column's type.
	/// Only the primary key is known unless the entity says more; undeclared
	/// columns get values bound as given.
	fn column_kind(column: &str) -> Option<ColumnKind> {
		(column == Self::PRIMARY_KEY).then(|| Self::KEY_KIND.into())
	}

	fn key(&self) -> Value {
		self.attribute(Self::PRIMARY_KEY).unwrap_or_default()
	}

	fn relations() -> &'static RelationRegistry {
		RelationRegistry::empty()
	}
}
