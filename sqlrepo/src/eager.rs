//! Eager relations and relation counts, loaded in the same statement as
//! correlated sub-selects.

use std::collections::BTreeMap;

use serde::{
	Deserialize,
	Serialize,
};
use sqlrepo_traits::{
	Entity,
	SqlWrite,
};
use sqlx::{
	postgres::PgRow,
	types::JsonValue,
	FromRow,
	Row,
};

use crate::{
	blocks::SqlFragment,
	criteria::CriteriaCompiler,
	error::{
		Error,
		Result,
	},
};

/// An entity with the relations and counts requested alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loaded<M> {
	pub entity:    M,
	/// To-one relations hold an object or null, to-many an array.
	pub relations: BTreeMap<String, JsonValue>,
	pub counts:    BTreeMap<String, i64>,
}

impl<M> Loaded<M> {
	pub fn relation(&self, name: &str) -> Option<&JsonValue> {
		self.relations.get(name)
	}

	pub fn count(&self, relation: &str) -> Option<i64> {
		self.counts.get(relation).copied()
	}
}

pub fn count_column(relation: &str) -> String {
	format!("{relation}_count")
}

/// Select-list columns loading `with` and counting `with_counts`.
pub fn columns<M: Entity>(
	with: &[String],
	with_counts: &[String],
) -> Result<Vec<SqlFragment>> {
	let compiler = CriteriaCompiler::for_entity::<M>();
	let mut out = Vec::with_capacity(with.len() + with_counts.len());

	for (name, counting) in with
		.iter()
		.map(|n| (n, false))
		.chain(with_counts.iter().map(|n| (n, true)))
	{
		if name.contains('.') {
			return Err(Error::not_implemented(
				M::NAME,
				format!("eager loading nested relation `{name}`"),
			));
		}

		let c = compiler.correlate(name)?;
		let mut f = SqlFragment::new();

		f.push("(SELECT ");
		if counting {
			f.push("COUNT(*)");
		} else if c.relation.kind.is_to_one() {
			f.push("to_json(");
			f.push_ident(&c.target);
			f.push(")");
		} else {
			f.push("COALESCE(json_agg(");
			f.push_ident(&c.target);
			f.push("), '[]'::json)");
		}

		f.push(" FROM ");
		f.push_ident(&c.table);
		if let Some(alias) = &c.alias {
			f.push(" AS ");
			f.push_ident(alias);
		}
		for j in &c.joins {
			j.write(&mut f, " INNER JOIN ");
		}
		f.push(" WHERE ");
		c.filter.write_clauses(&mut f);
		if !counting && c.relation.kind.is_to_one() {
			f.push(" LIMIT 1");
		}
		f.push(") AS ");

		if counting {
			f.push_ident(&count_column(name));
		} else {
			f.push_ident(name);
		}

		out.push(f);
	}

	Ok(out)
}

pub(crate) fn decode<M: Entity>(
	row: &PgRow,
	with: &[String],
	with_counts: &[String],
) -> Result<Loaded<M>, sqlx::Error> {
	let mut relations = BTreeMap::new();
	for name in with {
		let value: Option<JsonValue> = row.try_get(name.as_str())?;
		relations.insert(name.clone(), value.unwrap_or(JsonValue::Null));
	}

	let mut counts = BTreeMap::new();
	for name in with_counts {
		let n: i64 = row.try_get(count_column(name).as_str())?;
		counts.insert(name.clone(), n);
	}

	Ok(Loaded {
		entity: M::from_row(row)?,
		relations,
		counts,
	})
}
