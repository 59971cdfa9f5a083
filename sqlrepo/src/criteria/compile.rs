use sqlrepo_traits::{
	ColumnKind,
	Entity,
	RelationDescriptor,
	RelationKind,
	RelationRegistry,
	Value,
};

use crate::{
	blocks::{
		Boolean,
		JoinClause,
		Predicate,
		WhereGroup,
	},
	criteria::{
		Criterion,
		FilterEntry,
		FilterInput,
		RelationCriterion,
	},
	error::{
		Error,
		Result,
	},
};

/// Operators taking a single value. Matched case-insensitively.
pub const SINGLE_VALUE_OPERATORS: &[&str] = &[
	"=",
	"<",
	">",
	"<=",
	">=",
	"<>",
	"!=",
	"<=>",
	"like",
	"like binary",
	"not like",
	"ilike",
	"&",
	"|",
	"^",
	"<<",
	">>",
	"rlike",
	"regexp",
	"not regexp",
	"~",
	"~*",
	"!~",
	"!~*",
	"similar to",
	"not similar to",
	"not ilike",
	"~~*",
	"!~~*",
];

/// Operators taking a list.
pub const MULTI_VALUE_OPERATORS: &[&str] = &["in", "not in"];

pub(crate) struct Correlated {
	pub relation: RelationDescriptor,
	pub table:    String,
	pub alias:    Option<String>,
	/// `alias` if set, else `table`.
	pub target:   String,
	pub joins:    Vec<JoinClause>,
	pub filter:   WhereGroup,
}

/// Compiles [`FilterInput`] into a [`WhereGroup`] scoped to one entity.
///
/// Relation criteria recurse into a compiler scoped to the related entity,
/// so existence tests nest to any depth. Compilation holds no state between
/// calls.
#[derive(Debug, Clone)]
pub struct CriteriaCompiler {
	entity:    &'static str,
	/// Table (or alias) columns of this scope belong to.
	scope:     String,
	table:     &'static str,
	relations: &'static RelationRegistry,
	kinds:     fn(&str) -> Option<ColumnKind>,
	/// Qualify bare attributes with `scope`; set inside sub-queries.
	qualify:   bool,
	depth:     usize,
}

impl CriteriaCompiler {
	pub fn for_entity<E: Entity>() -> Self {
		Self {
			entity:    E::NAME,
			scope:     E::TABLE.to_owned(),
			table:     E::TABLE,
			relations: E::relations(),
			kinds:     E::column_kind,
			qualify:   false,
			depth:     0,
		}
	}

	pub fn compile(&self, input: &FilterInput) -> Result<WhereGroup> {
		let mut group = WhereGroup::new();

		for entry in input.entries() {
			match entry {
				FilterEntry::Relation(rc) => {
					group.push(rc.boolean, self.exists(rc)?);
				}
				FilterEntry::Comparison(c) => {
					group.push(c.boolean, self.emit(c)?);
				}
				FilterEntry::Equality { attribute, value } => {
					let c = Criterion::eq(attribute.clone(), value.clone());
					group.push(c.boolean, self.emit(&c)?);
				}
				FilterEntry::Group { boolean, entries } => {
					let nested = self.compile(entries)?;
					group.push(*boolean, Predicate::Group(nested));
				}
			}
		}

		Ok(group)
	}

	fn bad(&self, reason: impl Into<String>) -> Error {
		Error::bad_criteria(self.entity, reason)
	}

	fn column(&self, attribute: &str) -> String {
		if self.qualify && !attribute.contains('.') {
			format!("{}.{}", self.scope, attribute)
		} else {
			attribute.to_owned()
		}
	}

	/// Kind of a column of this scope. Columns of joined tables are unknown.
	fn kind_of(&self, attribute: &str) -> Option<ColumnKind> {
		let column = match attribute.rsplit_once('.') {
			Some((owner, column))
				if owner == self.scope || owner == self.table =>
			{
				column
			}
			Some(_) => return None,
			None => attribute,
		};

		(self.kinds)(column)
	}

	/// Checks attribute, operator and value shape. Returns the normalized
	/// operator.
	fn validate(&self, c: &Criterion) -> Result<String> {
		if c.attribute.trim().is_empty() {
			return Err(self.bad("criterion attribute must not be empty"));
		}

		let operator = c.operator.trim().to_ascii_lowercase();

		match &c.value {
			Value::List(values) => {
				if !MULTI_VALUE_OPERATORS.contains(&operator.as_str()) {
					return Err(self.bad(format!(
						"operator `{}` on `{}` does not take a list",
						c.operator, c.attribute
					)));
				}
				if values.iter().any(Value::is_list) {
					return Err(self.bad(format!(
						"list for `{}` must hold scalars only",
						c.attribute
					)));
				}
			}
			_ if SINGLE_VALUE_OPERATORS.contains(&operator.as_str()) => {}
			_ => {
				return Err(self.bad(format!(
					"operator `{}` is not allowed on `{}` with value {}",
					c.operator, c.attribute, c.value
				)));
			}
		}

		Ok(operator)
	}

	fn emit(&self, c: &Criterion) -> Result<Predicate> {
		let operator = self.validate(c)?;
		let column = self.column(&c.attribute);
		let value = match self.kind_of(&c.attribute) {
			Some(kind) => kind.coerce(c.value.clone()),
			None => c.value.clone(),
		};

		let predicate = match (operator.as_str(), &value) {
			("in", Value::List(values)) => Predicate::In {
				column,
				values: values.clone(),
				negated: false,
			},
			("not in", Value::List(values)) => Predicate::In {
				column,
				values: values.clone(),
				negated: true,
			},
			("=", Value::Null) => Predicate::Null {
				column,
				negated: false,
			},
			("<>" | "!=", Value::Null) => Predicate::Null {
				column,
				negated: true,
			},
			_ => Predicate::Compare {
				column,
				operator,
				value,
			},
		};

		Ok(predicate)
	}

	fn exists(&self, rc: &RelationCriterion) -> Result<Predicate> {
		let Correlated {
			relation,
			table,
			alias,
			target,
			joins,
			mut filter,
		} = self.correlate(&rc.relation)?;

		let related = relation.related;
		let nested = Self {
			entity:    related.name,
			scope:     target,
			table:     related.table,
			relations: related.registry(),
			kinds:     related.column_kind,
			qualify:   true,
			depth:     self.depth + 1,
		}
		.compile(&rc.criteria)?;
		filter.push(Boolean::And, Predicate::Group(nested));

		Ok(Predicate::Exists {
			table,
			alias,
			joins,
			filter,
		})
	}

	/// Resolves `name` and builds the join and filter tying related rows
	/// to the current scope.
	pub(crate) fn correlate(&self, name: &str) -> Result<Correlated> {
		let relation = *self
			.relations
			.get(name)
			.ok_or_else(|| self.bad(format!("unknown relation `{name}`")))?;

		let related = relation.related;
		let alias = (related.table == self.scope)
			.then(|| format!("{}_exists_{}", related.table, self.depth + 1));
		let target = alias.clone().unwrap_or_else(|| related.table.to_owned());
		let (filter, joins) = self.link(&relation, &target);

		Ok(Correlated {
			relation,
			table: related.table.to_owned(),
			alias,
			target,
			joins,
			filter,
		})
	}

	/// Correlation between this scope and the related rows.
	fn link(
		&self,
		relation: &RelationDescriptor,
		target: &str,
	) -> (WhereGroup, Vec<JoinClause>) {
		let parent = |col: &str| format!("{}.{}", self.scope, col);
		let child = |col: &str| format!("{target}.{col}");

		match relation.kind {
			RelationKind::BelongsTo {
				foreign_key,
				owner_key,
			} => (
				WhereGroup::new().and(Predicate::columns(
					parent(foreign_key),
					child(owner_key),
				)),
				vec![],
			),
			RelationKind::HasOne {
				foreign_key,
				local_key,
			}
			| RelationKind::HasMany {
				foreign_key,
				local_key,
			} => (
				WhereGroup::new().and(Predicate::columns(
					parent(local_key),
					child(foreign_key),
				)),
				vec![],
			),
			RelationKind::BelongsToMany {
				pivot,
				foreign_pivot_key,
				related_pivot_key,
				parent_key,
				related_key,
			} => (
				WhereGroup::new().and(Predicate::columns(
					parent(parent_key),
					format!("{pivot}.{foreign_pivot_key}"),
				)),
				vec![JoinClause::new(
					pivot,
					child(related_key),
					format!("{pivot}.{related_pivot_key}"),
				)],
			),
			RelationKind::MorphMany {
				id_column,
				type_column,
				morph_type,
				local_key,
			} => (
				WhereGroup::new()
					.and(Predicate::columns(parent(local_key), child(id_column)))
					.and(Predicate::compare(child(type_column), "=", morph_type)),
				vec![],
			),
		}
	}
}
