use smallvec::SmallVec;
use sqlrepo_traits::{
	Entity,
	RelationKind,
	RelationRegistry,
};

use crate::{
	blocks::JoinClause,
	error::{
		Error,
		Result,
	},
};

/// `LEFT JOIN`s resolved from relation paths such as `profile.phones`.
/// Each table is joined at most once.
#[derive(Debug, Clone)]
pub struct RelationJoins {
	entity:    &'static str,
	table:     &'static str,
	relations: &'static RelationRegistry,
	clauses:   SmallVec<[JoinClause; 4]>,
}

impl RelationJoins {
	pub fn new<E: Entity>() -> Self {
		Self {
			entity:    E::NAME,
			table:     E::TABLE,
			relations: E::relations(),
			clauses:   SmallVec::new(),
		}
	}

	pub fn clauses(&self) -> &[JoinClause] {
		&self.clauses
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	fn is_joined(&self, table: &str) -> bool {
		table == self.table || self.clauses.iter().any(|c| c.name() == table)
	}

	fn add(&mut self, clause: JoinClause) {
		if !self.is_joined(clause.name()) {
			self.clauses.push(clause);
		}
	}

	/// Resolves `path` hop by hop, starting at the root entity.
	pub fn join(&mut self, path: &str) -> Result<()> {
		let mut entity = self.entity;
		let mut parent = self.table;
		let mut relations = self.relations;

		for segment in path.split('.') {
			let relation = relations.get(segment).ok_or_else(|| {
				Error::bad_criteria(
					entity,
					format!("unknown relation `{segment}` in `{path}`"),
				)
			})?;
			let related = relation.related.table;

			match relation.kind {
				RelationKind::BelongsTo {
					foreign_key,
					owner_key,
				} => self.add(JoinClause::new(
					related,
					format!("{parent}.{foreign_key}"),
					format!("{related}.{owner_key}"),
				)),
				RelationKind::HasOne {
					foreign_key,
					local_key,
				}
				| RelationKind::HasMany {
					foreign_key,
					local_key,
				} => self.add(JoinClause::new(
					related,
					format!("{related}.{foreign_key}"),
					format!("{parent}.{local_key}"),
				)),
				RelationKind::BelongsToMany {
					pivot,
					foreign_pivot_key,
					related_pivot_key,
					parent_key,
					related_key,
				} => {
					self.add(JoinClause::new(
						pivot,
						format!("{pivot}.{foreign_pivot_key}"),
						format!("{parent}.{parent_key}"),
					));
					self.add(JoinClause::new(
						related,
						format!("{pivot}.{related_pivot_key}"),
						format!("{related}.{related_key}"),
					));
				}
				RelationKind::MorphMany { .. } => {
					return Err(Error::not_implemented(
						entity,
						format!("joining polymorphic relation `{segment}`"),
					));
				}
			}

			entity = relation.related.name;
			parent = related;
			relations = relation.related.registry();
		}

		Ok(())
	}
}
