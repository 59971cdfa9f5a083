use std::collections::HashSet;

use crate::{
	ColumnKind,
	Entity,
};

/// Type-erased handle on the target side of a relation.
#[derive(Debug, Clone, Copy)]
pub struct RelatedEntity {
	pub name:        &'static str,
	pub table:       &'static str,
	pub primary_key: &'static str,
	pub relations:   fn() -> &'static RelationRegistry,
	pub column_kind: fn(&str) -> Option<ColumnKind>,
}

impl RelatedEntity {
	pub fn of<E: Entity>() -> Self {
		Self {
			name:        E::NAME,
			table:       E::TABLE,
			primary_key: E::PRIMARY_KEY,
			relations:   E::relations,
			column_kind: E::column_kind,
		}
	}

	pub fn registry(&self) -> &'static RelationRegistry {
		(self.relations)()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
	/// `parent.foreign_key = related.owner_key`
	BelongsTo {
		foreign_key: &'static str,
		owner_key:   &'static str,
	},
	/// `related.foreign_key = parent.local_key`, at most one row.
	HasOne {
		foreign_key: &'static str,
		local_key:   &'static str,
	},
	/// `related.foreign_key = parent.local_key`
	HasMany {
		foreign_key: &'static str,
		local_key:   &'static str,
	},
	/// Through `pivot`: `pivot.foreign_pivot_key = parent.parent_key` and
	/// `pivot.related_pivot_key = related.related_key`.
	BelongsToMany {
		pivot:             &'static str,
		foreign_pivot_key: &'static str,
		related_pivot_key: &'static str,
		parent_key:        &'static str,
		related_key:       &'static str,
	},
	/// `related.id_column = parent.local_key` restricted to rows whose
	/// `type_column` equals `morph_type`.
	MorphMany {
		id_column:   &'static str,
		type_column: &'static str,
		morph_type:  &'static str,
		local_key:   &'static str,
	},
}

impl RelationKind {
	pub fn is_to_one(&self) -> bool {
		matches!(self, Self::BelongsTo { .. } | Self::HasOne { .. })
	}

	fn columns(&self) -> Vec<&'static str> {
		match *self {
			Self::BelongsTo {
				foreign_key,
				owner_key,
			} => vec![foreign_key, owner_key],
			Self::HasOne {
				foreign_key,
				local_key,
			}
			| Self::HasMany {
				foreign_key,
				local_key,
			} => vec![foreign_key, local_key],
			Self::BelongsToMany {
				pivot,
				foreign_pivot_key,
				related_pivot_key,
				parent_key,
				related_key,
			} => vec![
				pivot,
				foreign_pivot_key,
				related_pivot_key,
				parent_key,
				related_key,
			],
			Self::MorphMany {
				id_column,
				type_column,
				morph_type,
				local_key,
			} => vec![id_column, type_column, morph_type, local_key],
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct RelationDescriptor {
	pub name:    &'static str,
	pub related: RelatedEntity,
	pub kind:    RelationKind,
}

/// Relations an entity exposes, by name.
#[derive(Debug, Default)]
pub struct RelationRegistry {
	relations: Vec<RelationDescriptor>,
}

static EMPTY: RelationRegistry = RelationRegistry {
	relations: Vec::new(),
};

impl RelationRegistry {
	pub fn empty() -> &'static Self {
		&EMPTY
	}

	/// Starts a registry for relations owned by `P`.
	pub fn builder<P: Entity>() -> RelationRegistryBuilder {
		RelationRegistryBuilder {
			parent_key: P::PRIMARY_KEY,
			relations:  Vec::new(),
		}
	}

	pub fn get(&self, name: &str) -> Option<&RelationDescriptor> {
		self.relations.iter().find(|r| r.name == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &RelationDescriptor> {
		self.relations.iter()
	}

	pub fn len(&self) -> usize {
		self.relations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.relations.is_empty()
	}

	/// Reports empty or duplicated relation names and empty key columns.
	pub fn validate(&self) -> Result<(), String> {
		let mut seen = HashSet::new();

		for r in &self.relations {
			if r.name.is_empty() {
				return Err("relation name must not be empty".into());
			}

			if !seen.insert(r.name) {
				return Err(format!("relation `{}` is declared twice", r.name));
			}

			if r.related.table.is_empty() {
				return Err(format!(
					"relation `{}` points at an entity without a table",
					r.name
				));
			}

			if r.kind.columns().iter().any(|c| c.is_empty()) {
				return Err(format!(
					"relation `{}` has an empty key column",
					r.name
				));
			}
		}

		Ok(())
	}
}

pub struct RelationRegistryBuilder {
	parent_key: &'static str,
	relations:  Vec<RelationDescriptor>,
}

impl RelationRegistryBuilder {
	pub fn relation(
		mut self,
		name: &'static str,
		related: RelatedEntity,
		kind: RelationKind,
	) -> Self {
		self.relations.push(RelationDescriptor {
			name,
			related,
			kind,
		});
		self
	}

	pub fn belongs_to<E: Entity>(
		self,
		name: &'static str,
		foreign_key: &'static str,
	) -> Self {
		self.relation(name, RelatedEntity::of::<E>(), RelationKind::BelongsTo {
			foreign_key,
			owner_key: E::PRIMARY_KEY,
		})
	}

	pub fn has_one<E: Entity>(
		self,
		name: &'static str,
		foreign_key: &'static str,
	) -> Self {
		let local_key = self.parent_key;
		self.relation(name, RelatedEntity::of::<E>(), RelationKind::HasOne {
			foreign_key,
			local_key,
		})
	}

	pub fn has_many<E: Entity>(
		self,
		name: &'static str,
		foreign_key: &'static str,
	) -> Self {
		let local_key = self.parent_key;
		self.relation(name, RelatedEntity::of::<E>(), RelationKind::HasMany {
			foreign_key,
			local_key,
		})
	}

	pub fn belongs_to_many<E: Entity>(
		self,
		name: &'static str,
		pivot: &'static str,
		foreign_pivot_key: &'static str,
		related_pivot_key: &'static str,
	) -> Self {
		let parent_key = self.parent_key;
		self.relation(
			name,
			RelatedEntity::of::<E>(),
			RelationKind::BelongsToMany {
				pivot,
				foreign_pivot_key,
				related_pivot_key,
				parent_key,
				related_key: E::PRIMARY_KEY,
			},
		)
	}

	pub fn morph_many<E: Entity>(
		self,
		name: &'static str,
		id_column: &'static str,
		type_column: &'static str,
		morph_type: &'static str,
	) -> Self {
		let local_key = self.parent_key;
		self.relation(name, RelatedEntity::of::<E>(), RelationKind::MorphMany {
			id_column,
			type_column,
			morph_type,
			local_key,
		})
	}

	pub fn build(self) -> RelationRegistry {
		RelationRegistry {
			relations: self.relations,
		}
	}
}
