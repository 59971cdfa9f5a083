//! Caller-facing filter input.
//!
//! A [`FilterInput`] is an ordered list of [`FilterEntry`] values. Each entry
//! is one of four shapes, checked in this order when the input is parsed
//! from JSON (see [`FilterInput::from_json`]):
//!
//! 1. [`FilterEntry::Relation`]: an existence test over a related
//!    collection, with its own nested criteria.
//! 2. [`FilterEntry::Comparison`]: an explicit [`Criterion`].
//! 3. [`FilterEntry::Equality`]: `field = value` shorthand.
//! 4. [`FilterEntry::Group`]: a parenthesized sub-list.
//!
//! [`CriteriaCompiler`] validates the entries and turns them into a
//! [`crate::blocks::WhereGroup`].

use serde::Serialize;
use sqlrepo_traits::Value;

pub use crate::blocks::Boolean;

mod compile;
mod parse;

pub use compile::{
	CriteriaCompiler,
	MULTI_VALUE_OPERATORS,
	SINGLE_VALUE_OPERATORS,
};

/// Builds a [`FilterInput`] from anything convertible into a
/// [`FilterEntry`]: tuples, criteria, or nested [`group!`]s.
#[macro_export]
macro_rules! filter {
	() => {
		$crate::criteria::FilterInput::new()
	};
	( $( $e:expr ),+ $(,)? ) => {
		$crate::criteria::FilterInput::from(::std::vec![
			$( $crate::criteria::FilterEntry::from($e) ),*
		])
	};
}

/// Parenthesized sub-list joined to its predecessor with `AND`.
#[macro_export]
macro_rules! group {
	( $( $e:expr ),* $(,)? ) => {
		$crate::criteria::FilterEntry::Group {
			boolean: $crate::criteria::Boolean::And,
			entries: $crate::filter![ $( $e ),* ],
		}
	};
}

/// Parenthesized sub-list joined to its predecessor with `OR`.
#[macro_export]
macro_rules! or_group {
	( $( $e:expr ),* $(,)? ) => {
		$crate::criteria::FilterEntry::Group {
			boolean: $crate::criteria::Boolean::Or,
			entries: $crate::filter![ $( $e ),* ],
		}
	};
}

/// One filter term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
	pub attribute: String,
	pub operator:  String,
	pub value:     Value,
	pub boolean:   Boolean,
}

impl Criterion {
	pub fn new(
		attribute: impl Into<String>,
		operator: impl Into<String>,
		value: impl Into<Value>,
	) -> Self {
		Self {
			attribute: attribute.into(),
			operator:  operator.into(),
			value:     value.into(),
			boolean:   Boolean::And,
		}
	}

	pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::new(attribute, "=", value)
	}

	pub fn boolean(mut self, boolean: Boolean) -> Self {
		self.boolean = boolean;
		self
	}

	pub fn or(self) -> Self {
		self.boolean(Boolean::Or)
	}
}

/// At least one row of `relation` must match `criteria`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationCriterion {
	pub relation: String,
	pub criteria: FilterInput,
	pub boolean:  Boolean,
}

impl RelationCriterion {
	pub fn new(
		relation: impl Into<String>,
		criteria: impl Into<FilterInput>,
	) -> Self {
		Self {
			relation: relation.into(),
			criteria: criteria.into(),
			boolean:  Boolean::And,
		}
	}

	pub fn boolean(mut self, boolean: Boolean) -> Self {
		self.boolean = boolean;
		self
	}

	pub fn or(self) -> Self {
		self.boolean(Boolean::Or)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterEntry {
	Equality {
		attribute: String,
		value:     Value,
	},
	Comparison(Criterion),
	Group {
		boolean: Boolean,
		entries: FilterInput,
	},
	Relation(RelationCriterion),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterInput(pub Vec<FilterEntry>);

impl FilterInput {
	pub fn new() -> Self {
		Self::default()
	}

	/// `field = value` for every pair, in iteration order.
	pub fn equals<K, V, I>(pairs: I) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
		I: IntoIterator<Item = (K, V)>,
	{
		pairs.into_iter().map(FilterEntry::from).collect()
	}

	pub fn push(&mut self, entry: impl Into<FilterEntry>) {
		self.0.push(entry.into());
	}

	pub fn with(mut self, entry: impl Into<FilterEntry>) -> Self {
		self.push(entry);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn entries(&self) -> &[FilterEntry] {
		&self.0
	}
}

impl From<Vec<FilterEntry>> for FilterInput {
	fn from(v: Vec<FilterEntry>) -> Self {
		Self(v)
	}
}

impl FromIterator<FilterEntry> for FilterInput {
	fn from_iter<T: IntoIterator<Item = FilterEntry>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl From<Criterion> for FilterEntry {
	fn from(c: Criterion) -> Self {
		Self::Comparison(c)
	}
}

impl From<RelationCriterion> for FilterEntry {
	fn from(c: RelationCriterion) -> Self {
		Self::Relation(c)
	}
}

impl From<FilterInput> for FilterEntry {
	fn from(entries: FilterInput) -> Self {
		Self::Group {
			boolean: Boolean::And,
			entries,
		}
	}
}

impl<A, V> From<(A, V)> for FilterEntry
where
	A: Into<String>,
	V: Into<Value>,
{
	fn from((attribute, value): (A, V)) -> Self {
		Self::Equality {
			attribute: attribute.into(),
			value:     value.into(),
		}
	}
}

impl<A, O, V> From<(A, O, V)> for FilterEntry
where
	A: Into<String>,
	O: Into<String>,
	V: Into<Value>,
{
	fn from((attribute, operator, value): (A, O, V)) -> Self {
		Self::Comparison(Criterion::new(attribute, operator, value))
	}
}

impl<A, O, V> From<(A, O, V, Boolean)> for FilterEntry
where
	A: Into<String>,
	O: Into<String>,
	V: Into<Value>,
{
	fn from((attribute, operator, value, boolean): (A, O, V, Boolean)) -> Self {
		Self::Comparison(
			Criterion::new(attribute, operator, value).boolean(boolean),
		)
	}
}
