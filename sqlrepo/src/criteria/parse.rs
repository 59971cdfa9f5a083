use serde_json::{
	Map,
	Value as Json,
};
use sqlrepo_traits::Value;

use crate::{
	criteria::{
		Boolean,
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

const RELATION: &str = "relation";
const CRITERIA: &str = "criteria";
const ATTRIBUTE: &str = "attribute";
const OPERATOR: &str = "operator";
const VALUE: &str = "value";
const BOOLEAN: &str = "boolean";

impl FilterInput {
	/// Parses loosely shaped JSON filter input.
	///
	/// A top-level object is a field to value map. A top-level array is an
	/// ordered list whose elements are matched against these rules, first
	/// match wins:
	///
	/// 1. object with a `relation` key: relation criterion
	///    (`{"relation", "criteria"?, "boolean"?}`)
	/// 2. object with an `attribute` key: criterion
	///    (`{"attribute", "operator"? = "=", "value"?, "boolean"? = "and"}`)
	/// 3. any other object: its entries as `field = value` terms, values
	///    must be scalars
	/// 4. non-empty array of arrays, optionally holding one
	///    `{"boolean": "and" | "or"}` marker: nested group
	/// 5. non-empty array: `[attribute, operator, value?, boolean?]`
	/// 6. anything else is rejected
	pub fn from_json(entity: &'static str, json: &Json) -> Result<Self> {
		Parser { entity }.input(json)
	}
}

struct Parser {
	entity: &'static str,
}

impl Parser {
	fn bad(&self, reason: impl Into<String>) -> Error {
		Error::bad_criteria(self.entity, reason)
	}

	fn input(&self, json: &Json) -> Result<FilterInput> {
		match json {
			Json::Object(map) => self.equalities(map).map(FilterInput),
			Json::Array(items) => self.list(items),
			Json::Null => Ok(FilterInput::new()),
			other => Err(self.bad(format!(
				"filter must be a map or a list, got {other}"
			))),
		}
	}

	fn list(&self, items: &[Json]) -> Result<FilterInput> {
		let mut out = FilterInput::new();

		for item in items {
			match item {
				Json::Object(map) if map.contains_key(RELATION) => {
					out.push(self.relation(map)?);
				}
				Json::Object(map) if map.contains_key(ATTRIBUTE) => {
					out.push(self.criterion(map)?);
				}
				Json::Object(map) => out.0.extend(self.equalities(map)?),
				Json::Array(xs) if is_group(xs) => out.push(self.group(xs)?),
				Json::Array(xs) if !xs.is_empty() => {
					out.push(self.positional(xs)?)
				}
				other => {
					return Err(self.bad(format!("unrecognized filter entry {other}")));
				}
			}
		}

		Ok(out)
	}

	fn equalities(&self, map: &Map<String, Json>) -> Result<Vec<FilterEntry>> {
		map.iter()
			.map(|(attribute, value)| {
				if value.is_array() || value.is_object() {
					return Err(self.bad(format!(
						"value for `{attribute}` must be a scalar"
					)));
				}

				Ok(FilterEntry::Equality {
					attribute: attribute.clone(),
					value:     self.value(value)?,
				})
			})
			.collect()
	}

	fn relation(&self, map: &Map<String, Json>) -> Result<FilterEntry> {
		let relation = map
			.get(RELATION)
			.and_then(Json::as_str)
			.ok_or_else(|| self.bad("`relation` must be a string"))?;

		let criteria = match map.get(CRITERIA) {
			Some(json) => self.input(json)?,
			None => FilterInput::new(),
		};

		Ok(RelationCriterion::new(relation, criteria)
			.boolean(self.boolean(map.get(BOOLEAN))?)
			.into())
	}

	fn criterion(&self, map: &Map<String, Json>) -> Result<FilterEntry> {
		let attribute = map
			.get(ATTRIBUTE)
			.and_then(Json::as_str)
			.ok_or_else(|| self.bad("`attribute` must be a string"))?;

		let operator = match map.get(OPERATOR) {
			None => "=",
			Some(op) => op
				.as_str()
				.ok_or_else(|| self.bad("`operator` must be a string"))?,
		};

		let value = match map.get(VALUE) {
			Some(v) => self.value(v)?,
			None => Value::Null,
		};

		Ok(Criterion::new(attribute, operator, value)
			.boolean(self.boolean(map.get(BOOLEAN))?)
			.into())
	}

	fn group(&self, items: &[Json]) -> Result<FilterEntry> {
		let mut boolean = Boolean::And;
		let mut rest = Vec::with_capacity(items.len());

		for item in items {
			match marker(item) {
				Some(b) => boolean = b,
				None => rest.push(item.clone()),
			}
		}

		Ok(FilterEntry::Group {
			boolean,
			entries: self.list(&rest)?,
		})
	}

	/// `[attribute, operator, value?, boolean?]`. A missing operator is left
	/// empty and rejected by validation.
	fn positional(&self, xs: &[Json]) -> Result<FilterEntry> {
		if xs.len() > 4 {
			return Err(self.bad(format!(
				"positional criterion takes at most 4 elements, got {}",
				xs.len()
			)));
		}

		let text = |i: usize, what: &str| -> Result<String> {
			match xs.get(i) {
				None | Some(Json::Null) => Ok(String::new()),
				Some(Json::String(s)) => Ok(s.clone()),
				Some(other) => Err(self.bad(format!(
					"{what} must be a string, got {other}"
				))),
			}
		};

		let attribute = text(0, "attribute")?;
		let operator = text(1, "operator")?;
		let value = match xs.get(2) {
			Some(v) => self.value(v)?,
			None => Value::Null,
		};

		Ok(Criterion::new(attribute, operator, value)
			.boolean(self.boolean(xs.get(3))?)
			.into())
	}

	fn value(&self, json: &Json) -> Result<Value> {
		Value::from_json(json)
			.ok_or_else(|| self.bad(format!("unsupported criterion value {json}")))
	}

	fn boolean(&self, json: Option<&Json>) -> Result<Boolean> {
		match json {
			None => Ok(Boolean::And),
			Some(Json::String(s)) => s.parse().map_err(|e: String| self.bad(e)),
			Some(other) => Err(self.bad(format!(
				"boolean must be `and` or `or`, got {other}"
			))),
		}
	}
}

/// `{"boolean": "and" | "or"}` and nothing else.
fn marker(json: &Json) -> Option<Boolean> {
	let map = json.as_object()?;
	if map.len() != 1 {
		return None;
	}

	match map.get(BOOLEAN)?.as_str()? {
		"and" => Some(Boolean::And),
		"or" => Some(Boolean::Or),
		_ => None,
	}
}

fn is_group(xs: &[Json]) -> bool {
	!xs.is_empty()
		&& xs.iter().any(Json::is_array)
		&& xs.iter().all(|x| x.is_array() || marker(x).is_some())
}
