use std::fmt::{
	self,
	Display,
	Formatter,
};

use chrono::{
	DateTime,
	Utc,
};
use serde::{
	Deserialize,
	Serialize,
};
use uuid::Uuid;

/// Dynamically typed value bound into generated SQL.
///
/// Filter input arrives loosely typed (JSON bodies, query strings), so the
/// compiler carries values in this enum and binds each variant with its
/// native postgres type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Uuid(Uuid),
	DateTime(DateTime<Utc>),
	Text(String),
	List(Vec<Value>),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn is_list(&self) -> bool {
		matches!(self, Self::List(_))
	}

	/// Null, the empty string and the empty list.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Text(s) => s.is_empty(),
			Self::List(xs) => xs.is_empty(),
			_ => false,
		}
	}

	/// Converts a JSON value; objects have no counterpart. Strings stay
	/// text whatever they look like, the target column decides (see
	/// [`crate::ColumnKind::coerce`]).
	pub fn from_json(json: &serde_json::Value) -> Option<Self> {
		use serde_json::Value as Json;

		let value = match json {
			Json::Null => Self::Null,
			Json::Bool(b) => Self::Bool(*b),
			Json::Number(n) => match n.as_i64() {
				Some(i) => Self::Int(i),
				None => Self::Float(n.as_f64()?),
			},
			Json::String(s) => Self::Text(s.clone()),
			Json::Array(xs) => Self::List(
				xs.iter().map(Self::from_json).collect::<Option<Vec<_>>>()?,
			),
			Json::Object(_) => return None,
		};

		Some(value)
	}

}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(x) => write!(f, "{x}"),
			Self::Uuid(id) => write!(f, "{id}"),
			Self::DateTime(ts) => write!(f, "{}", ts.to_rfc3339()),
			Self::Text(s) => f.write_str(s),
			Self::List(xs) => {
				f.write_str("[")?;
				for (i, x) in xs.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{x}")?;
				}
				f.write_str("]")
			}
		}
	}
}

macro_rules! impl_from {
	($($ty:ty => $variant:ident),+ $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					Self::$variant(v.into())
				}
			}
		)+
	};
}

impl_from! {
	bool => Bool,
	i16 => Int,
	i32 => Int,
	i64 => Int,
	u8 => Int,
	u16 => Int,
	u32 => Int,
	f32 => Float,
	f64 => Float,
	Uuid => Uuid,
	DateTime<Utc> => DateTime,
	String => Text,
	&str => Text,
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Null, Into::into)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Self::List(v.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
	fn from(v: [T; N]) -> Self {
		Self::List(v.into_iter().map(Into::into).collect())
	}
}
