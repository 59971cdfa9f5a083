use std::{
	fmt,
	str::FromStr,
};

use serde::{
	Deserialize,
	Serialize,
};
use sqlrepo_traits::SqlWrite;

use crate::error::{
	Error,
	Result,
};

#[macro_export]
macro_rules! order_by {
    ( $( $e:expr ),+ $(,)? ) => {{
        let mut v = ::std::vec::Vec::new();
        $(
            v.extend($crate::blocks::SortOrder::from($e).into_iter());
        )+
        $crate::blocks::SortOrder::from(v)
    }};
    () => {
        $crate::blocks::SortOrder::default()
    };
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[default]
	Asc,
	Desc,
}

impl FromStr for SortDirection {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"asc" => Ok(Self::Asc),
			"desc" => Ok(Self::Desc),
			_ => Err(Error::InvalidSortOrder(s.to_owned())),
		}
	}
}

impl fmt::Display for SortDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Asc => f.write_str("ASC"),
			Self::Desc => f.write_str("DESC"),
		}
	}
}

/// Single sort key. Construction from strings rejects anything but
/// `asc`/`desc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOptions {
	pub order_by:   String,
	pub sort_order: SortDirection,
}

impl SortOptions {
	pub fn new(order_by: impl Into<String>, sort_order: &str) -> Result<Self> {
		let order_by = order_by.into();
		if order_by.is_empty() {
			return Err(Error::InvalidSortOrder(
				"sort column must not be empty".into(),
			));
		}

		Ok(Self {
			order_by,
			sort_order: sort_order.parse()?,
		})
	}

	pub fn asc(order_by: impl Into<String>) -> Self {
		Self {
			order_by:   order_by.into(),
			sort_order: SortDirection::Asc,
		}
	}

	pub fn desc(order_by: impl Into<String>) -> Self {
		Self {
			order_by:   order_by.into(),
			sort_order: SortDirection::Desc,
		}
	}
}

#[derive(PartialEq, Eq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortOrder(pub Vec<SortOptions>);

impl SortOrder {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn write<W: SqlWrite>(&self, w: &mut W) {
		for (i, s) in self.0.iter().enumerate() {
			if i > 0 {
				w.push(", ");
			}
			w.push_ident(&s.order_by);
			w.push(" ");
			w.push(&s.sort_order.to_string());
		}
	}
}

impl From<SortOptions> for SortOrder {
	fn from(s: SortOptions) -> Self {
		Self(vec![s])
	}
}

impl From<Vec<SortOptions>> for SortOrder {
	fn from(v: Vec<SortOptions>) -> Self {
		Self(v)
	}
}

impl From<SortOrder> for Vec<SortOptions> {
	fn from(value: SortOrder) -> Self {
		value.0
	}
}

impl std::iter::IntoIterator for SortOrder {
	type Item = SortOptions;
	type IntoIter = ::std::vec::IntoIter<SortOptions>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
