use sqlrepo_traits::{
	quote_ident,
	SqlWrite,
	Value,
};

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Sql(String),
	Bind(Value),
}

/// Recorded SQL with its binds, replayed into a writer later. Used for
/// select-list expressions that are assembled before the statement exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment(Vec<Token>);

impl SqlFragment {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rendered text with binds numbered from `$1`.
	pub fn sql(&self) -> String {
		let mut out = String::new();
		let mut n = 0;

		for t in &self.0 {
			match t {
				Token::Sql(s) => out.push_str(s),
				Token::Bind(_) => {
					n += 1;
					out.push_str(&format!("${n}"));
				}
			}
		}

		out
	}

	pub fn params(&self) -> Vec<&Value> {
		self.0
			.iter()
			.filter_map(|t| match t {
				Token::Bind(v) => Some(v),
				Token::Sql(_) => None,
			})
			.collect()
	}

	pub fn write<W: SqlWrite>(&self, w: &mut W) {
		for t in &self.0 {
			match t {
				Token::Sql(s) => w.push(s),
				Token::Bind(v) => w.bind(v),
			}
		}
	}
}

impl SqlWrite for SqlFragment {
	fn push(&mut self, s: &str) {
		match self.0.last_mut() {
			Some(Token::Sql(last)) => last.push_str(s),
			_ => self.0.push(Token::Sql(s.to_owned())),
		}
	}

	fn bind(&mut self, value: &Value) {
		self.0.push(Token::Bind(value.clone()));
	}

	fn push_ident(&mut self, ident: &str) {
		self.push(&quote_ident(ident));
	}
}
