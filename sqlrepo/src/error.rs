use std::fmt;

use thiserror::Error;

/// Operation a repository was performing when the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
	FindById,
	FindWhere,
	Get,
	Page,
	CursorPage,
	Count,
	GetWith,
	Create,
	Update,
	Delete,
}

impl fmt::Display for RepositoryOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::FindById => write!(f, "find_by_id"),
			Self::FindWhere => write!(f, "find_where"),
			Self::Get => write!(f, "get"),
			Self::Page => write!(f, "page"),
			Self::CursorPage => write!(f, "cursor_page"),
			Self::Count => write!(f, "count"),
			Self::GetWith => write!(f, "get_with"),
			Self::Create => write!(f, "create"),
			Self::Update => write!(f, "update"),
			Self::Delete => write!(f, "delete"),
		}
	}
}

/// Failure talking to a [`crate::cache::CacheStore`].
#[derive(Debug, Error)]
#[error("cache {operation} failed for key `{key}`: {message}")]
pub struct CacheError {
	pub operation: &'static str,
	pub key:       String,
	pub message:   String,
}

#[derive(Debug, Error)]
pub enum Error {
	/// Filter input is malformed, fails validation or names an unknown
	/// relation. Raised before any SQL executes.
	#[error("{entity}: bad criteria: {reason}")]
	BadCriteria {
		entity: &'static str,
		reason: String,
	},

	#[error("{entity}: no record found for id [{id}]")]
	NotFound { entity: &'static str, id: String },

	/// Unexpected store failure, or a write the store reported as a no-op.
	#[error("{entity}: {message} ({operation})")]
	Repository {
		entity:    &'static str,
		operation: RepositoryOperation,
		message:   String,
		#[source]
		source:    Option<sqlx::Error>,
	},

	#[error("{entity}: {feature} is not implemented")]
	NotImplemented {
		entity:  &'static str,
		feature: String,
	},

	#[error("invalid sort order: {0}")]
	InvalidSortOrder(String),

	#[error("invalid paging request: {0}")]
	InvalidPaging(String),

	/// Startup wiring is inconsistent (registry, relations, entity meta).
	#[error("invalid repository configuration: {0}")]
	InvalidConfiguration(String),

	#[error(transparent)]
	Config(#[from] Box<figment::Error>),

	#[error(transparent)]
	Cache(#[from] CacheError),

	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}

impl Error {
	pub fn bad_criteria(entity: &'static str, reason: impl Into<String>) -> Self {
		Self::BadCriteria {
			entity,
			reason: reason.into(),
		}
	}

	pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
		Self::NotFound {
			entity,
			id: id.to_string(),
		}
	}

	pub fn repository(
		entity: &'static str,
		operation: RepositoryOperation,
		message: impl Into<String>,
	) -> Self {
		Self::Repository {
			entity,
			operation,
			message: message.into(),
			source: None,
		}
	}

	pub fn store(
		entity: &'static str,
		operation: RepositoryOperation,
		source: sqlx::Error,
	) -> Self {
		Self::Repository {
			entity,
			operation,
			message: source.to_string(),
			source: Some(source),
		}
	}

	pub fn not_implemented(
		entity: &'static str,
		feature: impl Into<String>,
	) -> Self {
		Self::NotImplemented {
			entity,
			feature: feature.into(),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	pub fn is_bad_criteria(&self) -> bool {
		matches!(self, Self::BadCriteria { .. })
	}
}

impl From<figment::Error> for Error {
	fn from(e: figment::Error) -> Self {
		Self::Config(Box::new(e))
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
