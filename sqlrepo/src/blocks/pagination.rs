use serde::{
	Deserialize,
	Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
	/// Offset in pages to start from
	pub page: i64,

	/// Maximum number of elements to return
	pub page_size: i64,
}

impl Default for Pagination {
	fn default() -> Self {
		Self::all()
	}
}

impl Pagination {
	fn all() -> Self {
		Pagination {
			page:      0,
			page_size: i32::MAX as i64,
		}
	}

	pub fn offset(&self) -> i64 {
		self.page.saturating_mul(self.page_size)
	}
}

/// Standard pagination response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub items:       Vec<T>,
	pub page_size:   i64,
	pub page:        i64,
	pub total:       i64,
	pub total_pages: i64,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
		Self {
			items,
			page_size: pagination.page_size,
			page: pagination.page,
			total,
			total_pages: page_count(total, pagination.page_size),
		}
	}
}

/// Pages needed for `total` rows, rounding up without overflowing.
fn page_count(total: i64, page_size: i64) -> i64 {
	if total <= 0 || page_size <= 0 {
		return 0;
	}

	total / page_size + i64::from(total % page_size != 0)
}
