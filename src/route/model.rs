use serde::Deserialize;

/// The raw `?page=` query parameter.
///
/// It is kept as text because a malformed value is not an error,
/// it simply falls back to the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageInput {
	pub page: Option<String>,
}

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
	count: i64,
	per_page: i64,
}

impl Paginator {
	pub fn new(count: i64, per_page: i64) -> Self {
		Self {
			count: count.max(0),
			per_page: per_page.max(1),
		}
	}

	/// The number of pages, which is at least one even with no items.
	pub fn num_pages(&self) -> i64 {
		((self.count + self.per_page - 1) / self.per_page).max(1)
	}

	/// Resolves a requested page number.
	///
	/// A missing or non-numeric page is the first page, and a page out of
	/// range on either side is the last page.
	pub fn number(&self, requested: Option<&str>) -> i64 {
		let Some(Ok(number)) = requested.map(|page| page.trim().parse::<i64>()) else {
			return 1;
		};

		if number < 1 || number > self.num_pages() {
			self.num_pages()
		} else {
			number
		}
	}

	pub fn offset(&self, number: i64) -> i64 {
		(number - 1) * self.per_page
	}

	pub fn limit(&self) -> i64 {
		self.per_page
	}

	pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
		Page {
			items,
			number,
			num_pages: self.num_pages(),
			count: self.count,
		}
	}
}

/// A link in the page navigation.
#[derive(Debug, PartialEq, Eq)]
pub struct PageLink {
	pub number: i64,
	pub current: bool,
}

/// One page of results.
#[derive(Debug)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub number: i64,
	pub num_pages: i64,
	pub count: i64,
}

impl<T> Page<T> {
	pub fn has_previous(&self) -> bool {
		self.number > 1
	}

	pub fn has_next(&self) -> bool {
		self.number < self.num_pages
	}

	pub fn previous_number(&self) -> i64 {
		self.number - 1
	}

	pub fn next_number(&self) -> i64 {
		self.number + 1
	}

	pub fn has_other_pages(&self) -> bool {
		self.num_pages > 1
	}

	/// Links to the pages within two of the current one.
	pub fn links(&self) -> Vec<PageLink> {
		let first = (self.number - 2).max(1);
		let last = (self.number + 2).min(self.num_pages);

		(first..=last)
			.map(|number| PageLink {
				number,
				current: number == self.number,
			})
			.collect()
	}
}
