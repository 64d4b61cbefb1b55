//! Paged query primitive.
//!
//! Pages are 1-based. Out-of-range page numbers are clamped rather than
//! rejected, and a page past the end is simply empty, so callers can page
//! blindly and still get the correct total.

use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Escape character used in generated LIKE patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Result ordering for paged queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending by surrogate key.
    #[default]
    Id,
    /// Ascending by business key, surrogate key as tie-breaker.
    Name,
}

/// A request for one page of results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
    order: SortOrder,
}

impl Page {
    /// Create a page request. Numbers below 1 become 1; a size of 0 falls back
    /// to the default and sizes above the maximum are clamped.
    pub fn new(number: i64, size: u32) -> Self {
        let number = number.clamp(1, i64::from(u32::MAX)) as u32;
        let size = match size {
            0 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Self {
            number,
            size,
            order: SortOrder::Id,
        }
    }

    /// First page with the given size.
    pub fn first(size: u32) -> Self {
        Self::new(1, size)
    }

    /// Same page with a different ordering.
    pub fn ordered_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Rows to skip, for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    /// Rows to take, for SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total number of matches ignoring paging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedList<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: Page) -> Self {
        Self {
            items,
            total_count,
            page: page.number(),
            page_size: page.size(),
        }
    }

    /// Convert every item, keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> PagedList<U>
    where
        F: FnMut(T) -> U,
    {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages needed to show every match.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }
}

/// Build a LIKE pattern from free-text search input.
///
/// `*` acts as a wildcard and anchors the pattern; without it the input is
/// matched as a substring. `%` and `_` are escaped with [`LIKE_ESCAPE`].
pub fn like_pattern(search: &str) -> String {
    let search = search.trim();
    if search.is_empty() {
        return "%".to_string();
    }

    let mut escaped = String::with_capacity(search.len() + 2);
    for c in search.chars() {
        match c {
            '%' | '_' | LIKE_ESCAPE => {
                escaped.push(LIKE_ESCAPE);
                escaped.push(c);
            }
            '*' => escaped.push('%'),
            _ => escaped.push(c),
        }
    }

    if search.contains('*') {
        escaped
    } else {
        format!("%{escaped}%")
    }
}

/// SQL `LIMIT` for flat listings where `0` means unlimited.
pub fn listing_limit(limit: u32) -> i64 {
    if limit == 0 { -1 } else { i64::from(limit) }
}
