//! Offset/limit pagination types.
//!
//! Listings are paginated with a 1-based page number and a page size. The
//! total count is always the count of all records matching the filter,
//! independent of the requested page window.

use serde::{Deserialize, Serialize};

/// Default page number for listings.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for listings.
pub const DEFAULT_LIMIT: u32 = 10;

/// Sort direction for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// One page of results plus the window-independent totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Builds a page envelope, deriving `total_pages` from `total` and `limit`.
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

/// Number of pages needed to hold `total` records at `limit` per page.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit)) as u32
}

/// Offset of the first record on `page` (1-based) at `limit` per page.
pub fn skip(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}
