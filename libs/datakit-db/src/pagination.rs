//! Offset pagination: input normalization and result metadata.
//!
//! Page and limit values coming from callers are clamped, never rejected:
//! `page < 1` becomes 1, `limit` is forced into `[1, max_limit]`.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not provide one.
pub const DEFAULT_LIMIT: u64 = 20;
/// Upper bound for the page size of a default paginator.
pub const DEFAULT_MAX_LIMIT: u64 = 100;
/// Upper bound used by [`Paginator::large_dataset`].
pub const LARGE_DATASET_MAX_LIMIT: u64 = 50;
/// Upper bound used by [`Paginator::small_dataset`].
pub const SMALL_DATASET_MAX_LIMIT: u64 = 25;

/// Normalized pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u64,
    pub limit: u64,
}

impl PaginationParams {
    #[must_use]
    pub fn offset(&self) -> u64 {
        compute_offset(self.page, self.limit)
    }
}

/// Caller-facing page request; absent fields fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of items plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Convert every item, keeping the metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }

    /// Fallible variant of [`Page::map`].
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page_info: self.page_info,
        })
    }
}

/// Offset of the first row of `page`, saturating on overflow.
#[must_use]
pub fn compute_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}

/// Pagination policy: default page size and hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paginator {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl Paginator {
    #[must_use]
    pub fn new(default_limit: u64, max_limit: u64) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    #[must_use]
    pub fn large_dataset() -> Self {
        Self::new(DEFAULT_LIMIT, LARGE_DATASET_MAX_LIMIT)
    }

    #[must_use]
    pub fn small_dataset() -> Self {
        Self::new(DEFAULT_LIMIT, SMALL_DATASET_MAX_LIMIT)
    }

    fn cap(&self) -> u64 {
        self.max_limit.max(1)
    }

    /// Clamp raw caller input into valid params.
    #[must_use]
    pub fn validate(&self, page: i64, limit: i64) -> PaginationParams {
        PaginationParams {
            page: u64::try_from(page).unwrap_or(0).max(1),
            limit: u64::try_from(limit).unwrap_or(0).clamp(1, self.cap()),
        }
    }

    /// Like [`Paginator::validate`] with defaults for absent values.
    #[must_use]
    pub fn resolve(&self, request: PageRequest) -> PaginationParams {
        let default_limit = self.default_limit.clamp(1, self.cap());
        PaginationParams {
            page: request
                .page
                .map_or(1, |p| u64::try_from(p).unwrap_or(0).max(1)),
            limit: request
                .limit
                .map_or(default_limit, |l| u64::try_from(l).unwrap_or(0).clamp(1, self.cap())),
        }
    }

    /// Metadata for a page; `limit` of zero yields zero pages.
    #[must_use]
    pub fn build_result(&self, page: u64, limit: u64, total: u64) -> PageInfo {
        build_page_info(page, limit, total)
    }
}

/// Free-standing form of [`Paginator::build_result`].
#[must_use]
pub fn build_page_info(page: u64, limit: u64, total: u64) -> PageInfo {
    let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
    PageInfo {
        page,
        limit,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}
