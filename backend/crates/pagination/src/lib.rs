//! Offset pagination primitives shared by recipe listings.
//!
//! Pages are 1-indexed. [`PageRequest`] stores both the page number and the
//! page size as [`NonZeroU32`], so a zero page or an empty page size cannot
//! be represented once a request exists. [`Page`] is the envelope returned to
//! callers: the items of one page plus the total number of matches.
//!
//! # Examples
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(3, 10).expect("positive page and size");
//! assert_eq!(request.offset(), 20);
//! assert_eq!(request.limit(), 10);
//!
//! let page = Page::new(vec!["a", "b"], 22, request);
//! assert_eq!(page.total_pages(), 3);
//! ```

use std::num::NonZeroU32;

use serde::Serialize;
use thiserror::Error;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(20) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};

/// Errors raised when building a [`PageRequest`] from raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The page number was zero; pages start at 1.
    #[error("page must be a positive integer")]
    ZeroPage,
    /// The page size was zero.
    #[error("page size must be a positive integer")]
    ZeroPageSize,
}

/// A request for one 1-indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: NonZeroU32,
    page_size: NonZeroU32,
}

impl PageRequest {
    /// Validate raw integers into a page request.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either value is zero.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        let Some(page) = NonZeroU32::new(page) else {
            return Err(PageRequestError::ZeroPage);
        };
        let Some(page_size) = NonZeroU32::new(page_size) else {
            return Err(PageRequestError::ZeroPageSize);
        };
        Ok(Self { page, page_size })
    }

    /// Build a request from already non-zero values.
    #[must_use]
    pub const fn from_non_zero(page: NonZeroU32, page_size: NonZeroU32) -> Self {
        Self { page, page_size }
    }

    /// 1-indexed page number.
    #[must_use]
    pub const fn page(self) -> NonZeroU32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn page_size(self) -> NonZeroU32 {
        self.page_size
    }

    /// Number of items to skip before this page starts.
    #[must_use]
    pub fn offset(self) -> u64 {
        (u64::from(self.page.get()) - 1) * u64::from(self.page_size.get())
    }

    /// Number of items to fetch.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.page_size.get()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_non_zero(NonZeroU32::MIN, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results together with the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// Number of items matching the filter across all pages.
    pub total: u64,
    /// 1-indexed page number.
    pub page: NonZeroU32,
    /// Requested page size.
    pub page_size: NonZeroU32,
}

impl<T> Page<T> {
    /// Wrap the items fetched for `request`.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Number of pages needed to show every match.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.get()))
    }

    /// Whether a page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page.get()) < self.total_pages()
    }

    /// Transform every item while keeping the envelope.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
