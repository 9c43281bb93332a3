//! Pagination positions and per-stage paging options.
//!
//! Two cursor styles are supported and treated uniformly by the
//! [`Pager`](crate::Pager):
//!
//! - **Page number**: 1-based page plus page size. Page `0` is terminal.
//! - **Continuation token**: an opaque string handed back by the server.
//!   The empty token is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Position from which a paginated fetch resumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Offset pagination: `number` is 1-based, `0` means no further data.
    Page { number: u32, size: u32 },
    /// Keyset pagination: opaque token, empty means no further data.
    Token(String),
}

impl Cursor {
    /// First page with the given size.
    #[must_use]
    pub const fn first_page(size: u32) -> Self {
        Self::Page { number: 1, size }
    }

    /// Terminal page-number cursor.
    #[must_use]
    pub const fn end_of_pages(size: u32) -> Self {
        Self::Page { number: 0, size }
    }

    /// Terminal continuation-token cursor.
    #[must_use]
    pub const fn end_of_tokens() -> Self {
        Self::Token(String::new())
    }

    /// `true` when no further data can be fetched from this position.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Page { number, .. } => *number == 0,
            Self::Token(token) => token.is_empty(),
        }
    }

    /// Terminal cursor of the same style as `self`.
    #[must_use]
    pub fn terminal(&self) -> Self {
        match self {
            Self::Page { size, .. } => Self::end_of_pages(*size),
            Self::Token(_) => Self::end_of_tokens(),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page { number, size } => write!(f, "page {number} (per_page {size})"),
            Self::Token(token) if token.is_empty() => f.write_str("token <end>"),
            Self::Token(token) => write!(f, "token {token}"),
        }
    }
}

/// Items returned by one fetch call, plus where to resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    /// Items of this page, in server order.
    pub items: Vec<T>,
    /// Where the following request resumes.
    pub next: Cursor,
    /// `true` when `next` is terminal.
    pub exhausted: bool,
}

impl<T> PageResult<T> {
    /// Build a page whose `exhausted` flag follows `next.is_terminal()`.
    #[must_use]
    pub fn new(items: Vec<T>, next: Cursor) -> Self {
        let exhausted = next.is_terminal();
        Self {
            items,
            next,
            exhausted,
        }
    }

    /// Final page: no further fetch is needed regardless of `next`.
    #[must_use]
    pub fn last(items: Vec<T>, next: Cursor) -> Self {
        Self {
            items,
            next,
            exhausted: true,
        }
    }

    /// Keep the pagination data while transforming the items.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
            exhausted: self.exhausted,
        }
    }
}

/// Paging configuration handed to a single [`Pager`](crate::Pager).
///
/// Values are constructed per search and moved into each pager; nothing
/// reads paging defaults from shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingOptions {
    page_size: u32,
    start: Option<Cursor>,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            start: None,
        }
    }
}

impl PagingOptions {
    /// Options with the default page size, starting at the first page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when `size` is zero.
    pub fn with_page_size(mut self, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidOptions(
                "page size must be at least 1".to_string(),
            ));
        }
        self.page_size = size;
        Ok(self)
    }

    /// Start from an explicit cursor instead of the first page.
    #[must_use]
    pub fn with_start(mut self, cursor: Cursor) -> Self {
        self.start = Some(cursor);
        self
    }

    /// Items requested per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Cursor the first fetch is issued with.
    #[must_use]
    pub fn initial_cursor(&self) -> Cursor {
        self.start
            .clone()
            .unwrap_or_else(|| Cursor::first_page(self.page_size))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn terminal_values() {
        assert!(Cursor::end_of_pages(10).is_terminal());
        assert!(Cursor::end_of_tokens().is_terminal());
        assert!(!Cursor::first_page(10).is_terminal());
        assert!(!Cursor::Token("abc".into()).is_terminal());
        assert_eq!(
            Cursor::Token("abc".into()).terminal(),
            Cursor::end_of_tokens()
        );
        assert_eq!(Cursor::first_page(5).terminal(), Cursor::end_of_pages(5));
    }

    #[test]
    fn page_result_derives_exhaustion() {
        let page = PageResult::new(vec![1, 2], Cursor::Page { number: 2, size: 2 });
        assert!(!page.exhausted);
        let page = PageResult::new(vec![3], Cursor::end_of_pages(2));
        assert!(page.exhausted);
        let page = PageResult::last(vec![4], Cursor::Token("more".into()));
        assert!(page.exhausted);
    }

    #[test]
    fn paging_options_defaults() {
        let opts = PagingOptions::default();
        assert_eq!(opts.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(opts.initial_cursor(), Cursor::first_page(10));
    }

    #[test]
    fn paging_options_rejects_zero_page_size() {
        let err = PagingOptions::new().with_page_size(0).unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[test]
    fn paging_options_start_cursor() {
        let opts = PagingOptions::new()
            .with_page_size(25)
            .unwrap()
            .with_start(Cursor::Token("t0".into()));
        assert_eq!(opts.initial_cursor(), Cursor::Token("t0".into()));
        assert_eq!(opts.page_size(), 25);
    }
}
