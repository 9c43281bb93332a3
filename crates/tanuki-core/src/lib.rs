//! # tanuki-core
//!
//! Core functionality for tanuki - search code across every project of a GitLab group.
//!
//! A search runs as three chained, independently paginated stages:
//!
//! 1. **Group search**: resolve a name fragment to groups
//! 2. **Project listing**: list the projects of each group
//! 3. **Blob search**: search the files of each project for the query
//!
//! Each stage drives a [`Pager`] per group or project and only fetches when
//! the next stage asks for more, so stopping after the first match stops all
//! network traffic.
//!
//! ## Architecture
//!
//! - **Pagination**: [`Cursor`], [`PageResult`], [`PagingOptions`] and the [`Pager`] engine
//! - **Stages**: [`GroupResolver`], [`ProjectEnumerator`], [`BlobSearcher`]
//! - **Pipelines**: [`pipeline::search`] (lazy, depth-first) and
//!   [`concurrent::run_concurrent`] (one worker per stage)
//! - **Remote access**: the [`RemoteApi`] trait and its [`GitlabClient`] implementation
//! - **Configuration**: [`Config`] file handling
//! - **Error Handling**: [`Error`] with categories and recovery hints
//!
//! ## Error Handling
//!
//! ```rust
//! use tanuki_core::Error;
//!
//! fn describe(err: &Error) -> String {
//!     match err {
//!         Error::Authentication(_) => "check your token".to_string(),
//!         e if e.is_recoverable() => format!("temporary failure: {e}"),
//!         e => format!("{} error: {e}", e.category()),
//!     }
//! }
//! # assert_eq!(describe(&Error::Authentication("401".into())), "check your token");
//! ```

/// Remote operations consumed by the pipeline
pub mod api;
/// Pipelined variant with one worker per stage
pub mod concurrent;
/// Configuration file handling
pub mod config;
/// Pagination cursors and paging options
pub mod cursor;
/// Error types and result aliases
pub mod error;
/// GitLab REST client
pub mod gitlab;
/// Single-use pagination engine
pub mod pager;
/// Default lazy search pipeline
pub mod pipeline;
/// Retry with backoff around remote calls
pub mod retry;
/// Group, project and blob stages
pub mod stages;
/// Core data types
pub mod types;

pub use api::RemoteApi;
pub use concurrent::{ChannelSource, ConcurrentOptions, run_concurrent};
pub use config::{Config, Settings};
pub use cursor::{Cursor, DEFAULT_PAGE_SIZE, PageResult, PagingOptions};
pub use error::{Error, Result};
pub use gitlab::{DEFAULT_SERVER, GitlabClient};
pub use pager::{BatchSource, Pager, PagerState};
pub use pipeline::{SearchChain, SearchRequest, StageOptions, search};
pub use retry::RetryPolicy;
pub use stages::{BlobSearcher, FailurePolicy, GroupResolver, ProjectEnumerator, StageContext};
pub use types::{Blob, ComposedBlob, Group, Project};
