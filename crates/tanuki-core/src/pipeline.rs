//! Wiring the three stages into one search.
//!
//! [`search`] builds the default, pull-based pipeline: nothing is fetched
//! until the returned [`SearchChain`] is asked for a match, traversal is
//! depth-first (group, then project, then blob page), and dropping the chain
//! or cancelling the token stops every further request.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::TryStreamExt;
//! use tanuki_core::{GitlabClient, SearchRequest, pipeline};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> tanuki_core::Result<()> {
//! let api = Arc::new(GitlabClient::new("https://gitlab.com", None)?);
//! let request = SearchRequest::new("Backend", "hello_there");
//! let mut matches = Box::pin(pipeline::search(api, request, CancellationToken::new())?.into_stream());
//! while let Some(composed) = matches.try_next().await? {
//!     println!("{} matches in {}", composed.blobs.len(), composed.project.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::stages::{BlobSearcher, FailurePolicy, GroupResolver, ProjectEnumerator, StageContext};
use crate::{Error, PagingOptions, RemoteApi, Result, RetryPolicy};

/// The default pipeline: blob search fed by project listing fed by group search.
pub type SearchChain = BlobSearcher<ProjectEnumerator<GroupResolver>>;

/// Paging options for each stage, set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Paging of the group search.
    pub groups: PagingOptions,
    /// Paging of each group's project list.
    pub projects: PagingOptions,
    /// Paging of each project's blob search.
    pub blobs: PagingOptions,
}

impl StageOptions {
    /// Same options for all three stages.
    #[must_use]
    pub fn uniform(options: &PagingOptions) -> Self {
        Self {
            groups: options.clone(),
            projects: options.clone(),
            blobs: options.clone(),
        }
    }
}

/// Everything one search invocation needs besides the remote client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Group name fragment; empty matches every visible group.
    pub group: String,
    /// Text searched for in project blobs.
    pub query: String,
    /// Per-stage paging.
    pub stages: StageOptions,
    /// Retry applied to every remote call.
    pub retry: RetryPolicy,
    /// What a failing group or project branch does to the search.
    pub failure_policy: FailurePolicy,
}

impl SearchRequest {
    /// Search `query` in the projects of groups matching `group`.
    #[must_use]
    pub fn new(group: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            query: query.into(),
            stages: StageOptions::default(),
            retry: RetryPolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Use `size` items per page in every stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when `size` is zero.
    pub fn with_page_size(mut self, size: u32) -> Result<Self> {
        let options = PagingOptions::new().with_page_size(size)?;
        self.stages = StageOptions::uniform(&options);
        Ok(self)
    }

    /// Use distinct paging per stage.
    #[must_use]
    pub fn with_stages(mut self, stages: StageOptions) -> Self {
        self.stages = stages;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidOptions(
                "search query must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn context(&self, api: Arc<dyn RemoteApi>, cancel: CancellationToken) -> StageContext {
        StageContext::new(api, cancel)
            .with_retry(self.retry)
            .with_failure_policy(self.failure_policy)
    }
}

/// Build the lazy, depth-first search pipeline.
///
/// # Errors
///
/// Returns [`Error::InvalidOptions`] for an empty query. Remote errors are
/// reported by the returned chain as it is consumed.
pub fn search(
    api: Arc<dyn RemoteApi>,
    request: SearchRequest,
    cancel: CancellationToken,
) -> Result<SearchChain> {
    request.validate()?;
    let ctx = request.context(api, cancel);
    let groups = GroupResolver::new(&ctx, request.group, request.stages.groups);
    let projects = ProjectEnumerator::new(groups, &ctx, request.stages.projects);
    Ok(BlobSearcher::new(
        projects,
        &ctx,
        request.query,
        request.stages.blobs,
    ))
}
