//! The three pagination stages of a search.
//!
//! Each stage owns at most one live [`Pager`](crate::Pager) at a time and only
//! fetches when its consumer asks for the next item. Upstream stages are
//! reached through [`BatchSource`](crate::BatchSource), so a stage can be fed
//! by another stage, by a queue, or by a fixed list in tests.

mod blobs;
mod groups;
mod projects;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{Error, RemoteApi, RetryPolicy};

pub use blobs::BlobSearcher;
pub use groups::GroupResolver;
pub use projects::ProjectEnumerator;

/// What happens when fetching one group's projects or one project's blobs fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failure anywhere ends the whole search.
    #[default]
    FailFast,
    /// Skip the failing group or project and continue with its siblings.
    ///
    /// Authentication and configuration errors still end the search, and so
    /// does a failure of the group search itself.
    IsolateBranch,
}

impl FailurePolicy {
    pub(crate) const fn isolates(self, err: &Error) -> bool {
        matches!(self, Self::IsolateBranch) && !err.is_always_fatal()
    }
}

/// Collaborators shared by every stage of one search.
#[derive(Clone)]
pub struct StageContext {
    /// Remote service every stage calls.
    pub api: Arc<dyn RemoteApi>,
    /// Retry wrapped around each fetch.
    pub retry: RetryPolicy,
    /// Shared token stopping every pager.
    pub cancel: CancellationToken,
    /// Fail fast or skip failing branches.
    pub failure_policy: FailurePolicy,
}

impl StageContext {
    /// Context with the default retry and failure policies.
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>, cancel: CancellationToken) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            cancel,
            failure_policy: FailurePolicy::default(),
        }
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
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("retry", &self.retry)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}
