//! The remote operations the search pipeline depends on.

use async_trait::async_trait;

use crate::{Blob, Cursor, Group, PageResult, Project, Result};

/// Paginated access to a source-hosting service.
///
/// Implementations must be safe to call concurrently from several pipeline
/// stages; the pipeline only ever issues independent, stateless requests.
/// Each call returns the items for `cursor` together with the cursor the
/// following call should use, in whichever style (page number or token) the
/// endpoint speaks.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Search groups whose name or path matches `query`.
    async fn search_groups(&self, query: &str, cursor: Cursor) -> Result<PageResult<Group>>;

    /// List projects owned by a group.
    async fn list_group_projects(&self, group_id: u64, cursor: Cursor)
    -> Result<PageResult<Project>>;

    /// Search file contents of one project.
    async fn search_project_blobs(
        &self,
        project_id: u64,
        query: &str,
        cursor: Cursor,
    ) -> Result<PageResult<Blob>>;
}
