use std::collections::VecDeque;
use std::sync::Arc;

use futures::Stream;
use tracing::{info, warn};

use super::StageContext;
use crate::{BatchSource, Blob, ComposedBlob, Pager, PagingOptions, Project, Result};

struct Branch {
    project: Project,
    pager: Pager<Blob>,
}

/// Searches the blobs of every project an upstream source produces.
///
/// Each non-empty page of matches becomes one [`ComposedBlob`]. Projects
/// without matches produce nothing.
pub struct BlobSearcher<S> {
    upstream: S,
    ctx: StageContext,
    query: Arc<str>,
    options: PagingOptions,
    pending: VecDeque<Project>,
    current: Option<Branch>,
    upstream_done: bool,
    finished: bool,
}

impl<S> BlobSearcher<S>
where
    S: BatchSource<Project>,
{
    /// Search `query` in every project `upstream` yields.
    pub fn new(
        upstream: S,
        ctx: &StageContext,
        query: impl Into<String>,
        options: PagingOptions,
    ) -> Self {
        Self {
            upstream,
            ctx: ctx.clone(),
            query: Arc::from(query.into()),
            options,
            pending: VecDeque::new(),
            current: None,
            upstream_done: false,
            finished: false,
        }
    }

    fn open(&self, project: Project) -> Branch {
        let api = Arc::clone(&self.ctx.api);
        let query = Arc::clone(&self.query);
        let retry = self.ctx.retry;
        let project_id = project.id;
        let pager = Pager::new(self.options.clone(), self.ctx.cancel.clone(), move |cursor| {
            let api = Arc::clone(&api);
            let query = Arc::clone(&query);
            async move {
                retry
                    .run("blob search", || {
                        api.search_project_blobs(project_id, &query, cursor.clone())
                    })
                    .await
            }
        })
        .with_label(format!("blobs of project {} ({})", project.name, project.id));
        Branch { project, pager }
    }

    /// Produce the next batch of matches.
    ///
    /// `Ok(None)` means every project has been searched (or the search was
    /// cancelled); later calls keep returning `Ok(None)` without fetching.
    ///
    /// # Errors
    ///
    /// Returns the first error from any stage, subject to the failure policy.
    pub async fn next_match(&mut self) -> Result<Option<ComposedBlob>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if let Some(branch) = self.current.as_mut() {
                let outcome = branch.pager.next_batch().await;
                match outcome {
                    Ok(Some(blobs)) if blobs.is_empty() => {},
                    Ok(Some(blobs)) => {
                        return Ok(Some(ComposedBlob::new(branch.project.clone(), blobs)));
                    },
                    Ok(None) => self.current = None,
                    Err(err) if self.ctx.failure_policy.isolates(&err) => {
                        warn!("skipping project after blob search failed: {err}");
                        self.current = None;
                    },
                    Err(err) => {
                        self.current = None;
                        self.finished = true;
                        return Err(err);
                    },
                }
                continue;
            }

            if self.ctx.cancel.is_cancelled() {
                self.finished = true;
                return Ok(None);
            }

            if let Some(project) = self.pending.pop_front() {
                info!(project = %project.name, id = project.id, "searching blobs");
                self.current = Some(self.open(project));
                continue;
            }

            if self.upstream_done {
                self.finished = true;
                return Ok(None);
            }

            match self.upstream.next_batch().await {
                Ok(Some(projects)) => self.pending.extend(projects),
                Ok(None) => self.upstream_done = true,
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                },
            }
        }
    }

    /// Turn the searcher into a stream that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ComposedBlob>> + Send
    where
        S: 'static,
    {
        futures::stream::try_unfold(self, |mut searcher| async move {
            Ok(searcher
                .next_match()
                .await?
                .map(|composed| (composed, searcher)))
        })
    }
}
