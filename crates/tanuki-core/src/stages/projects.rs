use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::StageContext;
use crate::{BatchSource, Group, Pager, PagingOptions, Project, Result};

/// Lists the projects of every group an upstream source produces.
///
/// Groups are drained one at a time, in the order they arrive, each through
/// a fresh pager.
pub struct ProjectEnumerator<S> {
    upstream: S,
    ctx: StageContext,
    options: PagingOptions,
    pending: VecDeque<Group>,
    current: Option<Pager<Project>>,
    upstream_done: bool,
    finished: bool,
}

impl<S> ProjectEnumerator<S>
where
    S: BatchSource<Group>,
{
    /// List the projects of every group `upstream` yields.
    pub fn new(upstream: S, ctx: &StageContext, options: PagingOptions) -> Self {
        Self {
            upstream,
            ctx: ctx.clone(),
            options,
            pending: VecDeque::new(),
            current: None,
            upstream_done: false,
            finished: false,
        }
    }

    fn open(&self, group: &Group) -> Pager<Project> {
        let api = Arc::clone(&self.ctx.api);
        let retry = self.ctx.retry;
        let group_id = group.id;
        Pager::new(self.options.clone(), self.ctx.cancel.clone(), move |cursor| {
            let api = Arc::clone(&api);
            async move {
                retry
                    .run("project listing", || {
                        api.list_group_projects(group_id, cursor.clone())
                    })
                    .await
            }
        })
        .with_label(format!("projects of group {} ({})", group.name, group.id))
    }
}

#[async_trait]
impl<S> BatchSource<Project> for ProjectEnumerator<S>
where
    S: BatchSource<Group>,
{
    async fn next_batch(&mut self) -> Result<Option<Vec<Project>>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if let Some(pager) = self.current.as_mut() {
                let outcome = pager.next_batch().await;
                match outcome {
                    Ok(Some(projects)) => return Ok(Some(projects)),
                    Ok(None) => self.current = None,
                    Err(err) if self.ctx.failure_policy.isolates(&err) => {
                        warn!("skipping group after project listing failed: {err}");
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

            if let Some(group) = self.pending.pop_front() {
                info!(group = %group.name, id = group.id, "enumerating projects");
                self.current = Some(self.open(&group));
                continue;
            }

            if self.upstream_done {
                self.finished = true;
                return Ok(None);
            }

            match self.upstream.next_batch().await {
                Ok(Some(groups)) => self.pending.extend(groups),
                Ok(None) => self.upstream_done = true,
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                },
            }
        }
    }
}
