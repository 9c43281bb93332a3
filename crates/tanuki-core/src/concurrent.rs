//! Pipelined variant of the search: one worker per stage, bounded queues between.
//!
//! Network latency of one project's blob search overlaps with listing the
//! next page of projects. With a single worker per stage and FIFO queues the
//! output order is the same as [`pipeline::search`](crate::pipeline::search).
//!
//! Guarantees:
//! - each queue has one writer, and its sender is dropped exactly once when
//!   that worker returns;
//! - a failing worker cancels the shared token before returning, and every
//!   send or receive races that token, so no worker waits on an abandoned queue;
//! - [`run_concurrent`] joins every worker before it returns.

use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::pipeline::SearchRequest;
use crate::stages::{BlobSearcher, GroupResolver, ProjectEnumerator};
use crate::{BatchSource, ComposedBlob, Error, Group, Project, RemoteApi, Result};

/// Default number of batches buffered between two stages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Tuning for [`run_concurrent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentOptions {
    /// Batches buffered between two stages (at least one).
    pub queue_capacity: usize,
}

impl Default for ConcurrentOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Upstream fed by another stage's worker through a queue.
pub struct ChannelSource<T> {
    rx: mpsc::Receiver<Vec<T>>,
    cancel: CancellationToken,
}

impl<T> ChannelSource<T> {
    /// Read batches from `rx` until it closes or `cancel` fires.
    #[must_use]
    pub const fn new(rx: mpsc::Receiver<Vec<T>>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }
}

#[async_trait]
impl<T: Send> BatchSource<T> for ChannelSource<T> {
    async fn next_batch(&mut self) -> Result<Option<Vec<T>>> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Ok(None),
            batch = self.rx.recv() => Ok(batch),
        }
    }
}

/// Send unless the pipeline was cancelled; `false` means stop producing.
async fn forward<T>(tx: &mpsc::Sender<T>, item: T, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

async fn pump_batches<T, S>(
    stage: &'static str,
    mut source: S,
    tx: mpsc::Sender<Vec<T>>,
    cancel: CancellationToken,
) -> Result<()>
where
    T: Send,
    S: BatchSource<T>,
{
    loop {
        match source.next_batch().await {
            Ok(Some(batch)) => {
                if !forward(&tx, batch, &cancel).await {
                    debug!(stage, "downstream closed");
                    cancel.cancel();
                    return Ok(());
                }
            },
            Ok(None) => {
                debug!(stage, "exhausted");
                return Ok(());
            },
            Err(err) => {
                cancel.cancel();
                return Err(err);
            },
        }
    }
}

async fn pump_matches(
    mut searcher: BlobSearcher<ChannelSource<Project>>,
    tx: mpsc::Sender<ComposedBlob>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        match searcher.next_match().await {
            Ok(Some(composed)) => {
                if !forward(&tx, composed, &cancel).await {
                    cancel.cancel();
                    return Ok(());
                }
            },
            Ok(None) => return Ok(()),
            Err(err) => {
                cancel.cancel();
                return Err(err);
            },
        }
    }
}

/// Run the search with one worker per stage and hand each match to `sink`.
///
/// Returning [`ControlFlow::Break`] from the sink stops the search. The call
/// returns the number of matches delivered once every worker has finished.
///
/// # Errors
///
/// Returns the first error raised by any worker; matches delivered before it
/// stay delivered.
pub async fn run_concurrent<F>(
    api: Arc<dyn RemoteApi>,
    request: SearchRequest,
    cancel: CancellationToken,
    options: ConcurrentOptions,
    mut sink: F,
) -> Result<usize>
where
    F: FnMut(ComposedBlob) -> ControlFlow<()>,
{
    request.validate()?;
    let cancel = cancel.child_token();
    let ctx = request.context(api, cancel.clone());
    let capacity = options.queue_capacity.max(1);

    let (group_tx, group_rx) = mpsc::channel::<Vec<Group>>(capacity);
    let (project_tx, project_rx) = mpsc::channel::<Vec<Project>>(capacity);
    let (match_tx, mut match_rx) = mpsc::channel::<ComposedBlob>(capacity);

    let resolver = GroupResolver::new(&ctx, request.group, request.stages.groups);
    let enumerator = ProjectEnumerator::new(
        ChannelSource::new(group_rx, cancel.clone()),
        &ctx,
        request.stages.projects,
    );
    let searcher = BlobSearcher::new(
        ChannelSource::new(project_rx, cancel.clone()),
        &ctx,
        request.query,
        request.stages.blobs,
    );

    let mut workers = JoinSet::new();
    workers.spawn(pump_batches("groups", resolver, group_tx, cancel.clone()));
    workers.spawn(pump_batches("projects", enumerator, project_tx, cancel.clone()));
    workers.spawn(pump_matches(searcher, match_tx, cancel.clone()));

    let mut delivered = 0;
    while let Some(composed) = match_rx.recv().await {
        delivered += 1;
        if sink(composed).is_break() {
            debug!(delivered, "consumer stopped the search");
            cancel.cancel();
            break;
        }
    }
    drop(match_rx);

    let mut first_error = None;
    while let Some(joined) = workers.join_next().await {
        let outcome = joined
            .map_err(|err| Error::Worker(err.to_string()))
            .and_then(|result| result);
        if let Err(err) = outcome {
            cancel.cancel();
            first_error.get_or_insert(err);
        }
    }

    first_error.map_or(Ok(delivered), Err)
}
