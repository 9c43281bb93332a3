//! `tanuki search`: run the pipeline and stream matches to stdout.

use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tanuki_core::{
    ComposedBlob, ConcurrentOptions, FailurePolicy, GitlabClient, RemoteApi, RetryPolicy,
    SearchRequest, Settings, run_concurrent,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::SearchArgs;
use crate::error::Interrupted;
use crate::output::MatchWriter;

/// Execute a search and print every match as it arrives.
pub async fn execute(args: &SearchArgs, settings: &Settings) -> Result<()> {
    let limit = args.max_results.unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(());
    }

    let client = GitlabClient::new(&settings.server, settings.token.as_deref())?
        .with_subgroups(args.include_subgroups)
        .with_keyset_pagination(args.keyset);
    let api: Arc<dyn RemoteApi> = Arc::new(client);
    let request = build_request(args)?;

    // Ctrl-C cancels the parent; reaching `--max-results` only cancels the child.
    let interrupted = CancellationToken::new();
    let cancel = interrupted.child_token();
    let interrupt = cancel_on_interrupt(interrupted.clone());
    let mut writer = MatchWriter::new(args.format, io::stdout());

    let result = if args.concurrent {
        let options = ConcurrentOptions {
            queue_capacity: args.queue_capacity,
        };
        run_pipelined(api, request, cancel, options, limit, &mut writer).await
    } else {
        run_lazy(api, request, cancel, limit, &mut writer).await
    };
    interrupt.abort();

    debug!("{} matching blobs written", writer.blobs_written());
    finish(result, interrupted.is_cancelled())
        .with_context(|| format!("search for '{}' failed", args.query))
}

/// Final outcome of a search run.
///
/// A closed stdout is a normal end; an interrupted run that otherwise
/// succeeded still reports [`Interrupted`] so the exit status is non-zero.
fn finish(result: Result<()>, interrupted: bool) -> Result<()> {
    match result {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
        Ok(()) if interrupted => Err(Interrupted.into()),
        Ok(()) => Ok(()),
    }
}

fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let policy = if args.isolate_failures {
        FailurePolicy::IsolateBranch
    } else {
        FailurePolicy::FailFast
    };
    Ok(SearchRequest::new(&args.group, &args.query)
        .with_page_size(args.per_page)?
        .with_retry(RetryPolicy::default().with_attempts(args.retries.saturating_add(1)))
        .with_failure_policy(policy))
}

/// Drop blobs beyond the requested maximum.
fn clamp(mut composed: ComposedBlob, remaining: usize) -> ComposedBlob {
    composed.blobs.truncate(remaining);
    composed
}

async fn run_lazy<W: Write>(
    api: Arc<dyn RemoteApi>,
    request: SearchRequest,
    cancel: CancellationToken,
    limit: usize,
    writer: &mut MatchWriter<W>,
) -> Result<()> {
    let chain = tanuki_core::search(api, request, cancel.clone())?;
    let mut stream = Box::pin(chain.into_stream());

    while let Some(composed) = stream.next().await {
        let remaining = limit.saturating_sub(writer.blobs_written());
        writer.write(&clamp(composed?, remaining))?;
        if writer.blobs_written() >= limit {
            cancel.cancel();
            break;
        }
    }
    Ok(())
}

async fn run_pipelined<W: Write>(
    api: Arc<dyn RemoteApi>,
    request: SearchRequest,
    cancel: CancellationToken,
    options: ConcurrentOptions,
    limit: usize,
    writer: &mut MatchWriter<W>,
) -> Result<()> {
    let mut failure = None;
    run_concurrent(api, request, cancel, options, |composed| {
        let remaining = limit.saturating_sub(writer.blobs_written());
        if let Err(err) = writer.write(&clamp(composed, remaining)) {
            failure = Some(err);
            return ControlFlow::Break(());
        }
        if writer.blobs_written() >= limit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .await?;
    failure.map_or(Ok(()), Err)
}

/// Cancel the search on Ctrl-C; matches already printed stay printed.
fn cancel_on_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping search");
            cancel.cancel();
        }
    })
}

/// A closed stdout (`tanuki search ... | head`) ends the search quietly.
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::BrokenPipe)
}
