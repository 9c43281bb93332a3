//! Lazy, single-use pagination over a remote list endpoint.
//!
//! A [`Pager`] wraps a fetch function `(Cursor) -> Result<PageResult<T>>` and
//! hands out one batch per [`Pager::next_batch`] call:
//!
//! ```text
//! Ready(cursor) --fetch--> Ready(next)   more data
//!                      \-> Completed     exhausted
//!                      \-> Failed        fetch error
//!                      \-> Cancelled     token fired
//! ```
//!
//! `Completed`, `Failed` and `Cancelled` are terminal. Completion is reported
//! as `Ok(None)`, never as an error. The pager does not retry; wrap the fetch
//! function with a [`RetryPolicy`](crate::RetryPolicy) for that.

use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Cursor, Error, PageResult, PagingOptions, Result};

/// Boxed fetch function driven by a [`Pager`].
pub type FetchFn<T> = Box<dyn FnMut(Cursor) -> BoxFuture<'static, Result<PageResult<T>>> + Send>;

/// A pull-based sequence of item batches.
///
/// `Ok(Some(batch))` yields data, `Ok(None)` means the sequence is over and
/// `Err` means it failed. After `Ok(None)` or `Err`, implementations must not
/// touch the remote service again.
#[async_trait]
pub trait BatchSource<T: Send>: Send {
    /// Produce the next batch.
    async fn next_batch(&mut self) -> Result<Option<Vec<T>>>;
}

/// Lifecycle of a [`Pager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    /// Next fetch will use this cursor.
    Ready(Cursor),
    /// The endpoint reported the last page.
    Completed,
    /// A fetch failed; the error was returned to the caller.
    Failed,
    /// The cancellation token fired before or during a fetch.
    Cancelled,
}

impl PagerState {
    /// `true` once no further fetch will happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ready(_))
    }
}

/// Drives one fetch function to exhaustion, one batch at a time.
pub struct Pager<T> {
    label: String,
    fetch: FetchFn<T>,
    state: PagerState,
    visited: HashSet<Cursor>,
    cancel: CancellationToken,
}

impl<T> std::fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("label", &self.label)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Pager<T> {
    /// Create a pager starting at `options.initial_cursor()`.
    pub fn new<F, Fut>(options: PagingOptions, cancel: CancellationToken, mut fetch: F) -> Self
    where
        F: FnMut(Cursor) -> Fut + Send + 'static,
        Fut: Future<Output = Result<PageResult<T>>> + Send + 'static,
    {
        Self {
            label: "pager".to_string(),
            fetch: Box::new(move |cursor| Box::pin(fetch(cursor))),
            state: PagerState::Ready(options.initial_cursor()),
            visited: HashSet::new(),
            cancel,
        }
    }

    /// Name used in log lines (e.g. `projects of group 7`).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &PagerState {
        &self.state
    }

    /// Fetch the next batch.
    ///
    /// # Errors
    ///
    /// Returns the fetch function's error, or [`Error::MalformedResponse`]
    /// when the endpoint hands back a cursor that was already visited.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<T>>> {
        let PagerState::Ready(cursor) = &self.state else {
            return Ok(None);
        };
        let cursor = cursor.clone();

        if cursor.is_terminal() {
            self.state = PagerState::Completed;
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            debug!(stage = %self.label, "cancelled before fetch");
            self.state = PagerState::Cancelled;
            return Ok(None);
        }

        debug!(stage = %self.label, %cursor, "fetching page");
        let fetch = (self.fetch)(cursor.clone());
        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = fetch => Some(outcome),
        };

        let page = match outcome {
            None => {
                debug!(stage = %self.label, "cancelled during fetch");
                self.state = PagerState::Cancelled;
                return Ok(None);
            },
            Some(Err(err)) => {
                self.state = PagerState::Failed;
                return Err(err);
            },
            Some(Ok(page)) => page,
        };

        if page.exhausted {
            self.state = PagerState::Completed;
            return Ok((!page.items.is_empty()).then_some(page.items));
        }

        self.visited.insert(cursor);
        if self.visited.contains(&page.next) {
            self.state = PagerState::Failed;
            return Err(Error::MalformedResponse(format!(
                "{} returned an already visited cursor ({})",
                self.label, page.next
            )));
        }

        self.state = PagerState::Ready(page.next);
        Ok(Some(page.items))
    }

    /// Drain every remaining batch into one vector.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; batches read before it are discarded.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            items.extend(batch);
        }
        Ok(items)
    }
}

#[async_trait]
impl<T: Send + 'static> BatchSource<T> for Pager<T> {
    async fn next_batch(&mut self) -> Result<Option<Vec<T>>> {
        Self::next_batch(self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script<T> = Arc<Mutex<VecDeque<Result<PageResult<T>>>>>;

    fn scripted<T: Send + 'static>(
        pages: Vec<Result<PageResult<T>>>,
        options: PagingOptions,
        cancel: CancellationToken,
    ) -> (Pager<T>, Arc<Mutex<Vec<Cursor>>>) {
        let script: Script<T> = Arc::new(Mutex::new(pages.into()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let pager = Pager::new(options, cancel, move |cursor| {
            seen.lock().unwrap().push(cursor);
            let next = script.lock().unwrap().pop_front();
            async move { next.unwrap_or_else(|| panic!("fetch called past the script")) }
        });
        (pager, calls)
    }

    fn page(number: u32) -> Cursor {
        Cursor::Page { number, size: 2 }
    }

    #[tokio::test]
    async fn yields_all_pages_then_completes() {
        let (mut pager, calls) = scripted(
            vec![
                Ok(PageResult::new(vec![1, 2], page(2))),
                Ok(PageResult::new(vec![3, 4], page(3))),
                Ok(PageResult::new(vec![5], page(0))),
            ],
            PagingOptions::new().with_page_size(2).unwrap(),
            CancellationToken::new(),
        );

        assert_eq!(pager.next_batch().await.unwrap(), Some(vec![1, 2]));
        assert_eq!(pager.next_batch().await.unwrap(), Some(vec![3, 4]));
        assert_eq!(pager.next_batch().await.unwrap(), Some(vec![5]));
        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert_eq!(pager.state(), &PagerState::Completed);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![page(1), page(2), page(3)]
        );
    }

    #[tokio::test]
    async fn passes_tokens_through_unchanged() {
        let (pager, calls) = scripted(
            vec![
                Ok(PageResult::new(vec!["a"], Cursor::Token("t1".into()))),
                Ok(PageResult::new(vec!["b"], Cursor::Token("t2".into()))),
                Ok(PageResult::new(vec!["c"], Cursor::end_of_tokens())),
            ],
            PagingOptions::new().with_start(Cursor::Token("t0".into())),
            CancellationToken::new(),
        );

        assert_eq!(pager.collect_all().await.unwrap(), vec!["a", "b", "c"]);
        let tokens: Vec<Cursor> = ["t0", "t1", "t2"]
            .iter()
            .map(|t| Cursor::Token((*t).to_string()))
            .collect();
        assert_eq!(*calls.lock().unwrap(), tokens);
    }

    #[tokio::test]
    async fn empty_result_completes_without_batch() {
        let (mut pager, _) = scripted::<u32>(
            vec![Ok(PageResult::new(vec![], page(0)))],
            PagingOptions::default(),
            CancellationToken::new(),
        );
        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert_eq!(pager.state(), &PagerState::Completed);
    }

    #[tokio::test]
    async fn failure_closes_the_sequence() {
        let (mut pager, calls) = scripted::<u32>(
            vec![
                Ok(PageResult::new(vec![1], page(2))),
                Err(Error::NotFound("group 9".into())),
            ],
            PagingOptions::default(),
            CancellationToken::new(),
        );

        assert_eq!(pager.next_batch().await.unwrap(), Some(vec![1]));
        assert!(matches!(
            pager.next_batch().await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(pager.state(), &PagerState::Failed);
        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_pager_never_fetches() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (mut pager, calls) = scripted::<u32>(vec![], PagingOptions::default(), cancel);

        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert_eq!(pager.state(), &PagerState::Cancelled);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_fetch() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut pager: Pager<u32> =
            Pager::new(PagingOptions::default(), cancel, move |_cursor| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    futures::future::pending::<Result<PageResult<u32>>>().await
                }
            });

        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert_eq!(pager.state(), &PagerState::Cancelled);
    }

    #[tokio::test]
    async fn rejects_repeated_cursor() {
        let (mut pager, _) = scripted(
            vec![
                Ok(PageResult::new(vec![1], Cursor::Token("same".into()))),
                Ok(PageResult::new(vec![2], Cursor::Token("same".into()))),
            ],
            PagingOptions::new().with_start(Cursor::Token("start".into())),
            CancellationToken::new(),
        );

        assert_eq!(pager.next_batch().await.unwrap(), Some(vec![1]));
        let err = pager.next_batch().await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(pager.state(), &PagerState::Failed);
    }

    #[tokio::test]
    async fn terminal_start_cursor_completes_immediately() {
        let (mut pager, calls) = scripted::<u32>(
            vec![],
            PagingOptions::new().with_start(Cursor::end_of_tokens()),
            CancellationToken::new(),
        );
        assert_eq!(pager.next_batch().await.unwrap(), None);
        assert!(calls.lock().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn yields_every_page_in_order(sizes in prop::collection::vec(0usize..5, 1..8)) {
            let total = sizes.len();
            let mut pages = Vec::new();
            let mut expected = Vec::new();
            let mut counter = 0u32;
            for (idx, size) in sizes.iter().enumerate() {
                let items: Vec<u32> = (0..*size).map(|_| { counter += 1; counter }).collect();
                let is_last = idx + 1 == total;
                if !is_last || !items.is_empty() {
                    expected.push(items.clone());
                }
                let next = if is_last {
                    page(0)
                } else {
                    page(u32::try_from(idx).unwrap() + 2)
                };
                pages.push(Ok(PageResult::new(items, next)));
            }

            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let batches = runtime.block_on(async move {
                let (mut pager, _) = scripted(
                    pages,
                    PagingOptions::new().with_page_size(2).unwrap(),
                    CancellationToken::new(),
                );
                let mut batches = Vec::new();
                while let Some(batch) = pager.next_batch().await.unwrap() {
                    batches.push(batch);
                }
                batches
            });
            prop_assert_eq!(batches, expected);
        }
    }
}
