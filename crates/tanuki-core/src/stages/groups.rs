use std::sync::Arc;

use async_trait::async_trait;

use super::StageContext;
use crate::{BatchSource, Group, Pager, PagingOptions, Result};

/// Resolves a name fragment to batches of matching groups.
#[derive(Debug)]
pub struct GroupResolver {
    pager: Pager<Group>,
}

impl GroupResolver {
    /// Page through the groups whose name matches `query`.
    #[must_use]
    pub fn new(ctx: &StageContext, query: impl Into<String>, options: PagingOptions) -> Self {
        let query: Arc<str> = Arc::from(query.into());
        let api = Arc::clone(&ctx.api);
        let retry = ctx.retry;
        let label = format!("groups matching {query:?}");
        let pager = Pager::new(options, ctx.cancel.clone(), move |cursor| {
            let api = Arc::clone(&api);
            let query = Arc::clone(&query);
            async move {
                retry
                    .run("group search", || api.search_groups(&query, cursor.clone()))
                    .await
            }
        })
        .with_label(label);
        Self { pager }
    }
}

#[async_trait]
impl BatchSource<Group> for GroupResolver {
    async fn next_batch(&mut self) -> Result<Option<Vec<Group>>> {
        self.pager.next_batch().await
    }
}
