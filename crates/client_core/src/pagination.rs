//! Paged blog feed: one cursor per feed view, strictly sequential fetches.

use std::{num::NonZeroU32, ops::Range, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::GatewayError,
    gateway::ContentGateway,
    sink::{PresentationSink, LOADING_LABEL, LOAD_MORE_LABEL, LOAD_RETRY_LABEL},
};

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    page: u32,
    page_size: NonZeroU32,
    exhausted: bool,
    loading: bool,
    torn_down: bool,
}

impl FeedCursor {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            page: 1,
            page_size,
            exhausted: false,
            loading: false,
            torn_down: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Item offsets covered by the next request.
    pub fn next_range(&self) -> Range<u64> {
        let size = u64::from(self.page_size.get());
        let start = u64::from(self.page - 1) * size;
        start..start + size
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// A fetch was already in flight, the feed is exhausted, or the view is gone.
    Skipped,
    Appended {
        page: u32,
        count: usize,
        exhausted: bool,
    },
    /// The cursor is unchanged; the same call may be retried.
    Failed(GatewayError),
    /// The view was torn down while the request was in flight.
    Discarded,
}

pub struct PaginationController {
    gateway: Arc<dyn ContentGateway>,
    sink: Arc<dyn PresentationSink>,
    cursor: Mutex<FeedCursor>,
}

impl PaginationController {
    pub fn new(
        gateway: Arc<dyn ContentGateway>,
        sink: Arc<dyn PresentationSink>,
        page_size: NonZeroU32,
    ) -> Self {
        Self {
            gateway,
            sink,
            cursor: Mutex::new(FeedCursor::new(page_size)),
        }
    }

    pub async fn cursor(&self) -> FeedCursor {
        self.cursor.lock().await.clone()
    }

    pub async fn load_next_page(&self) -> LoadOutcome {
        let (page, page_size) = {
            let mut cursor = self.cursor.lock().await;
            if cursor.loading || cursor.exhausted || cursor.torn_down {
                debug!(
                    loading = cursor.loading,
                    exhausted = cursor.exhausted,
                    "skipping feed page load"
                );
                return LoadOutcome::Skipped;
            }
            cursor.loading = true;
            (cursor.page, cursor.page_size.get())
        };

        self.sink.set_loading_label(LOADING_LABEL);
        let result = self.gateway.list_posts(page, page_size).await;

        let mut cursor = self.cursor.lock().await;
        cursor.loading = false;
        if cursor.torn_down {
            debug!(page, "dropping feed page for torn down view");
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(posts) => {
                let count = posts.len();
                self.sink.append_items(&posts);
                if count < page_size as usize {
                    cursor.exhausted = true;
                    self.sink.hide_load_more();
                } else {
                    self.sink.set_loading_label(LOAD_MORE_LABEL);
                }
                cursor.page += 1;
                info!(page, count, exhausted = cursor.exhausted, "feed page appended");
                LoadOutcome::Appended {
                    page,
                    count,
                    exhausted: cursor.exhausted,
                }
            }
            Err(err) => {
                warn!(page, error = %err, "feed page load failed");
                self.sink.set_loading_label(LOAD_RETRY_LABEL);
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Detaches the controller from its view. Later loads are skipped and
    /// responses still in flight are dropped without touching the sink.
    pub async fn teardown(&self) {
        self.cursor.lock().await.torn_down = true;
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
