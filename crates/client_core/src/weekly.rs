//! Weekly newsletter menu: the personal diary followed by one rendered
//! newsletter page per active weekly topic.

use std::sync::Arc;

use shared::domain::WeeklyTopicId;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
    error::GatewayError,
    gateway::ContentGateway,
    sink::{PresentationSink, ToastKind},
};

pub const DIARY_LABEL: &str = "My Personal Diary";
pub const WEEKLY_TOPICS_FAILED_MESSAGE: &str = "Failed to load topics. Please try again later.";

#[derive(Debug, Error)]
pub enum WeeklyError {
    #[error("failed to load weekly topics: {0}")]
    Gateway(#[from] GatewayError),
    #[error("failed to build weekly newsletter url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    /// `None` for the diary entry.
    pub topic_id: Option<WeeklyTopicId>,
    pub url: Url,
}

fn site_url(base_url: &str, segments: &[&str]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url.trim_end_matches('/'))?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn diary_url(base_url: &str) -> Result<Url, url::ParseError> {
    site_url(base_url, &["api", "blog"])
}

/// Server-rendered newsletter page for a weekly topic. The id is encoded as
/// a single path segment.
pub fn weekly_render_url(
    base_url: &str,
    topic_id: WeeklyTopicId,
) -> Result<Url, url::ParseError> {
    let id = topic_id.to_string();
    site_url(
        base_url,
        &["api", "weekly-newsletter", "topic", id.as_str(), "render"],
    )
}

pub struct WeeklyMenu {
    gateway: Arc<dyn ContentGateway>,
    sink: Arc<dyn PresentationSink>,
    base_url: String,
}

impl WeeklyMenu {
    pub fn new(
        gateway: Arc<dyn ContentGateway>,
        sink: Arc<dyn PresentationSink>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            sink,
            base_url: base_url.into(),
        }
    }

    /// Diary first, then active topics in server order. A failed topic fetch
    /// is reported on the sink.
    pub async fn load(&self) -> Result<Vec<MenuEntry>, WeeklyError> {
        let topics = match self.gateway.weekly_topics().await {
            Ok(topics) => topics,
            Err(err) => {
                warn!(error = %err, "failed to fetch weekly topics");
                self.sink
                    .show_toast(WEEKLY_TOPICS_FAILED_MESSAGE, ToastKind::Error);
                return Err(err.into());
            }
        };

        let mut entries = Vec::with_capacity(topics.len() + 1);
        entries.push(MenuEntry {
            label: DIARY_LABEL.to_string(),
            topic_id: None,
            url: diary_url(&self.base_url)?,
        });
        for topic in topics {
            entries.push(MenuEntry {
                url: weekly_render_url(&self.base_url, topic.id)?,
                label: topic.name,
                topic_id: Some(topic.id),
            });
        }
        info!(topics = entries.len() - 1, "weekly menu loaded");
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "tests/weekly_tests.rs"]
mod tests;
