//! Home page digest: one section per topic with its latest articles.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shared::protocol::{Article, Topic};
use tracing::{info, warn};

use crate::{error::GatewayError, gateway::ContentGateway};

const RECENT_WINDOW_DAYS: i64 = 3;
const MAX_PREVIOUS_ARTICLES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSection {
    pub topic: Topic,
    pub latest: Article,
    /// Up to three earlier articles from the last three days, newest first.
    pub previous: Vec<Article>,
}

impl TopicSection {
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        std::iter::once(&self.latest).chain(self.previous.iter())
    }
}

/// Builds a section from a topic's articles, in any order. `None` when the
/// topic has nothing to show.
pub fn build_section(
    topic: Topic,
    mut articles: Vec<Article>,
    now: DateTime<Utc>,
) -> Option<TopicSection> {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut articles = articles.into_iter();
    let latest = articles.next()?;
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let previous = articles
        .filter(|article| article.created_at >= cutoff)
        .take(MAX_PREVIOUS_ARTICLES)
        .collect();
    Some(TopicSection {
        topic,
        latest,
        previous,
    })
}

pub struct TopicDigest {
    gateway: Arc<dyn ContentGateway>,
}

impl TopicDigest {
    pub fn new(gateway: Arc<dyn ContentGateway>) -> Self {
        Self { gateway }
    }

    /// Topic and article failures are logged and leave the affected part out.
    pub async fn build(&self, now: DateTime<Utc>) -> Vec<TopicSection> {
        let mut topics = match self.gateway.list_topics().await {
            Ok(topics) => topics,
            Err(err) => {
                warn!(error = %err, "failed to fetch topics");
                return Vec::new();
            }
        };
        topics.sort_by_key(|topic| topic.id);

        let mut sections = Vec::with_capacity(topics.len());
        for topic in topics {
            let articles = match self.gateway.topic_articles(topic.id).await {
                Ok(articles) => articles,
                Err(err) => {
                    warn!(topic_id = topic.id.0, error = %err, "failed to fetch topic articles");
                    Vec::new()
                }
            };
            if let Some(section) = build_section(topic, articles, now) {
                sections.push(section);
            }
        }
        info!(sections = sections.len(), "topic digest built");
        sections
    }

    /// Full text of an article, fetched only when the listing left it out.
    pub async fn open_article(&self, article: &Article) -> Result<String, GatewayError> {
        if let Some(content) = &article.content {
            return Ok(content.clone());
        }
        let full = self.gateway.get_article(article.id).await?;
        Ok(full.content.unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "tests/digest_tests.rs"]
mod tests;
