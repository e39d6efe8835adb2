use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ArticleId, PostId, TopicId, WeeklyTopicId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: PostId,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    /// Listing excerpt: first `max_chars` characters of the body.
    pub fn summary(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPage {
    pub posts: Vec<BlogPost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRequest {
    pub post_id: PostId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikesCountResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    pub likes_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeStatusResponse {
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeDetail {
    pub user_email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikesDetailsResponse {
    #[serde(default)]
    pub likes: Vec<LikeDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub name: String,
    pub email: String,
    pub topic_ids: Vec<TopicId>,
    pub is_active: bool,
}

/// Entry of `GET /api/weekly-newsletter-topics/active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTopic {
    pub id: WeeklyTopicId,
    pub name: String,
}
