//! Remote content gateway: the REST surface of the content API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ArticleId, Identity, PostId, TopicId},
    error::ApiErrorBody,
    protocol::{
        Article, BlogPage, BlogPost, LikeRequest, LikeStatusResponse, LikesCountResponse,
        LikesDetailsResponse, PostDetail, SubscriptionRequest, Topic, WeeklyTopic,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::GatewayError;

#[async_trait]
pub trait ContentGateway: Send + Sync {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<BlogPost>, GatewayError>;
    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, GatewayError>;
    async fn like(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError>;
    async fn unlike(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError>;
    async fn likes_count(&self, post_id: PostId) -> Result<u64, GatewayError>;
    async fn like_status(&self, post_id: PostId, identity: &Identity)
        -> Result<bool, GatewayError>;
    /// Most recent likers first, at most `limit` entries.
    async fn recent_likers(&self, post_id: PostId, limit: u32)
        -> Result<Vec<Identity>, GatewayError>;
    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError>;
    /// Articles published under a topic. A topic without articles is an empty list.
    async fn topic_articles(&self, topic_id: TopicId) -> Result<Vec<Article>, GatewayError>;
    async fn get_article(&self, article_id: ArticleId) -> Result<Article, GatewayError>;
    /// Topics that currently have a weekly newsletter.
    async fn weekly_topics(&self) -> Result<Vec<WeeklyTopic>, GatewayError>;
    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<(), GatewayError>;
    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), GatewayError>;
}

pub struct HttpContentGateway {
    http: Client,
    base_url: String,
}

impl HttpContentGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        debug!(path, "content api request");
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                path: path.to_string(),
                message: source.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message());
        warn!(path, status = status.as_u16(), ?detail, "content api request rejected");
        Err(GatewayError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, GatewayError> {
        response
            .json::<T>()
            .await
            .map_err(|source| GatewayError::Decode {
                path: path.to_string(),
                message: source.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.send(path, self.http.get(self.url(path))).await?;
        Self::decode(path, response).await
    }
}

#[async_trait]
impl ContentGateway for HttpContentGateway {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<BlogPost>, GatewayError> {
        let path = "/api/blog";
        let request = self
            .http
            .get(self.url(path))
            .query(&[("page", page), ("limit", limit)]);
        let response = self.send(path, request).await?;
        let body: BlogPage = Self::decode(path, response).await?;
        Ok(body.posts)
    }

    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, GatewayError> {
        self.get_json(&format!("/api/blog/{}", post_id.0)).await
    }

    async fn like(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError> {
        let path = format!("/api/blog/{}/like", post_id.0);
        let request = self
            .http
            .post(self.url(&path))
            .query(&[("user_email", identity.as_str())])
            .json(&LikeRequest { post_id });
        self.send(&path, request).await?;
        Ok(())
    }

    async fn unlike(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError> {
        let path = format!("/api/blog/{}/like", post_id.0);
        let request = self
            .http
            .delete(self.url(&path))
            .query(&[("user_email", identity.as_str())])
            .json(&LikeRequest { post_id });
        self.send(&path, request).await?;
        Ok(())
    }

    async fn likes_count(&self, post_id: PostId) -> Result<u64, GatewayError> {
        let body: LikesCountResponse = self
            .get_json(&format!("/api/blog/{}/likes/count", post_id.0))
            .await?;
        Ok(body.likes_count)
    }

    async fn like_status(
        &self,
        post_id: PostId,
        identity: &Identity,
    ) -> Result<bool, GatewayError> {
        let path = format!("/api/blog/{}/like-status", post_id.0);
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("user_email", identity.as_str())]);
        let response = self.send(&path, request).await?;
        let body: LikeStatusResponse = Self::decode(&path, response).await?;
        Ok(body.is_liked)
    }

    async fn recent_likers(
        &self,
        post_id: PostId,
        limit: u32,
    ) -> Result<Vec<Identity>, GatewayError> {
        let path = format!("/api/blog/{}/likes/details", post_id.0);
        let request = self.http.get(self.url(&path)).query(&[("limit", limit)]);
        let response = self.send(&path, request).await?;
        let body: LikesDetailsResponse = Self::decode(&path, response).await?;
        Ok(body
            .likes
            .into_iter()
            .map(|like| Identity::new(like.user_email))
            .collect())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError> {
        self.get_json("/api/topics").await
    }

    async fn topic_articles(&self, topic_id: TopicId) -> Result<Vec<Article>, GatewayError> {
        match self
            .get_json(&format!("/api/newsletters/topic/{}", topic_id.0))
            .await
        {
            Err(err) if err.is_not_found() => {
                debug!(topic_id = topic_id.0, "no articles for topic");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn get_article(&self, article_id: ArticleId) -> Result<Article, GatewayError> {
        self.get_json(&format!("/api/newsletters/{}", article_id.0))
            .await
    }

    async fn weekly_topics(&self) -> Result<Vec<WeeklyTopic>, GatewayError> {
        self.get_json("/api/weekly-newsletter-topics/active").await
    }

    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<(), GatewayError> {
        let path = "/api/subscriptions/";
        self.send(path, self.http.post(self.url(path)).json(request))
            .await?;
        Ok(())
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), GatewayError> {
        let raw = self.url("/api/subscriptions");
        let mut url = Url::parse(&raw).map_err(|_| GatewayError::InvalidUrl(raw.clone()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(raw.clone()))?
            .push(subscription_id)
            .push("unsubscribe");
        let path = url.path().to_string();
        self.send(&path, self.http.put(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
