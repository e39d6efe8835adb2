//! In-memory gateway and sink doubles shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::{
    domain::{ArticleId, Identity, PostId, TopicId, WeeklyTopicId},
    protocol::{Article, BlogPost, PostDetail, SubscriptionRequest, Topic, WeeklyTopic},
};
use tokio::sync::Notify;

use crate::{
    error::GatewayError,
    gateway::ContentGateway,
    identity::{IdentityStore, MemoryIdentityStore},
    sink::{LikeFacet, PresentationSink, ToastKind},
};

pub fn post(id: i64) -> BlogPost {
    BlogPost {
        id: PostId(id),
        title: format!("Post {id}"),
        content: format!("Body of post {id}"),
        image_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap(),
    }
}

pub fn posts(ids: std::ops::Range<i64>) -> Vec<BlogPost> {
    ids.map(post).collect()
}

pub fn article(id: i64, created_at: DateTime<Utc>) -> Article {
    Article {
        id: ArticleId(id),
        title: format!("Article {id}"),
        content: None,
        created_at,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListPosts { page: u32, limit: u32 },
    GetPost(PostId),
    Like(PostId, String),
    Unlike(PostId, String),
    LikesCount(PostId),
    LikeStatus(PostId, String),
    RecentLikers(PostId, u32),
    ListTopics,
    TopicArticles(TopicId),
    GetArticle(ArticleId),
    WeeklyTopics,
    Subscribe(String),
    Unsubscribe(String),
}

impl GatewayCall {
    pub fn is_reconcile_read(&self) -> bool {
        matches!(
            self,
            Self::LikesCount(_) | Self::LikeStatus(..) | Self::RecentLikers(..)
        )
    }

    pub fn is_like_mutation(&self) -> bool {
        matches!(self, Self::Like(..) | Self::Unlike(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListPosts,
    GetPost,
    Like,
    Unlike,
    LikesCount,
    LikeStatus,
    RecentLikers,
    ListTopics,
    TopicArticles,
    GetArticle,
    WeeklyTopics,
    Subscribe,
    Unsubscribe,
}

#[derive(Default)]
struct ScriptState {
    calls: Vec<GatewayCall>,
    pages: VecDeque<Result<Vec<BlogPost>, u16>>,
    likers: Vec<String>,
    failing: HashMap<Op, (u16, Option<String>)>,
    topics: Vec<Topic>,
    articles: HashMap<TopicId, Vec<Article>>,
    full_articles: HashMap<ArticleId, Article>,
    post_titles: HashMap<PostId, String>,
    weekly_topics: Vec<WeeklyTopic>,
}

/// Scripted content API. Likes behave like the real server (one per email,
/// most recent first); every other response is queued or seeded by the test.
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
    page_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: Vec<BlogPost>) {
        self.state.lock().unwrap().pages.push_back(Ok(page));
    }

    pub fn push_page_failure(&self, status: u16) {
        self.state.lock().unwrap().pages.push_back(Err(status));
    }

    pub fn fail(&self, op: Op, status: u16, detail: Option<&str>) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(op, (status, detail.map(str::to_string)));
    }

    pub fn seed_likers(&self, emails: &[&str]) {
        self.state.lock().unwrap().likers = emails.iter().map(|e| e.to_string()).collect();
    }

    pub fn seed_topic(&self, topic: Topic, articles: Vec<Article>) {
        let mut state = self.state.lock().unwrap();
        state.articles.insert(topic.id, articles);
        state.topics.push(topic);
    }

    pub fn seed_full_article(&self, article: Article) {
        self.state
            .lock()
            .unwrap()
            .full_articles
            .insert(article.id, article);
    }

    pub fn seed_post_title(&self, post_id: PostId, title: &str) {
        self.state
            .lock()
            .unwrap()
            .post_titles
            .insert(post_id, title.to_string());
    }

    pub fn seed_weekly_topic(&self, id: i64, name: &str) {
        self.state.lock().unwrap().weekly_topics.push(WeeklyTopic {
            id: WeeklyTopicId(id),
            name: name.to_string(),
        });
    }

    /// Holds every `list_posts` call until released. Returns
    /// `(entered, release)`.
    pub fn gate_list_posts(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.page_gate.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, op: Op, path: &str, call: GatewayCall) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failing.get(&op) {
            Some((status, detail)) => Err(GatewayError::Status {
                path: path.to_string(),
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentGateway for ScriptedGateway {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<BlogPost>, GatewayError> {
        self.record(Op::ListPosts, "/api/blog", GatewayCall::ListPosts { page, limit })?;

        let gate = self.page_gate.lock().unwrap().clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        match self.state.lock().unwrap().pages.pop_front() {
            Some(Ok(posts)) => Ok(posts),
            Some(Err(status)) => Err(GatewayError::Status {
                path: "/api/blog".to_string(),
                status,
                detail: None,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, GatewayError> {
        self.record(Op::GetPost, "/api/blog/{id}", GatewayCall::GetPost(post_id))?;
        let state = self.state.lock().unwrap();
        match state.post_titles.get(&post_id) {
            Some(title) => Ok(PostDetail {
                title: title.clone(),
                content: String::new(),
            }),
            None => Err(GatewayError::Status {
                path: format!("/api/blog/{}", post_id.0),
                status: 404,
                detail: Some("Blog post not found".to_string()),
            }),
        }
    }

    async fn like(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError> {
        let email = identity.as_str().to_string();
        self.record(Op::Like, "/api/blog/{id}/like", GatewayCall::Like(post_id, email.clone()))?;
        let mut state = self.state.lock().unwrap();
        if state.likers.contains(&email) {
            return Err(GatewayError::Status {
                path: format!("/api/blog/{}/like", post_id.0),
                status: 400,
                detail: Some("Post already liked or not found".to_string()),
            });
        }
        state.likers.insert(0, email);
        Ok(())
    }

    async fn unlike(&self, post_id: PostId, identity: &Identity) -> Result<(), GatewayError> {
        let email = identity.as_str().to_string();
        self.record(
            Op::Unlike,
            "/api/blog/{id}/like",
            GatewayCall::Unlike(post_id, email.clone()),
        )?;
        let mut state = self.state.lock().unwrap();
        let before = state.likers.len();
        state.likers.retain(|liker| liker != &email);
        if state.likers.len() == before {
            return Err(GatewayError::Status {
                path: format!("/api/blog/{}/like", post_id.0),
                status: 404,
                detail: Some("Like not found".to_string()),
            });
        }
        Ok(())
    }

    async fn likes_count(&self, post_id: PostId) -> Result<u64, GatewayError> {
        self.record(
            Op::LikesCount,
            "/api/blog/{id}/likes/count",
            GatewayCall::LikesCount(post_id),
        )?;
        Ok(self.state.lock().unwrap().likers.len() as u64)
    }

    async fn like_status(
        &self,
        post_id: PostId,
        identity: &Identity,
    ) -> Result<bool, GatewayError> {
        let email = identity.as_str().to_string();
        self.record(
            Op::LikeStatus,
            "/api/blog/{id}/like-status",
            GatewayCall::LikeStatus(post_id, email.clone()),
        )?;
        Ok(self.state.lock().unwrap().likers.contains(&email))
    }

    async fn recent_likers(
        &self,
        post_id: PostId,
        limit: u32,
    ) -> Result<Vec<Identity>, GatewayError> {
        self.record(
            Op::RecentLikers,
            "/api/blog/{id}/likes/details",
            GatewayCall::RecentLikers(post_id, limit),
        )?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .likers
            .iter()
            .take(limit as usize)
            .map(Identity::new)
            .collect())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError> {
        self.record(Op::ListTopics, "/api/topics", GatewayCall::ListTopics)?;
        Ok(self.state.lock().unwrap().topics.clone())
    }

    async fn topic_articles(&self, topic_id: TopicId) -> Result<Vec<Article>, GatewayError> {
        self.record(
            Op::TopicArticles,
            "/api/newsletters/topic/{id}",
            GatewayCall::TopicArticles(topic_id),
        )?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .articles
            .get(&topic_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_article(&self, article_id: ArticleId) -> Result<Article, GatewayError> {
        self.record(
            Op::GetArticle,
            "/api/newsletters/{id}",
            GatewayCall::GetArticle(article_id),
        )?;
        let state = self.state.lock().unwrap();
        state
            .full_articles
            .get(&article_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                path: format!("/api/newsletters/{}", article_id.0),
                status: 404,
                detail: None,
            })
    }

    async fn weekly_topics(&self) -> Result<Vec<WeeklyTopic>, GatewayError> {
        self.record(
            Op::WeeklyTopics,
            "/api/weekly-newsletter-topics/active",
            GatewayCall::WeeklyTopics,
        )?;
        Ok(self.state.lock().unwrap().weekly_topics.clone())
    }

    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<(), GatewayError> {
        self.record(
            Op::Subscribe,
            "/api/subscriptions/",
            GatewayCall::Subscribe(request.email.clone()),
        )
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), GatewayError> {
        self.record(
            Op::Unsubscribe,
            "/api/subscriptions/{id}/unsubscribe",
            GatewayCall::Unsubscribe(subscription_id.to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Appended(Vec<PostId>),
    LoadingLabel(String),
    LoadMoreHidden,
    Toast(String, ToastKind),
    Pressed(bool),
    LikeCount(u64),
    RecentLikers(Vec<String>),
    FieldError(String, String),
    FacetFallback(LikeFacet),
    ToggleEnabled(bool),
    Prompted,
}

/// Records every sink call and answers identity prompts from a queue.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    prompt_answers: Mutex<VecDeque<Option<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[Option<&str>]) -> Self {
        let sink = Self::default();
        *sink.prompt_answers.lock().unwrap() =
            answers.iter().map(|a| a.map(str::to_string)).collect();
        sink
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn appended(&self) -> Vec<PostId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Appended(ids) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn toasts(&self) -> Vec<(String, ToastKind)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Toast(message, kind) => Some((message, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == SinkEvent::Prompted)
            .count()
    }

    pub fn last_loading_label(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|event| match event {
            SinkEvent::LoadingLabel(label) => Some(label),
            _ => None,
        })
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl PresentationSink for RecordingSink {
    fn append_items(&self, items: &[BlogPost]) {
        self.push(SinkEvent::Appended(items.iter().map(|p| p.id).collect()));
    }

    fn set_loading_label(&self, label: &str) {
        self.push(SinkEvent::LoadingLabel(label.to_string()));
    }

    fn hide_load_more(&self) {
        self.push(SinkEvent::LoadMoreHidden);
    }

    fn show_toast(&self, message: &str, kind: ToastKind) {
        self.push(SinkEvent::Toast(message.to_string(), kind));
    }

    fn set_pressed_state(&self, liked: bool) {
        self.push(SinkEvent::Pressed(liked));
    }

    fn set_like_count(&self, count: u64) {
        self.push(SinkEvent::LikeCount(count));
    }

    fn set_recent_likers(&self, likers: &[Identity]) {
        self.push(SinkEvent::RecentLikers(
            likers.iter().map(|l| l.as_str().to_string()).collect(),
        ));
    }

    fn show_field_error(&self, field: &str, message: &str) {
        self.push(SinkEvent::FieldError(field.to_string(), message.to_string()));
    }

    fn show_facet_fallback(&self, facet: LikeFacet, _message: &str) {
        self.push(SinkEvent::FacetFallback(facet));
    }

    fn set_toggle_enabled(&self, enabled: bool) {
        self.push(SinkEvent::ToggleEnabled(enabled));
    }

    async fn prompt_identity(&self) -> Option<String> {
        self.push(SinkEvent::Prompted);
        self.prompt_answers.lock().unwrap().pop_front().flatten()
    }
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingIdentityStore {
    inner: MemoryIdentityStore,
    saves: AtomicUsize,
}

impl CountingIdentityStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for CountingIdentityStore {
    async fn load(&self) -> Result<Option<Identity>> {
        self.inner.load().await
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(identity).await
    }
}
