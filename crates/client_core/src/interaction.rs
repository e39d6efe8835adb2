//! Like/unlike for a single post, reconciled against the server after every
//! mutation. The sink only ever shows values confirmed by a read.

use std::sync::Arc;

use shared::domain::{Identity, PostId};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::GatewayError,
    gateway::ContentGateway,
    identity::IdentityResolver,
    sink::{LikeFacet, PresentationSink, ToastKind},
};

pub const DEFAULT_RECENT_LIKERS_LIMIT: u32 = 5;
const LIKE_ACTION_FALLBACK: &str = "Failed to process like action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikedState {
    #[default]
    Unknown,
    Liked,
    NotLiked,
}

impl LikedState {
    fn from_server(is_liked: bool) -> Self {
        if is_liked {
            Self::Liked
        } else {
            Self::NotLiked
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeSnapshot {
    pub liked: LikedState,
    pub like_count: Option<u64>,
    pub recent_likers: Vec<Identity>,
}

#[derive(Default)]
struct LikeState {
    snapshot: LikeSnapshot,
    toggling: bool,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub failures: Vec<(LikeFacet, GatewayError)>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, facet: LikeFacet) -> bool {
        self.failures.iter().any(|(failed, _)| *failed == facet)
    }
}

#[derive(Debug)]
pub enum ToggleOutcome {
    /// Prompt cancelled; nothing was sent.
    NoIdentity,
    /// Prompt answered with a malformed address; nothing was sent.
    InvalidIdentity,
    /// Another toggle is still running.
    Busy,
    /// The mutation was rejected; displayed state is unchanged.
    Failed(GatewayError),
    Toggled {
        liked: LikedState,
        reconcile: ReconcileReport,
    },
}

pub struct LikeReconciler {
    post_id: PostId,
    gateway: Arc<dyn ContentGateway>,
    sink: Arc<dyn PresentationSink>,
    identity: IdentityResolver,
    recent_likers_limit: u32,
    state: Mutex<LikeState>,
}

impl LikeReconciler {
    pub fn new(
        post_id: PostId,
        gateway: Arc<dyn ContentGateway>,
        sink: Arc<dyn PresentationSink>,
        identity: IdentityResolver,
    ) -> Self {
        Self {
            post_id,
            gateway,
            sink,
            identity,
            recent_likers_limit: DEFAULT_RECENT_LIKERS_LIMIT,
            state: Mutex::new(LikeState::default()),
        }
    }

    pub fn with_recent_likers_limit(mut self, limit: u32) -> Self {
        self.recent_likers_limit = limit.max(1);
        self
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub async fn snapshot(&self) -> LikeSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Establishes the baseline when the post view opens.
    pub async fn mount(&self) -> ReconcileReport {
        self.reconcile().await
    }

    /// Re-reads count, status and recent likers. Each read is applied or
    /// reported on its own; one failing never blocks the others.
    /// The status read uses the cached identity and is skipped without one.
    pub async fn reconcile(&self) -> ReconcileReport {
        let identity = self.identity.cached().await;
        self.reconcile_as(identity.as_ref()).await
    }

    async fn reconcile_as(&self, identity: Option<&Identity>) -> ReconcileReport {
        let post_id = self.post_id;
        let count = self.gateway.likes_count(post_id);
        let status = async {
            match identity {
                Some(identity) => Some(self.gateway.like_status(post_id, identity).await),
                None => None,
            }
        };
        let likers = self.gateway.recent_likers(post_id, self.recent_likers_limit);
        let (count, status, likers) = futures::join!(count, status, likers);

        let mut report = ReconcileReport::default();
        let mut state = self.state.lock().await;

        match count {
            Ok(count) => {
                state.snapshot.like_count = Some(count);
                self.sink.set_like_count(count);
            }
            Err(err) => report.failures.push((LikeFacet::Count, err)),
        }

        match status {
            Some(Ok(is_liked)) => {
                state.snapshot.liked = LikedState::from_server(is_liked);
                self.sink.set_pressed_state(is_liked);
            }
            Some(Err(err)) => report.failures.push((LikeFacet::Status, err)),
            None => {}
        }

        match likers {
            Ok(likers) => {
                self.sink.set_recent_likers(&likers);
                state.snapshot.recent_likers = likers;
            }
            Err(err) => report.failures.push((LikeFacet::RecentLikers, err)),
        }
        drop(state);

        for (facet, err) in &report.failures {
            warn!(post_id = post_id.0, ?facet, error = %err, "like facet refresh failed");
            self.sink.show_facet_fallback(*facet, facet.fallback_message());
        }
        report
    }

    pub async fn toggle(&self) -> ToggleOutcome {
        {
            let mut state = self.state.lock().await;
            if state.toggling {
                info!(post_id = self.post_id.0, "like toggle already in flight");
                return ToggleOutcome::Busy;
            }
            state.toggling = true;
        }
        self.sink.set_toggle_enabled(false);

        let outcome = self.run_toggle().await;

        self.state.lock().await.toggling = false;
        self.sink.set_toggle_enabled(true);
        outcome
    }

    async fn run_toggle(&self) -> ToggleOutcome {
        let identity = match self.identity.resolve().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return ToggleOutcome::NoIdentity,
            Err(err) => {
                info!(error = %err, "like toggle aborted on invalid identity");
                return ToggleOutcome::InvalidIdentity;
            }
        };

        let was_liked = self.state.lock().await.snapshot.liked == LikedState::Liked;
        let result = if was_liked {
            self.gateway.unlike(self.post_id, &identity).await
        } else {
            self.gateway.like(self.post_id, &identity).await
        };

        if let Err(err) = result {
            warn!(post_id = self.post_id.0, was_liked, error = %err, "like mutation failed");
            self.sink
                .show_toast(&err.user_message(LIKE_ACTION_FALLBACK), ToastKind::Error);
            return ToggleOutcome::Failed(err);
        }

        // The identity just used for the mutation, not the store: a failed
        // save must not drop the status read.
        let reconcile = self.reconcile_as(Some(&identity)).await;
        let liked = self.state.lock().await.snapshot.liked;
        let now_liked = match liked {
            _ if reconcile.failed(LikeFacet::Status) => !was_liked,
            LikedState::Liked => true,
            LikedState::NotLiked => false,
            LikedState::Unknown => !was_liked,
        };
        let message = if now_liked { "Post liked" } else { "Post unliked" };
        info!(post_id = self.post_id.0, now_liked, "like toggled");
        self.sink.show_toast(message, ToastKind::Success);

        ToggleOutcome::Toggled { liked, reconcile }
    }
}

#[cfg(test)]
#[path = "tests/interaction_tests.rs"]
mod tests;
