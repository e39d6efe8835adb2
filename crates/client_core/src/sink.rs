//! Presentation sink: the rendering surface driven by the client core.

use async_trait::async_trait;
use shared::{domain::Identity, protocol::BlogPost};

pub const LOADING_LABEL: &str = "Loading...";
pub const LOAD_MORE_LABEL: &str = "Load More";
pub const LOAD_RETRY_LABEL: &str = "Error loading posts. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// One of the three independently fetched views of a post's likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeFacet {
    Count,
    Status,
    RecentLikers,
}

impl LikeFacet {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Count => "Failed to load like count",
            Self::Status => "Failed to load like status",
            Self::RecentLikers => "Failed to load recent likes",
        }
    }
}

/// Rendering callbacks. Implementations own their widgets and use interior
/// mutability; none of these calls may block.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    fn append_items(&self, items: &[BlogPost]);
    fn set_loading_label(&self, label: &str);
    fn hide_load_more(&self);
    fn show_toast(&self, message: &str, kind: ToastKind);
    fn set_pressed_state(&self, liked: bool);
    fn set_like_count(&self, count: u64);
    /// An empty slice means "no likes yet".
    fn set_recent_likers(&self, likers: &[Identity]);
    fn show_field_error(&self, field: &str, message: &str);
    fn show_facet_fallback(&self, facet: LikeFacet, message: &str);
    fn set_toggle_enabled(&self, enabled: bool);

    /// Asks the viewer for an email address. `None` when the prompt is cancelled.
    async fn prompt_identity(&self) -> Option<String>;
}
