//! Client core for the curio content site: paged feed loading, like
//! reconciliation, topic digest, weekly newsletter menu and newsletter
//! subscription, all driven through a [`ContentGateway`] and rendered
//! through a [`PresentationSink`].

pub mod digest;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod interaction;
pub mod pagination;
pub mod share;
pub mod sink;
pub mod subscription;
pub mod weekly;

pub use digest::{TopicDigest, TopicSection};
pub use error::GatewayError;
pub use gateway::{ContentGateway, HttpContentGateway};
pub use identity::{
    FileIdentityStore, IdentityError, IdentityResolver, IdentityStore, MemoryIdentityStore,
};
pub use interaction::{LikeReconciler, LikeSnapshot, LikedState, ReconcileReport, ToggleOutcome};
pub use pagination::{FeedCursor, LoadOutcome, PaginationController};
pub use sink::{LikeFacet, PresentationSink, ToastKind};
pub use subscription::{SubscribeOutcome, SubscriptionError, SubscriptionFlow, SubscriptionForm};
pub use weekly::{MenuEntry, WeeklyError, WeeklyMenu};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
