use shared::domain::PostId;
use thiserror::Error;
use url::Url;

use crate::{error::GatewayError, gateway::ContentGateway};

const LINKEDIN_SHARE_ENDPOINT: &str = "https://www.linkedin.com/sharing/share-offsite/";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("failed to load post for sharing: {0}")]
    Gateway(#[from] GatewayError),
    #[error("failed to build share url: {0}")]
    Url(#[from] url::ParseError),
}

pub fn post_url(base_url: &str, post_id: PostId) -> String {
    format!("{}/api/blog/{}", base_url.trim_end_matches('/'), post_id.0)
}

pub fn share_url(base_url: &str, post_id: PostId, title: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        LINKEDIN_SHARE_ENDPOINT,
        &[("url", post_url(base_url, post_id).as_str()), ("title", title)],
    )
}

/// Looks the post up for its title, then builds the share link.
pub async fn share_post(
    gateway: &dyn ContentGateway,
    base_url: &str,
    post_id: PostId,
) -> Result<Url, ShareError> {
    let post = gateway.get_post(post_id).await?;
    Ok(share_url(base_url, post_id, &post.title)?)
}
