//! Viewer identity: email-shaped, cached device-wide, prompted for when absent.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, Mutex},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use shared::domain::Identity;
use thiserror::Error;
use tracing::{info, warn};

use crate::sink::PresentationSink;

/// Storage key shared by every view on the device.
pub const IDENTITY_STORAGE_KEY: &str = "userEmail";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("'{0}' is not a valid email address")]
    Validation(String),
}

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_SHAPE.is_match(candidate)
}

/// Trims and validates raw user input.
pub fn parse_identity(raw: &str) -> Result<Identity, IdentityError> {
    let trimmed = raw.trim();
    if is_valid_email(trimmed) {
        Ok(Identity::new(trimmed))
    } else {
        Err(IdentityError::Validation(trimmed.to_string()))
    }
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load(&self) -> Result<Option<Identity>>;
    async fn save(&self, identity: &Identity) -> Result<()>;
}

/// JSON key/value file standing in for the device's persistent storage.
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("corrupt identity store '{}'", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read identity store '{}'", self.path.display())),
        }
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Result<Option<Identity>> {
        let entries = self.read_entries().await?;
        Ok(entries.get(IDENTITY_STORAGE_KEY).map(Identity::new))
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(IDENTITY_STORAGE_KEY.to_string(), identity.as_str().to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create identity store directory '{}'", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("failed to write identity store '{}'", self.path.display()))
    }
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<Identity>>,
}

impl MemoryIdentityStore {
    pub fn with_identity(identity: Identity) -> Self {
        Self {
            slot: Mutex::new(Some(identity)),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn load(&self) -> Result<Option<Identity>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("identity slot poisoned"))?;
        Ok(slot.clone())
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("identity slot poisoned"))?;
        *slot = Some(identity.clone());
        Ok(())
    }
}

pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    sink: Arc<dyn PresentationSink>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, sink: Arc<dyn PresentationSink>) -> Self {
        Self { store, sink }
    }

    /// Cached identity without prompting. Storage failures read as "absent".
    pub async fn cached(&self) -> Option<Identity> {
        match self.store.load().await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "failed to read cached identity");
                None
            }
        }
    }

    /// Returns the cached identity, or prompts for one.
    ///
    /// `Ok(None)` is a cancelled prompt. Invalid input is reported on the
    /// sink and never written to storage.
    pub async fn resolve(&self) -> Result<Option<Identity>, IdentityError> {
        if let Some(identity) = self.cached().await {
            return Ok(Some(identity));
        }

        let Some(raw) = self.sink.prompt_identity().await else {
            info!("identity prompt cancelled");
            return Ok(None);
        };
        if raw.trim().is_empty() {
            info!("identity prompt submitted empty");
            return Ok(None);
        }

        let identity = match parse_identity(&raw) {
            Ok(identity) => identity,
            Err(err) => {
                self.sink.show_field_error("email", INVALID_EMAIL_MESSAGE);
                return Err(err);
            }
        };

        if let Err(err) = self.store.save(&identity).await {
            warn!(error = %err, "failed to persist identity; continuing with session copy");
        }
        Ok(Some(identity))
    }
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
