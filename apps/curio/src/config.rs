use std::{collections::HashMap, fs, num::NonZeroU32, path::PathBuf};

use anyhow::Context;
use client_core::{interaction::DEFAULT_RECENT_LIKERS_LIMIT, pagination::DEFAULT_PAGE_SIZE};
use url::Url;

pub const CONFIG_FILE: &str = "curio.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: NonZeroU32,
    pub recent_likers_limit: u32,
    pub identity_store_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://localhost:8443".into(),
            page_size: DEFAULT_PAGE_SIZE,
            recent_likers_limit: DEFAULT_RECENT_LIKERS_LIMIT,
            identity_store_path: PathBuf::from(".curio/storage.json"),
        }
    }
}

/// Defaults, then `curio.toml` in the working directory, then the process
/// environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Flat string keys only; a file that does not parse is ignored.
pub fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("page_size") {
        set_page_size(settings, v);
    }
    if let Some(v) = file_cfg.get("recent_likers_limit") {
        set_likers_limit(settings, v);
    }
    if let Some(v) = file_cfg.get("identity_store_path") {
        settings.identity_store_path = PathBuf::from(v);
    }
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CURIO_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__PAGE_SIZE") {
        set_page_size(settings, &v);
    }
    if let Some(v) = lookup("APP__RECENT_LIKERS_LIMIT") {
        set_likers_limit(settings, &v);
    }
    if let Some(v) = lookup("APP__IDENTITY_STORE_PATH") {
        settings.identity_store_path = PathBuf::from(v);
    }
}

fn set_page_size(settings: &mut Settings, raw: &str) {
    if let Some(parsed) = raw.trim().parse::<u32>().ok().and_then(NonZeroU32::new) {
        settings.page_size = parsed;
    }
}

fn set_likers_limit(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<u32>() {
        if parsed > 0 {
            settings.recent_likers_limit = parsed;
        }
    }
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).with_context(|| format!("invalid api base url '{raw}'"))?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
