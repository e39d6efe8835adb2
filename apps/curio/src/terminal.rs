//! Line-oriented rendering of the client core on stdout.

use std::sync::Mutex;

use async_trait::async_trait;
use client_core::{LikeFacet, PresentationSink, ToastKind};
use shared::{
    domain::Identity,
    protocol::{Article, BlogPost},
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

const SUMMARY_CHARS: usize = 100;

pub fn render_post(post: &BlogPost) -> String {
    format!(
        "#{} {} ({})\n    {}",
        post.id,
        post.title,
        post.created_at.format("%b %-d, %Y"),
        post.summary(SUMMARY_CHARS)
    )
}

/// Title and body of an article as fetched; no second request is made for
/// missing content.
pub fn render_article(article: &Article) -> String {
    let body = article.content.as_deref().unwrap_or("(no content)");
    format!("{}\n\n{body}", article.title)
}

pub fn render_likers(likers: &[Identity]) -> String {
    if likers.is_empty() {
        return "No likes yet".to_string();
    }
    let names: Vec<&str> = likers.iter().map(Identity::display_name).collect();
    format!("Liked by {}", names.join(", "))
}

pub fn render_toast(message: &str, kind: ToastKind) -> String {
    let tag = match kind {
        ToastKind::Info => "info",
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
    };
    format!("[{tag}] {message}")
}

#[derive(Default)]
pub struct TerminalSink {
    last_label: Mutex<Option<String>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of the feed's load-more control after the last page request.
    pub fn load_more_label(&self) -> Option<String> {
        self.last_label
            .lock()
            .map(|label| label.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PresentationSink for TerminalSink {
    fn append_items(&self, items: &[BlogPost]) {
        for post in items {
            println!("{}", render_post(post));
        }
    }

    fn set_loading_label(&self, label: &str) {
        if let Ok(mut last) = self.last_label.lock() {
            *last = Some(label.to_string());
        }
    }

    fn hide_load_more(&self) {
        if let Ok(mut last) = self.last_label.lock() {
            *last = None;
        }
        println!("-- end of feed --");
    }

    fn show_toast(&self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Error => eprintln!("{}", render_toast(message, kind)),
            _ => println!("{}", render_toast(message, kind)),
        }
    }

    fn set_pressed_state(&self, liked: bool) {
        let state = if liked {
            "You like this post"
        } else {
            "You have not liked this post"
        };
        println!("{state}");
    }

    fn set_like_count(&self, count: u64) {
        println!("Likes: {count}");
    }

    fn set_recent_likers(&self, likers: &[Identity]) {
        println!("{}", render_likers(likers));
    }

    fn show_field_error(&self, field: &str, message: &str) {
        eprintln!("{field}: {message}");
    }

    fn show_facet_fallback(&self, _facet: LikeFacet, message: &str) {
        eprintln!("{message}");
    }

    fn set_toggle_enabled(&self, _enabled: bool) {}

    async fn prompt_identity(&self) -> Option<String> {
        let mut stdout = io::stdout();
        stdout
            .write_all(b"Please enter your email to like this post: ")
            .await
            .ok()?;
        stdout.flush().await.ok()?;

        let mut line = String::new();
        let read = BufReader::new(io::stdin()).read_line(&mut line).await.ok()?;
        let answer = line.trim();
        if read == 0 || answer.is_empty() {
            return None;
        }
        Some(answer.to_string())
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
