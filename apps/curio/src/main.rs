mod config;
mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    share, ContentGateway, FileIdentityStore, HttpContentGateway, IdentityResolver,
    LikeReconciler, LoadOutcome, PaginationController, SubscriptionFlow, SubscriptionForm,
    ToggleOutcome, TopicDigest, WeeklyMenu,
};
use shared::domain::{ArticleId, PostId, TopicId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::Settings, terminal::TerminalSink};

#[derive(Parser, Debug)]
#[command(name = "curio", about = "Terminal client for the CurioDaily content site")]
struct Args {
    /// Overrides the configured API base url.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through the blog feed.
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show like count, status and recent likers of a post.
    Likes { post_id: i64 },
    /// Like or unlike a post.
    Like { post_id: i64 },
    /// Latest newsletter articles per topic.
    Topics,
    /// Weekly newsletter pages per active topic.
    Weekly,
    /// Print the full text of a newsletter article.
    Read { article_id: i64 },
    Subscribe {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long = "topic")]
        topics: Vec<i64>,
    },
    Unsubscribe { subscription_id: String },
    /// Print a LinkedIn share link for a post.
    Share { post_id: i64 },
}

struct App {
    settings: Settings,
    gateway: Arc<HttpContentGateway>,
    sink: Arc<TerminalSink>,
}

impl App {
    fn new(settings: Settings) -> Self {
        let gateway = Arc::new(HttpContentGateway::new(settings.api_base_url.clone()));
        Self {
            settings,
            gateway,
            sink: Arc::new(TerminalSink::new()),
        }
    }

    fn likes(&self, post_id: PostId) -> LikeReconciler {
        let store = Arc::new(FileIdentityStore::new(&self.settings.identity_store_path));
        let resolver = IdentityResolver::new(store, self.sink.clone());
        LikeReconciler::new(post_id, self.gateway.clone(), self.sink.clone(), resolver)
            .with_recent_likers_limit(self.settings.recent_likers_limit)
    }

    async fn feed(&self, pages: u32) {
        let feed = PaginationController::new(
            self.gateway.clone(),
            self.sink.clone(),
            self.settings.page_size,
        );
        for _ in 0..pages.max(1) {
            match feed.load_next_page().await {
                LoadOutcome::Appended { exhausted: true, .. } | LoadOutcome::Skipped => break,
                LoadOutcome::Failed(_) => {
                    if let Some(label) = self.sink.load_more_label() {
                        eprintln!("{label}");
                    }
                    break;
                }
                LoadOutcome::Appended { .. } | LoadOutcome::Discarded => {}
            }
        }
        feed.teardown().await;
    }

    async fn toggle_like(&self, post_id: PostId) -> Result<()> {
        let likes = self.likes(post_id);
        likes.mount().await;
        match likes.toggle().await {
            ToggleOutcome::Toggled { .. } | ToggleOutcome::NoIdentity => Ok(()),
            ToggleOutcome::Busy => {
                anyhow::bail!("a like request for post {} is in flight", likes.post_id())
            }
            ToggleOutcome::InvalidIdentity => anyhow::bail!("invalid email address"),
            ToggleOutcome::Failed(err) => Err(err.into()),
        }
    }

    async fn topics(&self) {
        let sections = TopicDigest::new(self.gateway.clone())
            .build(Utc::now())
            .await;
        if sections.is_empty() {
            println!("No articles available.");
        }
        for section in sections {
            println!("== {} ==", section.topic.name);
            for article in section.articles() {
                println!(
                    "  #{} {} ({})",
                    article.id,
                    article.title,
                    article.created_at.format("%b %-d, %Y")
                );
            }
        }
    }

    async fn read(&self, article_id: ArticleId) -> Result<()> {
        let article = self
            .gateway
            .get_article(article_id)
            .await
            .with_context(|| format!("failed to load article {article_id}"))?;
        println!("{}", terminal::render_article(&article));
        Ok(())
    }

    async fn weekly(&self) -> Result<()> {
        let entries = WeeklyMenu::new(
            self.gateway.clone(),
            self.sink.clone(),
            self.settings.api_base_url.clone(),
        )
        .load()
        .await?;
        for entry in entries {
            println!("{}\n    {}", entry.label, entry.url);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(base_url) = args.base_url {
        settings.api_base_url = base_url;
    }
    settings.api_base_url = config::normalize_base_url(&settings.api_base_url)?;
    info!(base_url = %settings.api_base_url, "curio client starting");

    let app = App::new(settings);
    match args.command {
        Command::Feed { pages } => app.feed(pages).await,
        Command::Likes { post_id } => {
            app.likes(PostId(post_id)).mount().await;
        }
        Command::Like { post_id } => app.toggle_like(PostId(post_id)).await?,
        Command::Topics => app.topics().await,
        Command::Weekly => app.weekly().await?,
        Command::Read { article_id } => app.read(ArticleId(article_id)).await?,
        Command::Subscribe {
            name,
            email,
            topics,
        } => {
            let form = SubscriptionForm {
                name,
                email,
                topic_ids: topics.into_iter().map(TopicId).collect(),
            };
            SubscriptionFlow::new(app.gateway.clone(), app.sink.clone())
                .subscribe(&form)
                .await?;
        }
        Command::Unsubscribe { subscription_id } => {
            SubscriptionFlow::new(app.gateway.clone(), app.sink.clone())
                .unsubscribe(&subscription_id)
                .await?;
        }
        Command::Share { post_id } => {
            let url =
                share::share_post(app.gateway.as_ref(), app.gateway.base_url(), PostId(post_id))
                    .await?;
            println!("{url}");
        }
    }
    Ok(())
}
