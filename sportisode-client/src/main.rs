use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use sportisode::api::{ApiClient, ApiError};
use sportisode::app::describe_error;
use sportisode::config::Settings;
use sportisode::logging::{self, LogConfig};
use sportisode::storage::{FileStorageAdapter, StorageAdapter};
use sportisode::App;
use sportisode_types::{Comment, CommentId, FeedTab, PostId, SearchType};

/// Sportisode - sports social network from the terminal
#[derive(Parser)]
#[command(name = "sportisode")]
#[command(about = "Command-line client for the Sportisode API")]
#[command(version)]
struct Cli {
    /// API base URL
    #[arg(long, env = "SPORTISODE_API_URL")]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the home feed
    Feed {
        /// for_you or following
        #[arg(long, default_value = "for_you")]
        tab: String,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show a post's comments
    Comments { post_id: PostId },
    /// Like or unlike a post
    Like { post_id: PostId },
    /// Repost, optionally with a quote
    Repost {
        post_id: PostId,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Bookmark or unbookmark a post
    Bookmark { post_id: PostId },
    /// Comment on a post
    Comment {
        post_id: PostId,
        text: String,
        /// Reply to this comment instead of posting top-level
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    /// Show replies to a comment
    Replies {
        post_id: PostId,
        comment_id: CommentId,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Search users, posts, leagues, teams and athletes
    Search {
        query: String,
        /// all, users, posts, leagues, teams or athletes
        #[arg(long = "type", default_value = "all")]
        search_type: String,
    },
    /// Manage the stored API token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store a token
    Set { token: String },
    /// Forget the stored token
    Clear,
    /// Show whether a token is stored
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so clap sees SPORTISODE_API_URL
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    let log_config = LogConfig::for_cli(cli.verbose);
    logging::init_logging(&log_config)?;

    let settings = Settings::new()
        .context("Failed to load settings")?
        .with_api_url(cli.api_url);
    log::info!("Using API at {}", settings.api.base_url);

    let tokens: Arc<dyn StorageAdapter> = Arc::new(FileStorageAdapter::new()?);
    let client = ApiClient::from_settings(&settings, Arc::clone(&tokens))?.with_log_config(log_config.clone());
    let mut logout = client.subscribe_logout();
    let app = App::new(Arc::new(client), &settings).with_log_config(log_config);

    let result = run(&app, tokens.as_ref(), cli.command).await;

    if let Ok(signal) = logout.try_recv() {
        eprintln!(
            "Session expired (rejected by {}); the stored token was cleared.",
            signal.endpoint
        );
    }

    if let Err(e) = &result {
        if let Some(api_error) = e.downcast_ref::<ApiError>() {
            eprintln!("{}", describe_error(api_error));
            std::process::exit(1);
        }
    }
    result
}

fn run_token(action: &TokenAction, tokens: &dyn StorageAdapter) -> Result<()> {
    match action {
        TokenAction::Set { token } => {
            tokens.store_credentials(token)?;
            println!("Token saved.");
        }
        TokenAction::Clear => {
            tokens.clear_credentials()?;
            println!("Token cleared.");
        }
        TokenAction::Show => match tokens.load_credentials()? {
            Some(token) => {
                let skip = token.chars().count().saturating_sub(4);
                let tail: String = token.chars().skip(skip).collect();
                println!("Token stored (****{})", tail);
            }
            None => println!("No token stored."),
        },
    }
    Ok(())
}

async fn run(app: &App, tokens: &dyn StorageAdapter, command: Command) -> Result<()> {
    match command {
        Command::Feed { tab, pages } => {
            let tab = FeedTab::parse(&tab).ok_or_else(|| anyhow!("Unknown feed tab: {}", tab))?;
            app.load_home_feed(tab).await?;
            for _ in 1..pages {
                if !app.load_more_home_feed().await? {
                    break;
                }
            }
            for post in app.feed.state().posts {
                let counts = post
                    .post_id()
                    .map(|id| app.interactions.get(id))
                    .unwrap_or_default();
                println!(
                    "[{}] @{}: {}\n    {} likes{}  {} comments  {} reposts{}  {} views",
                    post.id,
                    post.author.username,
                    post.title.as_deref().unwrap_or(&post.content),
                    counts.likes_count,
                    if counts.is_liked { " (liked)" } else { "" },
                    post.comments_count,
                    counts.reposts_count,
                    if counts.is_reposted { " (reposted)" } else { "" },
                    counts.views_count,
                );
            }
        }
        Command::Comments { post_id } => {
            app.fetch_comments(post_id).await?;
            if let Some(post) = app.comments.comments(post_id) {
                println!("{} comments", post.count);
                print_comments(&post.list, 0);
            }
        }
        Command::Like { post_id } => {
            let record = app.toggle_like(post_id).await?;
            println!(
                "{} post {} ({} likes)",
                if record.is_liked { "Liked" } else { "Unliked" },
                post_id,
                record.likes_count
            );
        }
        Command::Repost { post_id, comment } => {
            let record = app.create_repost(post_id, comment).await?;
            println!("Reposted post {} ({} reposts)", post_id, record.reposts_count);
        }
        Command::Bookmark { post_id } => {
            let record = app.toggle_bookmark(post_id).await?;
            println!(
                "{} post {}",
                if record.is_bookmarked { "Bookmarked" } else { "Removed bookmark for" },
                post_id
            );
        }
        Command::Comment { post_id, text, reply_to } => {
            let comment = app.post_comment(post_id, &text, reply_to).await?;
            println!("Posted comment {}", comment.id);
        }
        Command::Replies {
            post_id,
            comment_id,
            offset,
        } => {
            app.fetch_comments(post_id).await?;
            app.fetch_replies_page(post_id, comment_id, app.replies_page_size, offset)
                .await?;
            let parent = app
                .comments
                .find_comment(post_id, comment_id)
                .ok_or_else(|| anyhow!("Comment {} is not a top-level comment on post {}", comment_id, post_id))?;
            println!("{} replies", parent.replies.count);
            print_comments(&parent.replies.list, 0);
        }
        Command::Search { query, search_type } => {
            let search_type = SearchType::parse(&search_type)
                .ok_or_else(|| anyhow!("Unknown search type: {}", search_type))?;
            match app.search(&query, search_type).await? {
                Some(results) if !results.is_empty() => {
                    println!("{} results", results.total);
                    for (category, items) in &results.results {
                        let count = items.as_array().map(Vec::len).unwrap_or(0);
                        println!("  {}: {}", category, count);
                    }
                }
                _ => println!("No results."),
            }
        }
        Command::Token { action } => return run_token(&action, tokens),
    }
    Ok(())
}

fn print_comments(comments: &[Comment], depth: usize) {
    let indent = "  ".repeat(depth);
    for comment in comments {
        println!(
            "{}#{} @{}: {} ({} likes)",
            indent, comment.id, comment.author.username, comment.content, comment.likes_count
        );
        if comment.replies.loaded {
            print_comments(&comment.replies.list, depth + 1);
        } else if comment.reply_count > 0 {
            println!("{}  ... {} replies", indent, comment.reply_count);
        }
    }
}
