use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use morsel_cli::{captured_from_path, init_tracing, truncate_string, App};
use morsel_core::{MorselConfig, Share, ShareId, Story, StoryId, UserId};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "morsel")]
#[command(about = "Share photos and videos with friends, post and browse stories")]
struct Cli {
    /// Acting user
    #[arg(long, env = "MORSEL_USER_ID", value_name = "UUID", global = true)]
    user: Option<UserId>,

    /// Friends of the acting user (repeatable, or comma-separated in MORSEL_FRIEND_IDS)
    #[arg(
        long = "friend",
        env = "MORSEL_FRIEND_IDS",
        value_delimiter = ',',
        value_name = "UUID",
        global = true
    )]
    friends: Vec<UserId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a photo or video to one or more friends
    Share {
        file: PathBuf,
        /// Recipient (repeatable)
        #[arg(long = "to", value_name = "UUID", required = true)]
        recipients: Vec<UserId>,
        #[arg(long)]
        caption: Option<String>,
    },
    /// Post, list or delete stories
    Story {
        #[command(subcommand)]
        action: StoryCommand,
    },
    /// List received shares
    Inbox,
    /// Mark a received share as viewed and print its playback URL
    View { share_id: ShareId },
    /// Resolve a stored media reference to a playable URL
    Resolve {
        url: String,
        #[arg(long)]
        bucket: String,
    },
}

#[derive(Subcommand, Debug)]
enum StoryCommand {
    /// Post a photo or video story
    Post {
        file: PathBuf,
        #[arg(long)]
        caption: Option<String>,
    },
    /// List your active stories
    List,
    /// Show your friends' active stories
    Friends,
    /// Delete one of your stories
    Delete { story_id: StoryId },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = MorselConfig::from_env().context("Failed to load configuration")?;
    let user = cli
        .user
        .ok_or_else(|| anyhow::anyhow!("No acting user: pass --user or set MORSEL_USER_ID"))?;

    let app = App::build(config, user, cli.friends).await?;

    match cli.command {
        Command::Share {
            file,
            recipients,
            caption,
        } => share(&app, file, recipients, caption).await,
        Command::Story { action } => match action {
            StoryCommand::Post { file, caption } => post_story(&app, file, caption).await,
            StoryCommand::List => {
                let stories = app.stories.load_own_stories(app.user).await?;
                print_stories(&stories);
                Ok(())
            }
            StoryCommand::Friends => {
                let loaded = app.stories.refresh_friend_stories().await?;
                for group in &loaded.groups {
                    println!("{} ({} active)", group.author_id, group.stories.len());
                    print_stories(&group.stories);
                }
                if loaded.groups.is_empty() {
                    println!("No active stories from friends");
                }
                Ok(())
            }
            StoryCommand::Delete { story_id } => {
                let own = app.stories.load_own_stories(app.user).await?;
                let story = own
                    .into_iter()
                    .find(|s| s.id == story_id)
                    .ok_or_else(|| anyhow::anyhow!("No active story {} for this user", story_id))?;
                app.stories.delete_story(&story).await?;
                println!("Deleted story {}", story_id);
                Ok(())
            }
        },
        Command::Inbox => {
            let received = app.views.load_received(app.user).await?;
            println!("{} unviewed of {}", app.views.unviewed_count(), received.len());
            for share in &received {
                print_share(share);
            }
            Ok(())
        }
        Command::View { share_id } => {
            let received = app.views.load_received(app.user).await?;
            app.views.mark_viewed(share_id).await?;
            let share = received
                .iter()
                .find(|s| s.id == share_id)
                .ok_or_else(|| anyhow::anyhow!("Share {} not found", share_id))?;
            let url = app
                .resolver
                .resolve(&share.media_url, &app.config.shared_media_bucket)
                .await;
            println!("{}", url);
            Ok(())
        }
        Command::Resolve { url, bucket } => {
            println!("{}", app.resolver.resolve(&url, &bucket).await);
            Ok(())
        }
    }
}

/// Cancel the running pipeline when Ctrl-C arrives.
fn cancel_on_ctrl_c(cancel: impl Fn() + Send + 'static) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            cancel();
        }
    })
}

async fn share(
    app: &App,
    file: PathBuf,
    recipients: Vec<UserId>,
    caption: Option<String>,
) -> Result<()> {
    let media = captured_from_path(&file)?;
    let service = Arc::clone(&app.shares);
    let watcher = cancel_on_ctrl_c(move || service.cancel());

    let result = app.shares.send_to_many(&media, &recipients, caption).await;
    watcher.abort();

    let shares = result?;
    println!("Sent to {} recipient(s)", shares.len());
    for share in &shares {
        print_share(share);
    }
    Ok(())
}

async fn post_story(app: &App, file: PathBuf, caption: Option<String>) -> Result<()> {
    let media = captured_from_path(&file)?;
    let manager = Arc::clone(&app.stories);
    let watcher = cancel_on_ctrl_c(move || manager.cancel_upload());

    let result = app.stories.post_story(&media, caption).await;
    watcher.abort();

    let story = result?;
    println!("Posted story {} (expires {})", story.id, story.expires_at.to_rfc3339());
    Ok(())
}

fn print_share(share: &Share) {
    println!(
        "{}  {}  from {}  {:<5}  {:<8}  {}",
        share.id,
        share.created_at.format("%Y-%m-%d %H:%M"),
        share.sender_id,
        share.media_type.to_string(),
        if share.is_viewed { "viewed" } else { "new" },
        truncate_string(share.caption.as_deref().unwrap_or(""), 40)
    );
}

fn print_stories(stories: &[Story]) {
    let now = chrono::Utc::now();
    if stories.is_empty() {
        println!("  (none)");
    }
    for story in stories {
        let remaining = story.time_remaining(now);
        println!(
            "  {}  {:<5}  {:>2}h{:02}m left  {}  {}",
            story.id,
            story.media_type.to_string(),
            remaining.num_hours(),
            remaining.num_minutes() % 60,
            truncate_string(story.caption.as_deref().unwrap_or(""), 30),
            truncate_string(&story.media_url, 60),
        );
    }
}
