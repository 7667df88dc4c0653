//! Wiring for the `morsel` binary: tracing setup, backend selection and service assembly.

use anyhow::{Context, Result};
use morsel_core::{
    Clock, MorselConfig, Session, StaticFriendGraph, StaticSession, SystemClock, UserId,
    UserProfile,
};
use morsel_db::{
    MemoryShareRepository, MemoryStoryRepository, PostgresShareRepository,
    PostgresStoryRepository, ShareRepository, StoryRepository,
};
use morsel_processing::{
    CapturedMedia, FfmpegBackend, FfprobeProbe, MediaEncoder, TranscodingService,
};
use morsel_services::{
    MediaPipeline, ShareFanoutService, StoryLifecycleManager, ViewTrackingService,
};
use morsel_storage::{create_asset_store, PublicUrlResolver};
use std::path::Path;
use std::sync::Arc;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi", "3gp"];

/// Initialize tracing for the CLI.
///
/// `RUST_LOG` selects the filter (default `info`); `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Classify a file on disk as a video (by extension) or a still image.
pub fn captured_from_path(path: &Path) -> Result<CapturedMedia> {
    let is_video = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    if is_video {
        return Ok(CapturedMedia::Video(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(CapturedMedia::PhotoBytes(bytes))
}

/// Fully assembled services for one acting user.
pub struct App {
    pub config: MorselConfig,
    pub user: UserId,
    pub shares: Arc<ShareFanoutService>,
    pub stories: Arc<StoryLifecycleManager>,
    pub views: ViewTrackingService,
    pub resolver: PublicUrlResolver,
}

impl App {
    pub async fn build(config: MorselConfig, user: UserId, friends: Vec<UserId>) -> Result<Self> {
        let store = create_asset_store(&config)
            .await
            .context("Failed to initialize asset store")?;

        let (share_repo, story_repo): (Arc<dyn ShareRepository>, Arc<dyn StoryRepository>) =
            if config.database_url.is_some() {
                let pool = morsel_db::connect(&config)
                    .await
                    .context("Failed to connect to database")?;
                morsel_db::run_migrations(&pool)
                    .await
                    .context("Failed to run migrations")?;
                (
                    Arc::new(PostgresShareRepository::new(pool.clone())),
                    Arc::new(PostgresStoryRepository::new(pool)),
                )
            } else {
                tracing::warn!(
                    "DATABASE_URL not set; records are kept in memory for this run only"
                );
                (
                    Arc::new(MemoryShareRepository::new()),
                    Arc::new(MemoryStoryRepository::new()),
                )
            };

        let backend = FfmpegBackend::new(config.ffmpeg_path.clone())
            .context("Invalid FFMPEG_PATH")?;
        let probe = FfprobeProbe::new(config.ffprobe_path.clone()).context("Invalid FFPROBE_PATH")?;
        let transcoder =
            TranscodingService::new(Arc::new(backend), config.transcode_scratch_dir.clone());
        let encoder = MediaEncoder::new(config.photo_jpeg_quality, transcoder, Arc::new(probe));
        let pipeline = MediaPipeline::new(Arc::new(encoder), store.clone());

        let session: Arc<dyn Session> = Arc::new(StaticSession::signed_in(UserProfile {
            id: user,
            display_name: user.to_string(),
        }));
        let friend_graph = StaticFriendGraph::new().with_friends(user, friends);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let shares = ShareFanoutService::new(
            session.clone(),
            pipeline.clone(),
            share_repo.clone(),
            clock.clone(),
            config.shared_media_bucket.clone(),
        );
        let stories = StoryLifecycleManager::new(
            session,
            Arc::new(friend_graph),
            pipeline,
            story_repo,
            clock.clone(),
            config.stories_bucket.clone(),
            config.story_ttl(),
        );
        let views = ViewTrackingService::new(share_repo, clock);
        let resolver = PublicUrlResolver::new(store, config.public_base_url.clone());

        tracing::debug!(
            user = %user,
            storage_backend = %config.storage_backend,
            "Morsel services ready"
        );

        Ok(Self {
            config,
            user,
            shares: Arc::new(shares),
            stories: Arc::new(stories),
            views,
            resolver,
        })
    }
}
