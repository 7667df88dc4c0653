#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use image::{DynamicImage, Rgb, RgbImage};
use morsel_core::{
    ManualClock, StaticFriendGraph, StaticSession, TranscodeError, UserId, UserProfile,
};
use morsel_db::{MemoryShareRepository, MemoryStoryRepository};
use morsel_processing::{
    CapturedMedia, ConversionBackend, DurationProbe, MediaEncoder, TranscodingService,
};
use morsel_services::{
    MediaPipeline, ShareFanoutService, StoryLifecycleManager, ViewTrackingService,
};
use morsel_storage::MemoryStorage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Copies the source to the output, or stalls after a partial write when told to.
#[derive(Default)]
pub struct TestBackend {
    stall: AtomicBool,
    pub started: Notify,
    pub last_output: Mutex<Option<PathBuf>>,
}

impl TestBackend {
    pub fn stall(&self) {
        self.stall.store(true, Ordering::SeqCst);
    }

    pub fn last_output(&self) -> Option<PathBuf> {
        self.last_output.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversionBackend for TestBackend {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), TranscodeError> {
        *self.last_output.lock().unwrap() = Some(output.to_path_buf());
        if self.stall.load(Ordering::SeqCst) {
            tokio::fs::write(output, b"partial")
                .await
                .map_err(|e| TranscodeError::Failed(e.to_string()))?;
            self.started.notify_one();
            std::future::pending::<()>().await;
        }
        tokio::fs::copy(source, output)
            .await
            .map(|_| ())
            .map_err(|e| TranscodeError::Failed(e.to_string()))
    }
}

pub struct FixedProbe(pub f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration_seconds(&self, _path: &Path) -> anyhow::Result<f64> {
        Ok(self.0)
    }
}

pub struct Harness {
    pub me: UserId,
    pub friend: UserId,
    pub other: UserId,
    pub store: Arc<MemoryStorage>,
    pub shares: Arc<MemoryShareRepository>,
    pub stories: Arc<MemoryStoryRepository>,
    pub clock: Arc<ManualClock>,
    pub backend: Arc<TestBackend>,
    pub scratch: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            me: UserId::new(),
            friend: UserId::new(),
            other: UserId::new(),
            store: Arc::new(MemoryStorage::new("https://abc.example.co/storage/v1/object/public")),
            shares: Arc::new(MemoryShareRepository::new()),
            stories: Arc::new(MemoryStoryRepository::new()),
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            )),
            backend: Arc::new(TestBackend::default()),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    pub fn session_for(&self, user: UserId) -> Arc<StaticSession> {
        Arc::new(StaticSession::signed_in(UserProfile {
            id: user,
            display_name: "tester".to_string(),
        }))
    }

    pub fn pipeline(&self) -> MediaPipeline {
        let transcoder = TranscodingService::new(self.backend.clone(), self.scratch.path());
        let encoder = MediaEncoder::new(80, transcoder, Arc::new(FixedProbe(12.7)));
        MediaPipeline::new(Arc::new(encoder), self.store.clone())
    }

    pub fn share_service(&self) -> ShareFanoutService {
        self.share_service_for(self.me)
    }

    pub fn share_service_for(&self, user: UserId) -> ShareFanoutService {
        ShareFanoutService::new(
            self.session_for(user),
            self.pipeline(),
            self.shares.clone(),
            self.clock.clone(),
            "shared-media",
        )
    }

    pub fn story_manager(&self) -> StoryLifecycleManager {
        self.story_manager_for(self.me)
    }

    pub fn story_manager_for(&self, user: UserId) -> StoryLifecycleManager {
        let friends = StaticFriendGraph::new()
            .befriend(self.me, self.friend)
            .befriend(self.me, self.other);
        StoryLifecycleManager::new(
            self.session_for(user),
            Arc::new(friends),
            self.pipeline(),
            self.stories.clone(),
            self.clock.clone(),
            "stories",
            Duration::hours(24),
        )
    }

    pub fn view_service(&self) -> ViewTrackingService {
        ViewTrackingService::new(self.shares.clone(), self.clock.clone())
    }

    pub fn photo(&self) -> CapturedMedia {
        CapturedMedia::Photo(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            16,
            9,
            Rgb([240, 120, 30]),
        )))
    }

    pub fn video(&self) -> CapturedMedia {
        let source = self.scratch.path().join(format!("{}.mov", UserId::new()));
        std::fs::write(&source, b"not-really-a-movie").unwrap();
        CapturedMedia::Video(source)
    }

    /// Files in the scratch directory other than video sources.
    pub fn scratch_outputs(&self) -> usize {
        std::fs::read_dir(self.scratch.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("mp4"))
            .count()
    }
}
