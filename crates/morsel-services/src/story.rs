//! Story lifecycle: posting, loading, caching and deletion.
//!
//! The cache maps each author to their active stories, newest first. Expiry is applied on
//! every read, so a stale cache entry can hold an expired story but never returns one.

use crate::errors::{persist_error, upload_error};
use crate::run::RunControl;
use crate::upload::MediaPipeline;
use chrono::Duration;
use morsel_core::models::active_newest_first;
use morsel_core::{
    Clock, FriendGraph, MediaError, MediaResult, Session, StateCell, Story, UploadState, UserId,
};
use morsel_db::StoryRepository;
use morsel_processing::CapturedMedia;
use morsel_storage::keys::{path_from_url, story_path};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// One author's active stories, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryGroup {
    pub author_id: UserId,
    pub stories: Vec<Story>,
}

/// Result of a friend-story load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FriendStories {
    /// Groups ordered by their newest story, most recent first.
    pub groups: Vec<StoryGroup>,
    /// Every story across all groups, newest first. Each entry carries its `author_id`.
    pub timeline: Vec<Story>,
}

impl FriendStories {
    fn from_stories(stories: Vec<Story>) -> Self {
        let mut by_author: HashMap<UserId, Vec<Story>> = HashMap::new();
        for story in &stories {
            by_author.entry(story.author_id).or_default().push(story.clone());
        }

        let mut groups: Vec<StoryGroup> = by_author
            .into_iter()
            .map(|(author_id, mut stories)| {
                stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                StoryGroup { author_id, stories }
            })
            .collect();
        groups.sort_by(|a, b| {
            let newest = |g: &StoryGroup| g.stories.first().map(|s| s.created_at);
            newest(b).cmp(&newest(a))
        });

        let mut timeline = stories;
        timeline.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self { groups, timeline }
    }

    pub fn group(&self, author: UserId) -> Option<&StoryGroup> {
        self.groups.iter().find(|g| g.author_id == author)
    }
}

#[derive(Default)]
struct StoryCache {
    by_author: HashMap<UserId, Vec<Story>>,
}

impl StoryCache {
    fn purge(&mut self, story: &Story) {
        for stories in self.by_author.values_mut() {
            stories.retain(|s| s.id != story.id);
        }
    }
}

pub struct StoryLifecycleManager {
    session: Arc<dyn Session>,
    friends: Arc<dyn FriendGraph>,
    pipeline: MediaPipeline,
    stories: Arc<dyn StoryRepository>,
    clock: Arc<dyn Clock>,
    bucket: String,
    ttl: Duration,
    cache: RwLock<StoryCache>,
    upload_state: StateCell<UploadState>,
    run: RunControl,
}

impl StoryLifecycleManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<dyn Session>,
        friends: Arc<dyn FriendGraph>,
        pipeline: MediaPipeline,
        stories: Arc<dyn StoryRepository>,
        clock: Arc<dyn Clock>,
        bucket: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            session,
            friends,
            pipeline,
            stories,
            clock,
            bucket: bucket.into(),
            ttl,
            cache: RwLock::new(StoryCache::default()),
            upload_state: StateCell::new(),
            run: RunControl::default(),
        }
    }

    fn current_user(&self) -> MediaResult<UserId> {
        self.session
            .current_user()
            .map(|profile| profile.id)
            .ok_or_else(|| MediaError::Validation("no signed-in user".to_string()))
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload_state.get()
    }

    pub fn subscribe_upload_state(&self) -> watch::Receiver<UploadState> {
        self.upload_state.subscribe()
    }

    /// Back to idle after a finished upload.
    pub fn reset_upload_state(&self) -> bool {
        self.upload_state.reset()
    }

    /// Cancel the story upload in flight, if it is still encoding.
    pub fn cancel_upload(&self) {
        self.run.cancel();
    }

    /// Publish a story for the signed-in user.
    #[tracing::instrument(skip(self, media, caption), fields(kind = %media.kind()))]
    pub async fn post_story(
        &self,
        media: &CapturedMedia,
        caption: Option<String>,
    ) -> MediaResult<Story> {
        let author = match self.current_user() {
            Ok(author) => author,
            Err(e) => {
                if self.upload_state.begin(UploadState::Error(e.to_string())) {
                    e.log("post_story");
                }
                return Err(e);
            }
        };

        if !self.upload_state.begin(UploadState::Uploading) {
            return Err(MediaError::Validation("a story upload is already in progress".to_string()));
        }
        let cancel = self.run.start();

        let result = async {
            let asset = self
                .pipeline
                .encode_and_upload(media, &self.bucket, |kind| story_path(author, kind), &cancel)
                .await?;

            let story = Story::new(author, &asset.media, caption, self.clock.now(), self.ttl)?;
            if let Err(e) = self.stories.insert(&story).await {
                self.pipeline.discard(&asset).await;
                return Err(persist_error(e));
            }
            Ok::<Story, MediaError>(story)
        }
        .await;

        match result {
            Ok(story) => {
                self.refresh_after_post(&story).await;
                self.upload_state.advance(UploadState::Success);
                tracing::info!(
                    story_id = %story.id,
                    expires_at = %story.expires_at,
                    "Story posted"
                );
                Ok(story)
            }
            Err(e) => {
                self.upload_state.fail(e.to_string());
                e.log("post_story");
                Err(e)
            }
        }
    }

    /// Re-read the author's stories after a post. If the read fails the new story is added
    /// to the cached list instead.
    async fn refresh_after_post(&self, story: &Story) {
        if let Err(e) = self.load_own_stories(story.author_id).await {
            tracing::warn!(error = %e, "Failed to refresh own stories after post");
            let mut cache = self.cache.write().await;
            let own = cache.by_author.entry(story.author_id).or_default();
            if !own.iter().any(|s| s.id == story.id) {
                own.insert(0, story.clone());
            }
        }
    }

    /// Fetch `user`'s active stories and replace their cache entry.
    pub async fn load_own_stories(&self, user: UserId) -> MediaResult<Vec<Story>> {
        let stories = self
            .stories
            .list_active_by_author(user, self.clock.now())
            .await
            .map_err(persist_error)?;

        self.cache
            .write()
            .await
            .by_author
            .insert(user, stories.clone());
        Ok(stories)
    }

    /// Active stories of the signed-in user, from cache.
    pub async fn own_stories(&self) -> Vec<Story> {
        match self.current_user() {
            Ok(user) => self.active_stories(user).await,
            Err(_) => Vec::new(),
        }
    }

    /// Fetch the active stories of every friend in one query.
    ///
    /// Each requested friend's cache entry is replaced, including friends with no active
    /// stories. An empty list returns immediately without touching the store.
    pub async fn load_friend_stories(&self, friend_ids: &[UserId]) -> MediaResult<FriendStories> {
        if friend_ids.is_empty() {
            return Ok(FriendStories::default());
        }

        let stories = self
            .stories
            .list_active_by_authors(friend_ids, self.clock.now())
            .await
            .map_err(|e| {
                let err = persist_error(e);
                err.log("load_friend_stories");
                err
            })?;

        let result = FriendStories::from_stories(stories);

        let mut cache = self.cache.write().await;
        for friend in friend_ids {
            let stories = result
                .group(*friend)
                .map(|g| g.stories.clone())
                .unwrap_or_default();
            cache.by_author.insert(*friend, stories);
        }

        tracing::debug!(
            friend_count = friend_ids.len(),
            story_count = result.timeline.len(),
            "Friend stories loaded"
        );
        Ok(result)
    }

    /// Ask the friend graph for the signed-in user's friends and load their stories.
    pub async fn refresh_friend_stories(&self) -> MediaResult<FriendStories> {
        let user = self.current_user()?;
        let mut friend_ids: Vec<UserId> = self
            .friends
            .friend_ids(user)
            .await
            .map_err(|e| MediaError::Persist(format!("Failed to load friends: {}", e)))?
            .into_iter()
            .collect();
        friend_ids.sort();

        self.load_friend_stories(&friend_ids).await
    }

    /// Cached active stories of `author`, newest first.
    pub async fn active_stories(&self, author: UserId) -> Vec<Story> {
        let now = self.clock.now();
        let cache = self.cache.read().await;
        cache
            .by_author
            .get(&author)
            .map(|stories| active_newest_first(stories.iter().cloned(), now))
            .unwrap_or_default()
    }

    /// Load `author`'s stories unless they are already cached.
    pub async fn preload(&self, author: UserId) -> MediaResult<()> {
        if self.cache.read().await.by_author.contains_key(&author) {
            return Ok(());
        }

        let stories = self
            .stories
            .list_active_by_author(author, self.clock.now())
            .await
            .map_err(persist_error)?;

        self.cache
            .write()
            .await
            .by_author
            .entry(author)
            .or_insert(stories);
        Ok(())
    }

    /// Delete one of the signed-in user's stories.
    ///
    /// Once the row is gone the story is purged from every cache entry, even if removing the
    /// media from the asset store then fails. That failure is still returned. A row that was
    /// already deleted still has its media removed.
    #[tracing::instrument(skip(self, story), fields(story_id = %story.id))]
    pub async fn delete_story(&self, story: &Story) -> MediaResult<()> {
        let user = self.current_user()?;
        if story.author_id != user {
            let err = MediaError::Forbidden("only the author can delete a story".to_string());
            err.log("delete_story");
            return Err(err);
        }

        match self.stories.delete(story.id).await.map_err(persist_error) {
            Ok(()) => {}
            Err(MediaError::NotFound(_)) => {
                tracing::debug!("Story row already gone, removing its media");
            }
            Err(e) => {
                e.log("delete_story");
                return Err(e);
            }
        }

        self.cache.write().await.purge(story);

        let path = path_from_url(&story.media_url).ok_or_else(|| {
            MediaError::Upload(format!("cannot derive storage path from {}", story.media_url))
        });
        let removed = match path {
            Ok(path) => self
                .pipeline
                .store()
                .remove(&self.bucket, &[path])
                .await
                .map_err(upload_error),
            Err(e) => Err(e),
        };

        if let Err(e) = &removed {
            e.log("delete_story");
        } else {
            tracing::info!("Story deleted");
        }
        removed
    }
}
