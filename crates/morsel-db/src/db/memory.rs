//! In-process repositories.
//!
//! Same contract as the PostgreSQL repositories. Each repository counts its calls and can be
//! told to fail, so services can be tested against store outages.

use super::error::{DbError, DbResult};
use super::share::ShareRepository;
use super::story::StoryRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use morsel_core::{Share, ShareId, Story, StoryId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Faults {
    calls: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Faults {
    fn read(&self) -> DbResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn write(&self) -> DbResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("simulated write failure".to_string()));
        }
        Ok(())
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[derive(Default)]
pub struct MemoryShareRepository {
    rows: RwLock<HashMap<ShareId, Share>>,
    faults: Faults,
}

impl MemoryShareRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every call, successful or not.
    pub fn call_count(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }

    /// Write calls only (`insert_many`, `mark_viewed`).
    pub fn write_count(&self) -> usize {
        self.faults.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn get(&self, id: ShareId) -> Option<Share> {
        self.rows.read().await.get(&id).cloned()
    }

    async fn list_where(&self, pred: impl Fn(&Share) -> bool) -> Vec<Share> {
        let mut shares: Vec<Share> = self
            .rows
            .read()
            .await
            .values()
            .filter(|s| pred(s))
            .cloned()
            .collect();
        newest_first(&mut shares, |s| s.created_at);
        shares
    }
}

#[async_trait]
impl ShareRepository for MemoryShareRepository {
    async fn insert_many(&self, shares: &[Share]) -> DbResult<()> {
        self.faults.write()?;
        let mut rows = self.rows.write().await;
        if let Some(dup) = shares.iter().find(|s| rows.contains_key(&s.id)) {
            return Err(DbError::InvalidRow(format!("duplicate share id {}", dup.id)));
        }
        for share in shares {
            rows.insert(share.id, share.clone());
        }
        Ok(())
    }

    async fn list_received(&self, receiver: UserId) -> DbResult<Vec<Share>> {
        self.faults.read()?;
        Ok(self.list_where(|s| s.receiver_id == receiver).await)
    }

    async fn list_sent(&self, sender: UserId) -> DbResult<Vec<Share>> {
        self.faults.read()?;
        Ok(self.list_where(|s| s.sender_id == sender).await)
    }

    async fn mark_viewed(&self, id: ShareId, at: DateTime<Utc>) -> DbResult<()> {
        self.faults.write()?;
        let mut rows = self.rows.write().await;
        let share = rows
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound(format!("share {}", id)))?;
        share.is_viewed = true;
        share.updated_at = at;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStoryRepository {
    rows: RwLock<HashMap<StoryId, Story>>,
    faults: Faults,
}

impl MemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.faults.writes.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, id: StoryId) -> bool {
        self.rows.read().await.contains_key(&id)
    }

    async fn list_where(&self, now: DateTime<Utc>, pred: impl Fn(&Story) -> bool) -> Vec<Story> {
        let mut stories: Vec<Story> = self
            .rows
            .read()
            .await
            .values()
            .filter(|s| s.is_active(now) && pred(s))
            .cloned()
            .collect();
        newest_first(&mut stories, |s| s.created_at);
        stories
    }
}

#[async_trait]
impl StoryRepository for MemoryStoryRepository {
    async fn insert(&self, story: &Story) -> DbResult<()> {
        self.faults.write()?;
        let mut rows = self.rows.write().await;
        if rows.contains_key(&story.id) {
            return Err(DbError::InvalidRow(format!("duplicate story id {}", story.id)));
        }
        rows.insert(story.id, story.clone());
        Ok(())
    }

    async fn list_active_by_author(
        &self,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>> {
        self.faults.read()?;
        Ok(self.list_where(now, |s| s.author_id == author).await)
    }

    async fn list_active_by_authors(
        &self,
        authors: &[UserId],
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>> {
        self.faults.read()?;
        Ok(self.list_where(now, |s| authors.contains(&s.author_id)).await)
    }

    async fn delete(&self, id: StoryId) -> DbResult<()> {
        self.faults.write()?;
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("story {}", id)))
    }
}
