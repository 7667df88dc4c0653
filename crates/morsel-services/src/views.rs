//! View tracking for received shares.

use crate::errors::persist_error;
use morsel_core::{Clock, MediaError, MediaResult, Share, ShareId, UserId};
use morsel_db::ShareRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Owns the received-share index and the unviewed count derived from it.
///
/// All mutations go through the index lock, so concurrent `mark_viewed` calls for one share
/// produce at most one remote update.
pub struct ViewTrackingService {
    shares: Arc<dyn ShareRepository>,
    clock: Arc<dyn Clock>,
    index: Mutex<HashMap<ShareId, Share>>,
    unviewed: watch::Sender<usize>,
}

impl ViewTrackingService {
    pub fn new(shares: Arc<dyn ShareRepository>, clock: Arc<dyn Clock>) -> Self {
        let (unviewed, _rx) = watch::channel(0);
        Self {
            shares,
            clock,
            index: Mutex::new(HashMap::new()),
            unviewed,
        }
    }

    fn publish_count(&self, index: &HashMap<ShareId, Share>) {
        let count = index.values().filter(|s| !s.is_viewed).count();
        self.unviewed.send_replace(count);
    }

    /// Replace the index with `receiver`'s shares. On failure the previous index is kept.
    pub async fn load_received(&self, receiver: UserId) -> MediaResult<Vec<Share>> {
        let fetched = self.shares.list_received(receiver).await.map_err(|e| {
            let err = persist_error(e);
            err.log("load_received");
            err
        })?;

        let mut index = self.index.lock().await;
        *index = fetched.iter().map(|s| (s.id, s.clone())).collect();
        self.publish_count(&index);

        tracing::debug!(
            receiver = %receiver,
            share_count = index.len(),
            unviewed = *self.unviewed.borrow(),
            "Received shares loaded"
        );
        Ok(fetched)
    }

    /// Mark one received share as viewed.
    ///
    /// Already-viewed shares are left alone. The local record only changes after the remote
    /// update succeeds.
    pub async fn mark_viewed(&self, share_id: ShareId) -> MediaResult<()> {
        let mut index = self.index.lock().await;

        let already_viewed = match index.get(&share_id) {
            Some(share) => share.is_viewed,
            None => {
                let err = MediaError::NotFound(format!("share {}", share_id));
                err.log("mark_viewed");
                return Err(err);
            }
        };
        if already_viewed {
            return Ok(());
        }

        let now = self.clock.now();
        self.shares.mark_viewed(share_id, now).await.map_err(|e| {
            let err = persist_error(e);
            err.log("mark_viewed");
            err
        })?;

        if let Some(share) = index.get_mut(&share_id) {
            share.mark_viewed(now);
        }
        self.publish_count(&index);
        Ok(())
    }

    pub fn unviewed_count(&self) -> usize {
        *self.unviewed.borrow()
    }

    pub fn subscribe_unviewed(&self) -> watch::Receiver<usize> {
        self.unviewed.subscribe()
    }

    /// Snapshot of the indexed shares, newest first.
    pub async fn received(&self) -> Vec<Share> {
        let index = self.index.lock().await;
        let mut shares: Vec<Share> = index.values().cloned().collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        shares
    }
}
