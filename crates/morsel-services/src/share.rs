//! Direct-share fan-out: one upload, one row per recipient.

use crate::errors::persist_error;
use crate::run::RunControl;
use crate::upload::MediaPipeline;
use morsel_core::{
    Clock, MediaError, MediaResult, Session, Share, ShareState, StateCell, UserId,
};
use morsel_db::ShareRepository;
use morsel_processing::CapturedMedia;
use morsel_storage::keys::share_path;
use std::sync::Arc;
use tokio::sync::watch;

pub struct ShareFanoutService {
    session: Arc<dyn Session>,
    pipeline: MediaPipeline,
    shares: Arc<dyn ShareRepository>,
    clock: Arc<dyn Clock>,
    bucket: String,
    state: StateCell<ShareState>,
    run: RunControl,
}

impl ShareFanoutService {
    pub fn new(
        session: Arc<dyn Session>,
        pipeline: MediaPipeline,
        shares: Arc<dyn ShareRepository>,
        clock: Arc<dyn Clock>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            session,
            pipeline,
            shares,
            clock,
            bucket: bucket.into(),
            state: StateCell::new(),
            run: RunControl::default(),
        }
    }

    pub fn state(&self) -> ShareState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShareState> {
        self.state.subscribe()
    }

    /// Return to idle after a finished send. Ignored while a send is running.
    pub fn reset(&self) -> bool {
        self.state.reset()
    }

    /// Cancel the send in flight, if it is still encoding.
    pub fn cancel(&self) {
        self.run.cancel();
    }

    pub async fn send_to_one(
        &self,
        media: &CapturedMedia,
        recipient: UserId,
        caption: Option<String>,
    ) -> MediaResult<Share> {
        let mut shares = self.send_to_many(media, &[recipient], caption).await?;
        shares
            .pop()
            .ok_or_else(|| MediaError::Persist("no share was created".to_string()))
    }

    /// Deliver `media` to every recipient.
    ///
    /// The media is encoded and uploaded once; every recipient gets a row pointing at the same
    /// URL, and all rows are written in one batch. Duplicate recipients collapse to one row.
    #[tracing::instrument(skip(self, media, recipients, caption), fields(recipient_count = recipients.len()))]
    pub async fn send_to_many(
        &self,
        media: &CapturedMedia,
        recipients: &[UserId],
        caption: Option<String>,
    ) -> MediaResult<Vec<Share>> {
        let (sender, recipients) = match self.validate(recipients) {
            Ok(ok) => ok,
            Err(e) => {
                if !self.state.begin(ShareState::Error(e.to_string())) {
                    return Err(MediaError::Validation(
                        "a share is already in progress".to_string(),
                    ));
                }
                e.log("send_to_many");
                return Err(e);
            }
        };

        if !self.state.begin(ShareState::Uploading) {
            return Err(MediaError::Validation("a share is already in progress".to_string()));
        }
        let cancel = self.run.start();

        let result = self
            .fan_out(media, sender, &recipients, caption, &cancel)
            .await;

        match &result {
            Ok(shares) => {
                self.state.advance(ShareState::Success);
                tracing::info!(sender = %sender, share_count = shares.len(), "Share delivered");
            }
            Err(e) => {
                self.state.fail(e.to_string());
                e.log("send_to_many");
            }
        }
        result
    }

    fn validate(&self, recipients: &[UserId]) -> MediaResult<(UserId, Vec<UserId>)> {
        if recipients.is_empty() {
            return Err(MediaError::Validation("at least one recipient is required".to_string()));
        }
        let sender = self
            .session
            .current_user()
            .ok_or_else(|| MediaError::Validation("no signed-in user".to_string()))?
            .id;

        let mut unique = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if *recipient == sender {
                return Err(MediaError::Validation(
                    "cannot share media with yourself".to_string(),
                ));
            }
            if !unique.contains(recipient) {
                unique.push(*recipient);
            }
        }
        Ok((sender, unique))
    }

    async fn fan_out(
        &self,
        media: &CapturedMedia,
        sender: UserId,
        recipients: &[UserId],
        caption: Option<String>,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> MediaResult<Vec<Share>> {
        let asset = self
            .pipeline
            .encode_and_upload(media, &self.bucket, share_path, cancel)
            .await?;

        self.state.advance(ShareState::Sending);

        let now = self.clock.now();
        let shares = recipients
            .iter()
            .map(|recipient| Share::new(sender, *recipient, &asset.media, caption.clone(), now))
            .collect::<MediaResult<Vec<_>>>()?;

        if let Err(e) = self.shares.insert_many(&shares).await {
            self.pipeline.discard(&asset).await;
            return Err(persist_error(e));
        }
        Ok(shares)
    }

    /// Shares sent by `sender`, newest first.
    pub async fn load_sent(&self, sender: UserId) -> MediaResult<Vec<Share>> {
        self.shares.list_sent(sender).await.map_err(|e| {
            let err = persist_error(e);
            err.log("load_sent");
            err
        })
    }
}
