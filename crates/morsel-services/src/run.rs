use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Cancellation handle of the current pipeline run.
#[derive(Default)]
pub(crate) struct RunControl {
    token: Mutex<CancellationToken>,
}

impl RunControl {
    /// Hand out a fresh token for a run that is about to start.
    pub(crate) fn start(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();
        token
    }

    pub(crate) fn cancel(&self) {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).cancel();
    }
}
