//! Observable pipeline state.
//!
//! Each service owns one `StateCell` per progress enum. The cell is the single writer; readers
//! get whole snapshots through `get()` or a `watch::Receiver`, never a half-updated value.
//!
//! ```text
//! share:  Idle → Uploading → Sending → Success
//!           └──────────┴──────────┴──→ Error(reason)
//! upload: Idle → Uploading → Success
//!           └──────────┴──→ Error(reason)
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use tokio::sync::watch;

/// A forward-only progress enum.
pub trait PipelineState: Clone + PartialEq + Send + Sync + 'static {
    fn idle() -> Self;

    fn error(message: String) -> Self;

    /// Position in the progression. Transitions must strictly increase it.
    fn stage(&self) -> u8;

    fn is_terminal(&self) -> bool;

    fn is_idle(&self) -> bool {
        self.stage() == 0
    }
}

/// Progress of a direct-share send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareState {
    Idle,
    Uploading,
    Sending,
    Success,
    Error(String),
}

impl PipelineState for ShareState {
    fn idle() -> Self {
        ShareState::Idle
    }

    fn error(message: String) -> Self {
        ShareState::Error(message)
    }

    fn stage(&self) -> u8 {
        match self {
            ShareState::Idle => 0,
            ShareState::Uploading => 1,
            ShareState::Sending => 2,
            ShareState::Success | ShareState::Error(_) => 3,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ShareState::Success | ShareState::Error(_))
    }
}

impl Display for ShareState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ShareState::Idle => write!(f, "idle"),
            ShareState::Uploading => write!(f, "uploading"),
            ShareState::Sending => write!(f, "sending"),
            ShareState::Success => write!(f, "success"),
            ShareState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Progress of a story upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading,
    Success,
    Error(String),
}

impl PipelineState for UploadState {
    fn idle() -> Self {
        UploadState::Idle
    }

    fn error(message: String) -> Self {
        UploadState::Error(message)
    }

    fn stage(&self) -> u8 {
        match self {
            UploadState::Idle => 0,
            UploadState::Uploading => 1,
            UploadState::Success | UploadState::Error(_) => 2,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Success | UploadState::Error(_))
    }
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadState::Idle => write!(f, "idle"),
            UploadState::Uploading => write!(f, "uploading"),
            UploadState::Success => write!(f, "success"),
            UploadState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Single-writer holder for a `PipelineState`.
pub struct StateCell<S: PipelineState> {
    tx: watch::Sender<S>,
}

impl<S: PipelineState> StateCell<S> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(S::idle());
        Self { tx }
    }

    /// Current snapshot.
    pub fn get(&self) -> S {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Start a new run at `first`.
    ///
    /// Allowed from idle or from the terminal state of a previous run. Returns `false` while a
    /// run is still in flight, leaving the state untouched.
    pub fn begin(&self, first: S) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_idle() || current.is_terminal() {
                *current = first;
                true
            } else {
                false
            }
        })
    }

    /// Move forward to `next`. Backward or sideways moves, and moves out of a terminal state,
    /// are ignored and return `false`.
    pub fn advance(&self, next: S) -> bool {
        self.tx.send_if_modified(|current| {
            if !current.is_terminal() && next.stage() > current.stage() {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    /// Terminate the in-flight run with an error message.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.advance(S::error(message.into()))
    }

    /// Return to idle. Only allowed from a terminal state.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_terminal() {
                *current = S::idle();
                true
            } else {
                false
            }
        })
    }
}

impl<S: PipelineState> Default for StateCell<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_state_moves_forward_only() {
        let cell = StateCell::<ShareState>::new();
        assert!(cell.begin(ShareState::Uploading));
        assert!(cell.advance(ShareState::Sending));
        assert!(!cell.advance(ShareState::Uploading));
        assert!(cell.advance(ShareState::Success));
        assert!(!cell.fail("late failure"));
        assert_eq!(cell.get(), ShareState::Success);
    }

    #[test]
    fn test_begin_rejected_while_in_flight() {
        let cell = StateCell::<UploadState>::new();
        assert!(cell.begin(UploadState::Uploading));
        assert!(!cell.begin(UploadState::Uploading));
        assert!(!cell.reset());
        assert!(cell.fail("boom"));
        assert_eq!(cell.get(), UploadState::Error("boom".to_string()));
        assert!(cell.reset());
        assert_eq!(cell.get(), UploadState::Idle);
    }

    #[test]
    fn test_new_run_may_start_from_terminal_state() {
        let cell = StateCell::<ShareState>::new();
        cell.begin(ShareState::Uploading);
        cell.fail("network");
        assert!(cell.begin(ShareState::Uploading));
        assert_eq!(cell.get(), ShareState::Uploading);
    }

    #[tokio::test]
    async fn test_subscribers_observe_snapshots() {
        let cell = StateCell::<UploadState>::new();
        let mut rx = cell.subscribe();
        cell.begin(UploadState::Uploading);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), UploadState::Uploading);
    }
}
