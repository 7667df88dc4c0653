//! Morsel Core Library
//!
//! Domain models, typed identifiers, pipeline state, error kinds, configuration and the
//! narrow collaborator interfaces shared by every Morsel crate.

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod models;
pub mod state;
pub mod storage_types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{FriendGraph, Session, StaticFriendGraph, StaticSession, UserProfile};
pub use config::MorselConfig;
pub use error::{LogLevel, MediaError, MediaResult, TranscodeError};
pub use ids::{ShareId, StoryId, UserId};
pub use models::{EncodedAsset, MediaKind, Share, Story, UploadedMedia};
pub use state::{PipelineState, ShareState, StateCell, UploadState};
pub use storage_types::StorageBackend;
