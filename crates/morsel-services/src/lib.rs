//! Morsel Services Library
//!
//! The stateful halves of the system: fanning a share out to recipients, the story
//! lifecycle with its cache, and view tracking of received shares. Every service is built
//! explicitly from injected collaborators.

pub mod errors;
mod run;
pub mod share;
pub mod story;
pub mod upload;
pub mod views;

pub use share::ShareFanoutService;
pub use story::{FriendStories, StoryGroup, StoryLifecycleManager};
pub use upload::{MediaPipeline, UploadedAsset};
pub use views::ViewTrackingService;
