//! Domain models for shares, stories and encoded media.

pub mod media;
pub mod share;
pub mod story;

pub use media::{EncodedAsset, MediaKind, UploadedMedia};
pub use share::Share;
pub use story::{active_newest_first, Story};
