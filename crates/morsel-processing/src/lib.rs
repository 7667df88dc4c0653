//! Morsel Processing Library
//!
//! Turns captured media into upload-ready payloads: JPEG encoding for photos, and a
//! cancellable transcode to the canonical MP4 delivery format for videos.

pub mod capture;
pub mod encoder;
pub mod photo;
pub mod video;

pub use capture::CapturedMedia;
pub use encoder::MediaEncoder;
pub use video::{
    ConversionBackend, DurationProbe, FfmpegBackend, FfprobeProbe, TranscodedVideo,
    TranscodingService,
};
