use image::DynamicImage;
use morsel_core::MediaKind;
use std::path::PathBuf;

/// Raw media handed over by the capture layer.
#[derive(Debug, Clone)]
pub enum CapturedMedia {
    /// Decoded still image.
    Photo(DynamicImage),
    /// Still image in any format the `image` crate can decode.
    PhotoBytes(Vec<u8>),
    /// Video file on local disk, in any container ffmpeg can read.
    Video(PathBuf),
}

impl CapturedMedia {
    pub fn kind(&self) -> MediaKind {
        match self {
            CapturedMedia::Photo(_) | CapturedMedia::PhotoBytes(_) => MediaKind::Photo,
            CapturedMedia::Video(_) => MediaKind::Video,
        }
    }
}
