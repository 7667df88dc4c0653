//! Video conversion to the canonical delivery format.

mod ffmpeg;
mod probe;
mod transcoder;

pub use ffmpeg::FfmpegBackend;
pub use probe::{DurationProbe, FfprobeProbe};
pub use transcoder::{ConversionBackend, TranscodedVideo, TranscodingService};

/// Reject executable or file paths containing shell metacharacters or traversal sequences.
pub(crate) fn validate_path(path: &str) -> anyhow::Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow::anyhow!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow::anyhow!("Path contains directory traversal: {}", path));
    }

    Ok(())
}
