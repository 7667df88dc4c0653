use super::transcoder::ConversionBackend;
use super::validate_path;
use async_trait::async_trait;
use morsel_core::TranscodeError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Converts video with an `ffmpeg` child process.
///
/// Output is H.264/AAC in an MP4 container with the moov atom up front, using one fixed
/// preset. The child is spawned with `kill_on_drop`, so dropping the conversion future
/// terminates it.
pub struct FfmpegBackend {
    ffmpeg_path: String,
}

impl FfmpegBackend {
    pub fn new(ffmpeg_path: String) -> anyhow::Result<Self> {
        validate_path(&ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }

    fn args(source: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "fast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl ConversionBackend for FfmpegBackend {
    #[tracing::instrument(skip(self), fields(process.executable.path = %self.ffmpeg_path))]
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), TranscodeError> {
        let result = Command::new(&self.ffmpeg_path)
            .args(Self::args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Failed(format!("Failed to execute ffmpeg: {}", e)))?;

        match result.status.code() {
            Some(0) => Ok(()),
            Some(code) => {
                let stderr = String::from_utf8_lossy(&result.stderr);
                let lines: Vec<&str> = stderr.lines().collect();
                let tail = lines[lines.len().saturating_sub(5)..].join(" | ");
                Err(TranscodeError::Failed(format!(
                    "ffmpeg exited with code {}: {}",
                    code, tail
                )))
            }
            None => Err(TranscodeError::UnsupportedStatus(result.status.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_preset() {
        let args = FfmpegBackend::args(Path::new("/tmp/in.mov"), Path::new("/tmp/out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264 -preset fast -crf 23"));
        assert!(joined.contains("-c:a aac -b:a 128k"));
        assert!(joined.contains("-movflags +faststart"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_rejects_unsafe_path() {
        assert!(FfmpegBackend::new("ffmpeg | sh".to_string()).is_err());
    }
}
