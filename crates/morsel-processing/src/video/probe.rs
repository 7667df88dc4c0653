//! Duration probing of delivered video files.

use super::validate_path;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Reads the playback duration of a video file, in seconds.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// `ffprobe`-backed duration probe.
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: String) -> Result<Self> {
        validate_path(&ffprobe_path)
            .context("Invalid ffprobe_path: contains dangerous characters")?;

        if !ffprobe_path.chars().all(|c| {
            c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\'
        }) {
            return Err(anyhow!("Invalid ffprobe_path: contains unsafe characters"));
        }

        Ok(Self { ffprobe_path })
    }
}

/// Pull `format.duration` out of ffprobe's JSON report.
fn parse_duration(report: &[u8]) -> Result<f64> {
    let probe_data: serde_json::Value =
        serde_json::from_slice(report).context("Failed to parse ffprobe output")?;

    let duration = probe_data["format"]["duration"]
        .as_str()
        .ok_or_else(|| anyhow!("ffprobe output has no duration"))?
        .parse::<f64>()
        .context("Invalid duration in ffprobe output")?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(anyhow!("Invalid duration in ffprobe output: {}", duration));
    }
    Ok(duration)
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let start = std::time::Instant::now();
        validate_path(&path.to_string_lossy()).context("Invalid video path")?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let duration = parse_duration(&output.stdout)?;
        tracing::debug!(
            duration_seconds = duration,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video duration probed"
        );
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let report = br#"{"format": {"filename": "out.mp4", "duration": "12.700000"}}"#;
        assert!((parse_duration(report).unwrap() - 12.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_duration_missing() {
        assert!(parse_duration(br#"{"format": {}}"#).is_err());
        assert!(parse_duration(b"not json").is_err());
    }

    #[test]
    fn test_rejects_unsafe_ffprobe_path() {
        assert!(FfprobeProbe::new("ffprobe".to_string()).is_ok());
        assert!(FfprobeProbe::new("ffprobe && true".to_string()).is_err());
    }
}
