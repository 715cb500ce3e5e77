//! # FFmpeg
//! src/media/ffmpeg.rs
//!
//! `MediaProbe` sobre los binarios `ffmpeg` y `ffprobe` del PATH.

use super::{MediaError, MediaProbe};
use std::path::Path;
use std::process::{Command, Stdio};

/// Invoca `ffmpeg`/`ffprobe` como procesos hijos
#[derive(Debug, Clone)]
pub struct FfmpegProbe {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegProbe {
    pub fn new() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }

    /// Usa binarios en otra ubicación
    pub fn with_binaries(ffmpeg: &str, ffprobe: &str) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
        }
    }
}

impl Default for FfmpegProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbe for FfmpegProbe {
    fn available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn duration_secs(&self, video: &Path) -> u64 {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(video)
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => parse_duration(&String::from_utf8_lossy(&out.stdout)),
            Ok(_) | Err(_) => {
                tracing::warn!(video = %video.display(), "failed to read duration");
                0
            }
        }
    }

    fn extract_thumbnail(&self, video: &Path, output: &Path, at_secs: u64) -> Result<(), MediaError> {
        tracing::debug!(video = %video.display(), output = %output.display(), at_secs, "extracting thumbnail");

        let status = Command::new(&self.ffmpeg)
            .arg("-y")
            .args(["-ss", &at_secs.to_string()])
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if !status.success() {
            return Err(MediaError::Failed(format!(
                "{} exited with {} for {}",
                self.ffmpeg,
                status,
                video.display()
            )));
        }

        tracing::info!(output = %output.display(), "thumbnail extracted");
        Ok(())
    }
}

/// Segundos enteros de la salida de `ffprobe` (`"123.456\n"` -> 123). 0 si no se entiende.
fn parse_duration(stdout: &str) -> u64 {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("123.456\n"), 123);
        assert_eq!(parse_duration("0.9"), 0);
        assert_eq!(parse_duration("N/A"), 0);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("-5"), 0);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let probe = FfmpegProbe::with_binaries("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        assert!(!probe.available());
        assert_eq!(probe.duration_secs(Path::new("video.mp4")), 0);
        assert!(probe
            .extract_thumbnail(Path::new("video.mp4"), Path::new("out.jpg"), 10)
            .is_err());
    }
}
