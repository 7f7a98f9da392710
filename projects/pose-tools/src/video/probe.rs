use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Pixel dimensions of a video's first stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

/// Queries width and height of the first video stream with `ffprobe`.
pub fn probe_dimensions(ffprobe: &str, path: &Path) -> Result<VideoDimensions> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run {}. Ensure ffprobe is installed.", ffprobe))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed on {} ({}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    parse_dimensions(&raw).with_context(|| format!("Unexpected ffprobe output for {}", path.display()))
}

/// Parses `WIDTHxHEIGHT` as printed by `ffprobe -of csv=p=0:s=x`.
pub fn parse_dimensions(raw: &str) -> Result<VideoDimensions> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("no video stream reported"))?;

    let (w, h) = line
        .split_once('x')
        .ok_or_else(|| anyhow!("malformed dimensions '{}'", line))?;
    let width: u32 = w
        .trim()
        .parse()
        .with_context(|| format!("invalid width '{}'", w))?;
    // some containers append a trailing separator
    let height: u32 = h
        .trim()
        .trim_end_matches('x')
        .parse()
        .with_context(|| format!("invalid height '{}'", h))?;

    if width == 0 || height == 0 {
        bail!("zero-sized video stream ({}x{})", width, height);
    }

    Ok(VideoDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        let dims = parse_dimensions("1280x720\n").unwrap();
        assert_eq!(
            dims,
            VideoDimensions {
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn test_parse_dimensions_trailing_separator() {
        let dims = parse_dimensions("640x480x\n").unwrap();
        assert_eq!(dims.width, 640);
        assert_eq!(dims.height, 480);
    }

    #[test]
    fn test_parse_dimensions_rejects_garbage() {
        assert!(parse_dimensions("").is_err());
        assert!(parse_dimensions("\n\n").is_err());
        assert!(parse_dimensions("N/A").is_err());
        assert!(parse_dimensions("abcx480").is_err());
        assert!(parse_dimensions("0x480").is_err());
    }

    #[test]
    fn test_probe_missing_tool() {
        let err = probe_dimensions("ffprobe-does-not-exist", Path::new("video.mp4")).unwrap_err();
        assert!(err.to_string().contains("ffprobe-does-not-exist"));
    }
}
