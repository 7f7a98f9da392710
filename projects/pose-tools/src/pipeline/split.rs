// Video splitter: two single-person videos per dual-person recording

use crate::pipeline::crop::{CropRegion, SplitGeometry};
use crate::pipeline::types::{SplitConfig, SPLIT_EXTENSIONS};
use crate::run_context::{derive_output_path, ensure_output_dir, list_videos, BatchReport};
use crate::video::probe::probe_dimensions;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub geometry: SplitGeometry,
    pub output_a: PathBuf,
    pub output_b: PathBuf,
}

/// `ffmpeg` invocation cropping `region` out of `input`: video re-encoded,
/// audio stream copied, existing output overwritten.
pub fn crop_command(ffmpeg: &str, input: &Path, region: &CropRegion, output: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-y", "-nostdin", "-v", "error", "-i"])
        .arg(input)
        .args(["-vf", &region.to_filter(), "-c:a", "copy"])
        .arg(output);
    cmd
}

/// Runs an external command to completion, turning a non-zero exit status
/// into an error carrying the tool's stderr.
pub fn run_tool(mut cmd: Command) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!("Running {:?}", cmd);

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run {}. Ensure it is installed.", program))?;

    if !output.status.success() {
        bail!(
            "{} failed ({}): {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(())
}

/// Probes `video`, computes the split, and writes `<stem>_A` / `<stem>_B`.
pub fn split_video(video: &Path, config: &SplitConfig) -> Result<SplitOutcome> {
    let dims = probe_dimensions(&config.ffprobe, video)?;
    let geometry = SplitGeometry::new(dims, config.offset)?;

    let extension = video
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("mp4");
    let output_a = derive_output_path(&config.output_dir, video, "_A", extension)?;
    let output_b = derive_output_path(&config.output_dir, video, "_B", extension)?;

    tracing::info!(
        "{}: {}x{}, split at x={} (A: {}px, B: {}px)",
        video.display(),
        geometry.width,
        geometry.height,
        geometry.split_x,
        geometry.crop_a().width,
        geometry.crop_b().width
    );

    for (region, output) in [(geometry.crop_a(), &output_a), (geometry.crop_b(), &output_b)] {
        let cmd = crop_command(&config.ffmpeg, video, &region, output);
        if config.dry_run {
            tracing::info!("Dry run: {:?}", cmd);
            continue;
        }
        run_tool(cmd).with_context(|| format!("Failed to write {}", output.display()))?;
    }

    Ok(SplitOutcome {
        geometry,
        output_a,
        output_b,
    })
}

/// Splits every `.mp4` in the input folder. A file whose probe or encode
/// fails is logged and recorded; the batch carries on.
pub fn split_folder(config: &SplitConfig) -> Result<BatchReport> {
    ensure_output_dir(&config.output_dir)?;
    let videos = list_videos(&config.input_dir, SPLIT_EXTENSIONS)?;
    tracing::info!(
        "Found {} video(s) in {}",
        videos.len(),
        config.input_dir.display()
    );

    let mut report = BatchReport::new("split", &config.input_dir, &config.output_dir);

    for video in &videos {
        let result = split_video(video, config).map(|outcome| {
            tracing::info!(
                "Video {} split into {} (left) and {} (right)",
                video.display(),
                outcome.output_a.display(),
                outcome.output_b.display()
            );
            let detail = format!(
                "{}x{}, split_x={}",
                outcome.geometry.width, outcome.geometry.height, outcome.geometry.split_x
            );
            (vec![outcome.output_a, outcome.output_b], detail)
        });

        report.record(video, result);
    }

    report.finish();
    if let Some(ref path) = config.report {
        report.write_json(path)?;
    }

    Ok(report)
}
