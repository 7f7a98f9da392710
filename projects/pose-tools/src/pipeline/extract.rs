// Pose extractor: per-video landmark tables for every video in a folder

use crate::pipeline::table::PoseTableWriter;
use crate::pipeline::types::{ExtractConfig, FramePolicy, EXTRACT_EXTENSIONS};
use crate::pose::PoseEstimator;
use crate::run_context::{derive_output_path, ensure_output_dir, list_videos, BatchReport};
use crate::video::processor::{process_video, VideoSession};
use anyhow::{Context, Result};
use opencv::core::Mat;
use opencv::imgproc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ExtractionSummary {
    pub frames: usize,
    pub rows: usize,
    pub detected: usize,
    pub duration: Duration,
}

/// Runs `estimator` over every frame of `session` and writes the landmark
/// table to `output_csv`, overwriting it. The table is written next to the
/// target as `<name>.part` and only renamed into place once every frame has
/// been processed; a failed run leaves no partial table behind.
pub fn extract_keypoints<E>(
    session: VideoSession,
    estimator: &mut E,
    output_csv: &Path,
    policy: FramePolicy,
) -> Result<ExtractionSummary>
where
    E: PoseEstimator + ?Sized,
{
    let partial = partial_path(output_csv);

    match write_table(session, estimator, &partial, policy) {
        Ok(summary) => {
            fs::rename(&partial, output_csv).with_context(|| {
                format!("Failed to move table into place at {}", output_csv.display())
            })?;
            Ok(summary)
        }
        Err(e) => {
            if partial.exists() {
                if let Err(rm) = fs::remove_file(&partial) {
                    tracing::warn!("Could not remove {}: {}", partial.display(), rm);
                }
            }
            Err(e)
        }
    }
}

fn partial_path(output_csv: &Path) -> PathBuf {
    let mut name = output_csv.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn write_table<E>(
    session: VideoSession,
    estimator: &mut E,
    output_csv: &Path,
    policy: FramePolicy,
) -> Result<ExtractionSummary>
where
    E: PoseEstimator + ?Sized,
{
    let mut table = PoseTableWriter::create(output_csv)?;
    let mut detected = 0;

    let stats = process_video(session, |index: usize, frame: Mat| -> Result<()> {
        // the model expects RGB
        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

        match estimator
            .estimate(&rgb)
            .with_context(|| format!("Pose estimation failed on frame {}", index))?
        {
            Some(pose) => {
                detected += 1;
                table.write_pose(index, &pose)?;
            }
            None if policy == FramePolicy::Empty => table.write_empty(index)?,
            None => {}
        }
        Ok(())
    })?;

    let rows = table.finish()?;

    Ok(ExtractionSummary {
        frames: stats.processed_frames,
        rows,
        detected,
        duration: stats.duration,
    })
}

/// Opens one video and extracts its table. The table is only created once
/// the video has been opened.
pub fn extract_video<E>(
    video_path: &Path,
    output_csv: &Path,
    config: &ExtractConfig,
    estimator: &mut E,
) -> Result<ExtractionSummary>
where
    E: PoseEstimator + ?Sized,
{
    let session = VideoSession::open(video_path, config.backend)
        .with_context(|| format!("Error opening video file {}", video_path.display()))?;
    let fps = session.reader.source_fps()?;
    tracing::debug!("{}: source fps {:.2}", video_path.display(), fps);

    estimator.reset();
    extract_keypoints(session, estimator, output_csv, config.frame_policy)
}

/// Extracts a table for every `.mp4`/`.avi` in the input folder. Files that
/// fail are logged and recorded; the batch carries on.
pub fn extract_folder<E>(config: &ExtractConfig, estimator: &mut E) -> Result<BatchReport>
where
    E: PoseEstimator + ?Sized,
{
    ensure_output_dir(&config.output_dir)?;
    let videos = list_videos(&config.input_dir, EXTRACT_EXTENSIONS)?;
    tracing::info!(
        "Found {} video(s) in {}",
        videos.len(),
        config.input_dir.display()
    );

    let mut report = BatchReport::new("extract", &config.input_dir, &config.output_dir);

    for video in &videos {
        tracing::info!("Processing video: {}", video.display());

        let result = derive_output_path(&config.output_dir, video, "", "csv").and_then(|csv| {
            let summary = extract_video(video, &csv, config, estimator)?;
            tracing::info!(
                "Keypoints extracted and saved to {} ({} rows, {}/{} frames with a pose, {:.1}s)",
                csv.display(),
                summary.rows,
                summary.detected,
                summary.frames,
                summary.duration.as_secs_f64()
            );
            let detail = format!(
                "{} frames, {} with a pose, {} rows",
                summary.frames, summary.detected, summary.rows
            );
            Ok((vec![csv], detail))
        });

        report.record(video, result);
    }

    report.finish();
    if let Some(ref path) = config.report {
        report.write_json(path)?;
    }

    Ok(report)
}
