use crate::pipeline::types::{
    ExtractConfig, FramePolicy, SplitConfig, DEFAULT_SPLIT_OFFSET,
};
use crate::pose::PoseConfig;
use crate::video::Backend;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract per-frame pose landmarks from every video into CSV tables
    Extract(ExtractArgs),
    /// Split every dual-person recording into left (A) and right (B) videos
    Split(SplitArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Directory containing .mp4/.avi videos
    #[arg(long, env = "POSE_TOOLS_INPUT_DIR", default_value = "input_videos")]
    pub input_dir: PathBuf,

    /// Directory receiving one CSV per video
    #[arg(long, env = "POSE_TOOLS_OUTPUT_DIR", default_value = "output_keypoints")]
    pub output_dir: PathBuf,

    /// Video decoding backend
    #[arg(long, value_enum, default_value_t = Backend::Opencv)]
    pub backend: Backend,

    /// What to write for frames without a detected pose
    #[arg(long, value_enum, default_value_t = FramePolicy::Skip)]
    pub frame_policy: FramePolicy,

    /// Directory holding pose_landmark_{lite,full,heavy}.onnx
    #[arg(long, env = "POSE_TOOLS_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Explicit landmark model file (overrides --model-complexity)
    #[arg(long, env = "POSE_TOOLS_MODEL")]
    pub model: Option<PathBuf>,

    /// 0 = lite, 1 = full, 2 = heavy
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub model_complexity: u8,

    /// Minimum pose presence to accept a fresh detection
    #[arg(long, default_value_t = 0.5)]
    pub min_detection_confidence: f32,

    /// Minimum pose presence to keep tracking from the previous frame
    #[arg(long, default_value_t = 0.5)]
    pub min_tracking_confidence: f32,

    /// Run detection on every frame independently
    #[arg(long)]
    pub static_image_mode: bool,

    /// Write a JSON batch report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SplitArgs {
    /// Directory containing .mp4 recordings
    #[arg(long, env = "POSE_TOOLS_INPUT_DIR", default_value = "input_videos")]
    pub input_dir: PathBuf,

    /// Directory receiving <name>_A / <name>_B videos
    #[arg(long, env = "POSE_TOOLS_SPLIT_OUTPUT_DIR", default_value = "output_split_videos")]
    pub output_dir: PathBuf,

    /// Pixels added to half the width to place the split line
    #[arg(long, default_value_t = DEFAULT_SPLIT_OFFSET)]
    pub offset: u32,

    /// ffmpeg executable
    #[arg(long, env = "POSE_TOOLS_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe executable
    #[arg(long, env = "POSE_TOOLS_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: String,

    /// Probe and log the ffmpeg commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON batch report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ExtractArgs {
    pub fn into_config(self) -> Result<ExtractConfig> {
        let pose = PoseConfig {
            min_detection_confidence: self.min_detection_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
            model_complexity: self.model_complexity,
            static_image_mode: self.static_image_mode,
            model_dir: self.model_dir,
            model_path: self.model,
        };
        pose.validate()?;

        Ok(ExtractConfig {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            backend: self.backend,
            frame_policy: self.frame_policy,
            pose,
            report: self.report,
        })
    }
}

impl SplitArgs {
    pub fn into_config(self) -> SplitConfig {
        SplitConfig {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            offset: self.offset,
            ffmpeg: self.ffmpeg,
            ffprobe: self.ffprobe,
            dry_run: self.dry_run,
            report: self.report,
        }
    }
}
