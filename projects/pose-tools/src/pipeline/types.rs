use crate::pose::PoseConfig;
use crate::video::Backend;
use clap::ValueEnum;
use std::path::PathBuf;

/// What the extractor writes for a frame on which no pose was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FramePolicy {
    /// Write nothing; frame indices in the table may have gaps.
    #[default]
    Skip,
    /// Write the frame index followed by empty landmark fields.
    Empty,
}

/// Settings for `extract`.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub backend: Backend,
    pub frame_policy: FramePolicy,
    pub pose: PoseConfig,
    pub report: Option<PathBuf>,
}

/// Settings for `split`.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Pixels added to `width / 2` to place the split line.
    pub offset: u32,
    pub ffmpeg: String,
    pub ffprobe: String,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
}

/// Extensions picked up by `extract`.
pub const EXTRACT_EXTENSIONS: &[&str] = &["mp4", "avi"];
/// Extensions picked up by `split`.
pub const SPLIT_EXTENSIONS: &[&str] = &["mp4"];
/// Default pixel shift of the split line; matches earlier outputs.
pub const DEFAULT_SPLIT_OFFSET: u32 = 20;
