pub mod ffmpeg_reader;
pub mod opencv_reader;
pub mod probe;
pub mod processor;

use anyhow::Result;
use clap::ValueEnum;
use opencv::core::Mat;
use std::path::Path;

use ffmpeg_reader::FfmpegReader;
use opencv_reader::OpencvReader;

/// Sequential frame source. Frames are BGR, 8-bit, 3-channel.
pub trait VideoReader {
    /// Frame count reported by the container; 0 when unknown.
    fn frame_count(&self) -> Result<usize>;
    fn source_fps(&self) -> Result<f64>;
    /// Next decoded frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Mat>>;
}

/// Decoding backend for the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Opencv,
    Ffmpeg,
}

pub fn open_reader(path: &Path, backend: Backend) -> Result<Box<dyn VideoReader>> {
    let reader: Box<dyn VideoReader> = match backend {
        Backend::Opencv => Box::new(OpencvReader::new(path)?),
        Backend::Ffmpeg => Box::new(FfmpegReader::new(path)?),
    };
    Ok(reader)
}
