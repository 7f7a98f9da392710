use crate::video::{open_reader, Backend, VideoReader};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Mat;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct ProcessingStats {
    pub processed_frames: usize,
    pub duration: Duration,
}

/// A trait for handling video frames. This separates the "how to process"
/// from the "how to read" logic. `index` is the zero-based decode position.
pub trait FrameProcessor {
    fn process(&mut self, index: usize, frame: Mat) -> Result<()>;
}

/// Blanket implementation so any closure with the right signature
/// automatically implements FrameProcessor.
impl<F> FrameProcessor for F
where
    F: FnMut(usize, Mat) -> Result<()>,
{
    fn process(&mut self, index: usize, frame: Mat) -> Result<()> {
        self(index, frame)
    }
}

pub struct VideoSession {
    pub reader: Box<dyn VideoReader>,
    pub pb: ProgressBar,
    pub start_time: Instant,
    pub processed_frames: usize,
}

impl VideoSession {
    pub fn open(video_path: &Path, backend: Backend) -> Result<Self> {
        Self::new(open_reader(video_path, backend)?)
    }

    pub fn new(reader: Box<dyn VideoReader>) -> Result<Self> {
        let total_frames = reader.frame_count()?;

        let pb = if total_frames > 0 {
            let pb = ProgressBar::new(total_frames as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} fps, {eta})")?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::new_spinner()
        };

        Ok(Self {
            reader,
            pb,
            start_time: Instant::now(),
            processed_frames: 0,
        })
    }
}

/// Feeds every frame of the session to `processor`, in order, one at a time.
pub fn process_video<P>(mut session: VideoSession, mut processor: P) -> Result<ProcessingStats>
where
    P: FrameProcessor,
{
    while let Some(frame) = session.reader.read_frame()? {
        processor.process(session.processed_frames, frame)?;
        session.processed_frames += 1;
        session.pb.inc(1);
    }

    session.pb.finish_and_clear();

    Ok(ProcessingStats {
        processed_frames: session.processed_frames,
        duration: session.start_time.elapsed(),
    })
}
