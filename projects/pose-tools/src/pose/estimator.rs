use super::landmark::PoseLandmarks;
use anyhow::{bail, Result};
use opencv::core::Mat;
use std::path::PathBuf;

/// A single-person pose estimator.
///
/// Implementations may keep state between calls (e.g. the previous frame's
/// landmarks for tracking); `reset` must be called between unrelated videos.
pub trait PoseEstimator {
    /// Estimate a pose on one RGB frame. `Ok(None)` means no pose was found.
    fn estimate(&mut self, rgb: &Mat) -> Result<Option<PoseLandmarks>>;

    /// Forget any tracking state.
    fn reset(&mut self) {}
}

/// Estimator configuration, passed to the estimator's constructor.
#[derive(Debug, Clone)]
pub struct PoseConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// 0 = lite, 1 = full, 2 = heavy
    pub model_complexity: u8,
    /// Treat every frame as an unrelated image (no tracking).
    pub static_image_mode: bool,
    pub model_dir: PathBuf,
    /// Overrides the complexity-based model lookup when set.
    pub model_path: Option<PathBuf>,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_complexity: 1,
            static_image_mode: false,
            model_dir: PathBuf::from("models"),
            model_path: None,
        }
    }
}

impl PoseConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            bail!(
                "min_detection_confidence must be within [0, 1], got {}",
                self.min_detection_confidence
            );
        }
        if !(0.0..=1.0).contains(&self.min_tracking_confidence) {
            bail!(
                "min_tracking_confidence must be within [0, 1], got {}",
                self.min_tracking_confidence
            );
        }
        if self.model_complexity > 2 {
            bail!(
                "model_complexity must be 0, 1 or 2, got {}",
                self.model_complexity
            );
        }
        Ok(())
    }

    /// Model file for the configured complexity.
    pub fn resolve_model_path(&self) -> PathBuf {
        if let Some(ref path) = self.model_path {
            return path.clone();
        }
        let file = match self.model_complexity {
            0 => "pose_landmark_lite.onnx",
            2 => "pose_landmark_heavy.onnx",
            _ => "pose_landmark_full.onnx",
        };
        self.model_dir.join(file)
    }
}
