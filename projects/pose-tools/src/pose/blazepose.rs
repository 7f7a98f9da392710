use super::estimator::{PoseConfig, PoseEstimator};
use super::landmark::{Landmark, LandmarkName, PoseLandmarks};
use super::preprocess::{extract_roi, sigmoid, to_input_tensor, SquareRoi};
use anyhow::{anyhow, Context, Result};
use opencv::{core::Mat, prelude::*};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

/// Model input resolution (square).
pub const BLAZEPOSE_INPUT_SIZE: i32 = 256;

/// The landmark model emits 39 points: the 33 body landmarks plus 6
/// auxiliary points used for ROI alignment.
const MODEL_POINTS: usize = 39;
/// x, y, z, visibility, presence
const VALUES_PER_POINT: usize = 5;

/// Enlargement applied to the previous pose's bounding square when tracking.
const TRACKING_ROI_SCALE: f32 = 1.25;

const INPUT_NAME: &str = "input_1";
const LANDMARKS_OUTPUT: &str = "Identity";
const POSE_FLAG_OUTPUT: &str = "Identity_1";

/// Raw model output for one ROI.
struct LandmarkOutput {
    presence: f32,
    values: Vec<f32>,
}

/// Runs the landmark network on one square region of an RGB frame.
trait LandmarkModel {
    fn run(&mut self, rgb: &Mat, roi: &SquareRoi) -> Result<LandmarkOutput>;
}

/// BlazePose GHUM landmark network loaded into an ONNX Runtime session.
struct OnnxLandmarkModel {
    session: Session,
}

impl LandmarkModel for OnnxLandmarkModel {
    fn run(&mut self, rgb: &Mat, roi: &SquareRoi) -> Result<LandmarkOutput> {
        let input = extract_roi(rgb, roi, BLAZEPOSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(to_input_tensor(&input)?)?;

        let outputs = self
            .session
            .run(ort::inputs![INPUT_NAME => tensor])
            .context("Pose landmark inference failed")?;

        let landmarks: ndarray::ArrayViewD<f32> = outputs[LANDMARKS_OUTPUT]
            .try_extract_array()
            .context("Failed to extract landmark tensor")?;
        let flag: ndarray::ArrayViewD<f32> = outputs[POSE_FLAG_OUTPUT]
            .try_extract_array()
            .context("Failed to extract pose flag tensor")?;

        let values: Vec<f32> = landmarks.iter().copied().collect();
        if values.len() < MODEL_POINTS * VALUES_PER_POINT {
            return Err(anyhow!(
                "Unexpected landmark tensor size {}, expected {}",
                values.len(),
                MODEL_POINTS * VALUES_PER_POINT
            ));
        }

        let raw_flag = flag
            .iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow!("Empty pose flag tensor"))?;

        Ok(LandmarkOutput {
            presence: sigmoid(raw_flag),
            values,
        })
    }
}

/// BlazePose GHUM landmark model running on ONNX Runtime.
///
/// Without a pose to track the whole frame (padded to a square) is fed to
/// the model and the result is accepted against `min_detection_confidence`.
/// Once a pose is found, the next frame is cropped around it and accepted
/// against `min_tracking_confidence`; losing the track falls back to a
/// full-frame detection on the same frame.
pub struct BlazePoseEstimator {
    model: Box<dyn LandmarkModel>,
    config: PoseConfig,
    previous: Option<PoseLandmarks>,
}

impl BlazePoseEstimator {
    pub fn new(config: PoseConfig) -> Result<Self> {
        config.validate()?;
        let model_path = config.resolve_model_path();
        if !model_path.exists() {
            return Err(anyhow!(
                "Pose landmark model not found: {}",
                model_path.display()
            ));
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&model_path)
            .context("Failed to load pose landmark ONNX model")?;

        tracing::info!(
            "BlazePoseEstimator: loaded {} (complexity={}, detection>={}, tracking>={}, static={})",
            model_path.display(),
            config.model_complexity,
            config.min_detection_confidence,
            config.min_tracking_confidence,
            config.static_image_mode
        );

        Self::with_model(config, Box::new(OnnxLandmarkModel { session }))
    }

    fn with_model(config: PoseConfig, model: Box<dyn LandmarkModel>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            previous: None,
        })
    }

    /// Runs the model on `roi` and keeps the pose if its presence clears `threshold`.
    fn try_roi(
        &mut self,
        rgb: &Mat,
        roi: &SquareRoi,
        threshold: f32,
    ) -> Result<Option<PoseLandmarks>> {
        let output = self.model.run(rgb, roi)?;
        if output.presence < threshold {
            tracing::debug!(
                "BlazePoseEstimator: presence {:.3} below {:.3} for {:?}",
                output.presence,
                threshold,
                roi
            );
            return Ok(None);
        }

        Ok(Some(decode_landmarks(
            &output.values,
            roi,
            rgb.cols(),
            rgb.rows(),
        )))
    }
}

/// Decodes the first 33 model points into frame-normalized landmarks.
fn decode_landmarks(values: &[f32], roi: &SquareRoi, width: i32, height: i32) -> PoseLandmarks {
    let mut landmarks = [Landmark::default(); LandmarkName::COUNT];
    let input = BLAZEPOSE_INPUT_SIZE as f32;

    for (i, landmark) in landmarks.iter_mut().enumerate() {
        let base = i * VALUES_PER_POINT;
        let (x, y) = roi.to_frame_normalized(
            values[base],
            values[base + 1],
            BLAZEPOSE_INPUT_SIZE,
            width,
            height,
        );
        // z shares x's pixel scale
        let z = values[base + 2] / input * roi.side as f32 / width as f32;
        let visibility = sigmoid(values[base + 3]);

        *landmark = Landmark::new(x, y, z, visibility);
    }

    PoseLandmarks::new(landmarks)
}

impl PoseEstimator for BlazePoseEstimator {
    fn estimate(&mut self, rgb: &Mat) -> Result<Option<PoseLandmarks>> {
        let width = rgb.cols();
        let height = rgb.rows();
        if width <= 0 || height <= 0 {
            return Err(anyhow!("Empty frame"));
        }

        let tracked_roi = if self.config.static_image_mode {
            None
        } else {
            self.previous
                .as_ref()
                .and_then(|p| SquareRoi::around_pose(p, width, height, TRACKING_ROI_SCALE))
        };

        if let Some(roi) = tracked_roi {
            let threshold = self.config.min_tracking_confidence;
            if let Some(pose) = self.try_roi(rgb, &roi, threshold)? {
                self.previous = Some(pose.clone());
                return Ok(Some(pose));
            }
            tracing::debug!("BlazePoseEstimator: track lost, re-detecting on full frame");
        }

        let roi = SquareRoi::full_frame(width, height);
        let threshold = self.config.min_detection_confidence;
        let pose = self.try_roi(rgb, &roi, threshold)?;

        self.previous = if self.config.static_image_mode {
            None
        } else {
            pose.clone()
        };

        Ok(pose)
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays queued presence scores and records every ROI it is asked to run on.
    struct ScriptedModel {
        presences: VecDeque<f32>,
        rois: Rc<RefCell<Vec<SquareRoi>>>,
    }

    impl LandmarkModel for ScriptedModel {
        fn run(&mut self, _rgb: &Mat, roi: &SquareRoi) -> Result<LandmarkOutput> {
            self.rois.borrow_mut().push(*roi);
            let presence = self
                .presences
                .pop_front()
                .ok_or_else(|| anyhow!("model called more often than scripted"))?;

            // landmarks on a diagonal through the middle of the input
            let mut values = vec![0.0f32; MODEL_POINTS * VALUES_PER_POINT];
            for i in 0..LandmarkName::COUNT {
                values[i * VALUES_PER_POINT] = 64.0 + 4.0 * i as f32;
                values[i * VALUES_PER_POINT + 1] = 64.0 + 4.0 * i as f32;
            }
            Ok(LandmarkOutput { presence, values })
        }
    }

    fn scripted(
        config: PoseConfig,
        presences: &[f32],
    ) -> (BlazePoseEstimator, Rc<RefCell<Vec<SquareRoi>>>) {
        let rois = Rc::new(RefCell::new(Vec::new()));
        let model = ScriptedModel {
            presences: presences.iter().copied().collect(),
            rois: Rc::clone(&rois),
        };
        let estimator = BlazePoseEstimator::with_model(config, Box::new(model)).unwrap();
        (estimator, rois)
    }

    fn frame() -> Mat {
        Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, core::Scalar::all(0.0)).unwrap()
    }

    fn full() -> SquareRoi {
        SquareRoi::full_frame(640, 480)
    }

    #[test]
    fn test_tracking_hit_uses_tracking_threshold() {
        let config = PoseConfig {
            min_detection_confidence: 0.8,
            min_tracking_confidence: 0.3,
            ..Default::default()
        };
        // 0.4 would fail detection but passes tracking
        let (mut estimator, rois) = scripted(config, &[0.9, 0.4]);
        let img = frame();

        assert!(estimator.estimate(&img).unwrap().is_some());
        assert!(estimator.estimate(&img).unwrap().is_some());

        let rois = rois.borrow();
        assert_eq!(rois.len(), 2);
        assert_eq!(rois[0], full());
        assert_ne!(rois[1], full());
        assert_eq!(rois[1].side, 400);
    }

    #[test]
    fn test_tracking_miss_falls_back_to_full_frame() {
        let config = PoseConfig {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.7,
            ..Default::default()
        };
        let (mut estimator, rois) = scripted(config, &[0.9, 0.6, 0.9]);
        let img = frame();

        assert!(estimator.estimate(&img).unwrap().is_some());
        assert!(estimator.estimate(&img).unwrap().is_some());

        let rois = rois.borrow();
        assert_eq!(rois.len(), 3);
        assert_eq!(rois[0], full());
        assert_ne!(rois[1], full());
        assert_eq!(rois[2], full());
    }

    #[test]
    fn test_lost_pose_drops_the_track() {
        let (mut estimator, rois) = scripted(PoseConfig::default(), &[0.9, 0.1, 0.1, 0.9]);
        let img = frame();

        assert!(estimator.estimate(&img).unwrap().is_some());
        // tracked and full-frame attempts both miss
        assert!(estimator.estimate(&img).unwrap().is_none());
        // nothing left to track: straight to full frame
        assert!(estimator.estimate(&img).unwrap().is_some());

        let rois = rois.borrow();
        assert_eq!(rois.len(), 4);
        assert_ne!(rois[1], full());
        assert_eq!(rois[2], full());
        assert_eq!(rois[3], full());
    }

    #[test]
    fn test_detection_below_threshold_returns_none() {
        let (mut estimator, rois) = scripted(PoseConfig::default(), &[0.4, 0.9]);
        let img = frame();

        assert!(estimator.estimate(&img).unwrap().is_none());
        assert!(estimator.estimate(&img).unwrap().is_some());
        assert_eq!(*rois.borrow(), vec![full(), full()]);
    }

    #[test]
    fn test_static_image_mode_never_tracks() {
        let config = PoseConfig {
            static_image_mode: true,
            ..Default::default()
        };
        let (mut estimator, rois) = scripted(config, &[0.9, 0.9, 0.9]);
        let img = frame();

        for _ in 0..3 {
            assert!(estimator.estimate(&img).unwrap().is_some());
        }
        assert_eq!(*rois.borrow(), vec![full(), full(), full()]);
    }

    #[test]
    fn test_reset_forgets_previous_pose() {
        let (mut estimator, rois) = scripted(PoseConfig::default(), &[0.9, 0.9]);
        let img = frame();

        assert!(estimator.estimate(&img).unwrap().is_some());
        estimator.reset();
        assert!(estimator.estimate(&img).unwrap().is_some());
        assert_eq!(*rois.borrow(), vec![full(), full()]);
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let (mut estimator, rois) = scripted(PoseConfig::default(), &[]);
        assert!(estimator.estimate(&Mat::default()).is_err());
        assert!(rois.borrow().is_empty());
    }

    #[test]
    fn test_decode_landmarks_full_frame() {
        let mut values = vec![0.0f32; MODEL_POINTS * VALUES_PER_POINT];
        // nose at the center of the input, high visibility logit
        values[0] = 128.0;
        values[1] = 128.0;
        values[2] = 64.0;
        values[3] = 10.0;

        let roi = SquareRoi::full_frame(640, 480);
        let pose = decode_landmarks(&values, &roi, 640, 480);
        let nose = &pose.landmarks[LandmarkName::Nose as usize];

        assert!((nose.x - 0.5).abs() < 1e-6);
        assert!((nose.y - 0.5).abs() < 1e-6);
        // 64 input px = 160 frame px = 0.25 of the width
        assert!((nose.z - 0.25).abs() < 1e-6);
        assert!(nose.visibility > 0.99);

        // zero logit -> 0.5 visibility
        let left_eye = &pose.landmarks[LandmarkName::LeftEye as usize];
        assert!((left_eye.visibility - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_landmarks_ignores_auxiliary_points() {
        let mut values = vec![0.0f32; MODEL_POINTS * VALUES_PER_POINT];
        // first auxiliary point
        values[33 * VALUES_PER_POINT] = 999.0;
        let roi = SquareRoi::full_frame(100, 100);
        let pose = decode_landmarks(&values, &roi, 100, 100);
        assert!(pose.landmarks.iter().all(|l| l.x == 0.0));
    }

    #[test]
    fn test_new_fails_on_missing_model() {
        let config = PoseConfig {
            model_path: Some("/nonexistent/pose_landmark_full.onnx".into()),
            ..Default::default()
        };
        let err = BlazePoseEstimator::new(config).err().unwrap();
        assert!(err.to_string().contains("not found"));
    }
}
