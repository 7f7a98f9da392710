// Pose estimation: landmark model, tracking ROI and landmark types

pub mod blazepose;
pub mod estimator;
pub mod landmark;
pub mod preprocess;

pub use blazepose::BlazePoseEstimator;
pub use estimator::{PoseConfig, PoseEstimator};
pub use landmark::{LandmarkName, PoseLandmarks, LANDMARK_COORDS};
