/// The 33 body landmarks of the BlazePose topology, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkName {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkName {
    pub const COUNT: usize = 33;

    pub const ALL: [LandmarkName; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Snake-case name used in table headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }
}

/// Per-landmark attribute suffixes, in the order they are flattened.
pub const LANDMARK_COORDS: [&str; 4] = ["x", "y", "z", "visibility"];

/// A single landmark in frame-normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Normalized X (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Normalized Y (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Depth relative to the hips, on roughly the same scale as x
    pub z: f32,
    /// Visibility score (0.0-1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }
}

/// One detected pose: all 33 landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLandmarks {
    pub landmarks: [Landmark; LandmarkName::COUNT],
}

impl PoseLandmarks {
    pub fn new(landmarks: [Landmark; LandmarkName::COUNT]) -> Self {
        Self { landmarks }
    }

    /// Flattens to `x, y, z, visibility` per landmark in glossary order.
    pub fn flatten(&self) -> Vec<f32> {
        self.landmarks
            .iter()
            .flat_map(|l| [l.x, l.y, l.z, l.visibility])
            .collect()
    }

    /// Normalized bounding box `(x_min, y_min, x_max, y_max)` over all landmarks.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;

        for l in &self.landmarks {
            min_x = min_x.min(l.x);
            max_x = max_x.max(l.x);
            min_y = min_y.min(l.y);
            max_y = max_y.max(l.y);
        }

        (min_x, min_y, max_x, max_y)
    }
}

impl Default for PoseLandmarks {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LandmarkName::COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_count() {
        assert_eq!(LandmarkName::COUNT, 33);
        assert_eq!(LandmarkName::ALL.len(), 33);
    }

    #[test]
    fn test_all_is_in_index_order() {
        for (i, name) in LandmarkName::ALL.iter().enumerate() {
            assert_eq!(*name as usize, i);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(LandmarkName::LeftEyeInner.as_str(), "left_eye_inner");
        assert_eq!(LandmarkName::MouthRight.as_str(), "mouth_right");
        assert_eq!(LandmarkName::RightFootIndex.as_str(), "right_foot_index");
    }

    #[test]
    fn test_flatten_order() {
        let mut landmarks = [Landmark::default(); LandmarkName::COUNT];
        landmarks[0] = Landmark::new(0.1, 0.2, 0.3, 0.4);
        landmarks[32] = Landmark::new(0.5, 0.6, 0.7, 0.8);
        let pose = PoseLandmarks::new(landmarks);

        let flat = pose.flatten();
        assert_eq!(flat.len(), 132);
        assert_eq!(&flat[0..4], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(&flat[128..132], &[0.5, 0.6, 0.7, 0.8]);
    }

    #[test]
    fn test_bounds() {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0, 1.0); LandmarkName::COUNT];
        landmarks[LandmarkName::Nose as usize] = Landmark::new(0.4, 0.1, 0.0, 1.0);
        landmarks[LandmarkName::RightAnkle as usize] = Landmark::new(0.7, 0.9, 0.0, 1.0);
        let pose = PoseLandmarks::new(landmarks);

        assert_eq!(pose.bounds(), (0.4, 0.1, 0.7, 0.9));
    }
}
