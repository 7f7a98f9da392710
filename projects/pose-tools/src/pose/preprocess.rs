use super::landmark::PoseLandmarks;
use anyhow::{anyhow, bail, Result};
use ndarray::Array4;
use opencv::{core, imgproc, prelude::*};

/// A square region of interest in frame pixels. May extend past the frame
/// edges; the outside is padded with black when extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareRoi {
    pub x: i32,
    pub y: i32,
    pub side: i32,
}

impl SquareRoi {
    /// The whole frame, centered in a square of side `max(width, height)`.
    pub fn full_frame(width: i32, height: i32) -> Self {
        let side = width.max(height).max(1);
        Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            side,
        }
    }

    /// Square around a previous pose, enlarged by `scale`.
    /// Returns `None` when the pose collapses to a point.
    pub fn around_pose(pose: &PoseLandmarks, width: i32, height: i32, scale: f32) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = pose.bounds();
        let w = (max_x - min_x) * width as f32;
        let h = (max_y - min_y) * height as f32;
        let side = (w.max(h) * scale).round() as i32;
        if side < 2 {
            return None;
        }

        let cx = (min_x + max_x) * 0.5 * width as f32;
        let cy = (min_y + max_y) * 0.5 * height as f32;

        Some(Self {
            x: (cx - side as f32 / 2.0).round() as i32,
            y: (cy - side as f32 / 2.0).round() as i32,
            side,
        })
    }

    /// Maps a point in model-input pixels back to frame-normalized coordinates.
    pub fn to_frame_normalized(
        &self,
        input_x: f32,
        input_y: f32,
        input_size: i32,
        width: i32,
        height: i32,
    ) -> (f32, f32) {
        let scale = self.side as f32 / input_size as f32;
        let px = self.x as f32 + input_x * scale;
        let py = self.y as f32 + input_y * scale;
        (px / width as f32, py / height as f32)
    }
}

/// Crops `roi` out of `img` (padding outside the frame) and resizes it to
/// `size`x`size`.
pub fn extract_roi(img: &core::Mat, roi: &SquareRoi, size: i32) -> Result<core::Mat> {
    let frame = img.size()?;

    let ix0 = roi.x.max(0);
    let iy0 = roi.y.max(0);
    let ix1 = (roi.x + roi.side).min(frame.width);
    let iy1 = (roi.y + roi.side).min(frame.height);

    if ix1 <= ix0 || iy1 <= iy0 {
        bail!("ROI {:?} lies outside the {}x{} frame", roi, frame.width, frame.height);
    }

    let rect = core::Rect::new(ix0, iy0, ix1 - ix0, iy1 - iy0);
    let view = core::Mat::roi(img, rect)?;
    let mut cropped = core::Mat::default();
    view.copy_to(&mut cropped)?;

    let mut padded = core::Mat::default();
    core::copy_make_border(
        &cropped,
        &mut padded,
        iy0 - roi.y,
        roi.y + roi.side - iy1,
        ix0 - roi.x,
        roi.x + roi.side - ix1,
        core::BORDER_CONSTANT,
        core::Scalar::all(0.0),
    )?;

    let mut resized = core::Mat::default();
    imgproc::resize(
        &padded,
        &mut resized,
        core::Size::new(size, size),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    Ok(resized)
}

/// Converts an 8-bit 3-channel Mat into a `[1, H, W, 3]` tensor scaled to [0, 1].
pub fn to_input_tensor(mat: &core::Mat) -> Result<Array4<f32>> {
    if mat.typ() != core::CV_8UC3 {
        bail!("Expected an 8-bit 3-channel image, got type {}", mat.typ());
    }
    if !mat.is_continuous() {
        return Err(anyhow!("Mat is not continuous"));
    }

    let size = mat.size()?;
    let values: Vec<f32> = mat
        .data_bytes()?
        .iter()
        .map(|&b| b as f32 / 255.0)
        .collect();

    let tensor = Array4::from_shape_vec(
        (1, size.height as usize, size.width as usize, 3),
        values,
    )?;

    Ok(tensor)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::{Landmark, LandmarkName};

    #[test]
    fn test_full_frame_roi_is_centered_square() {
        let roi = SquareRoi::full_frame(640, 480);
        assert_eq!(roi, SquareRoi { x: 0, y: -80, side: 640 });

        let roi = SquareRoi::full_frame(480, 640);
        assert_eq!(roi, SquareRoi { x: -80, y: 0, side: 640 });
    }

    #[test]
    fn test_roi_around_pose() {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0, 1.0); LandmarkName::COUNT];
        landmarks[0] = Landmark::new(0.25, 0.25, 0.0, 1.0);
        landmarks[1] = Landmark::new(0.75, 0.75, 0.0, 1.0);
        let pose = PoseLandmarks::new(landmarks);

        // bbox is 200x200 px on a 400x400 frame, centered at (200, 200)
        let roi = SquareRoi::around_pose(&pose, 400, 400, 1.25).unwrap();
        assert_eq!(roi.side, 250);
        assert_eq!(roi.x, 75);
        assert_eq!(roi.y, 75);
    }

    #[test]
    fn test_roi_around_degenerate_pose() {
        let pose = PoseLandmarks::new([Landmark::new(0.5, 0.5, 0.0, 1.0); LandmarkName::COUNT]);
        assert!(SquareRoi::around_pose(&pose, 640, 480, 1.25).is_none());
    }

    #[test]
    fn test_to_frame_normalized() {
        let roi = SquareRoi::full_frame(640, 480);
        // center of the model input maps to the center of the frame
        let (x, y) = roi.to_frame_normalized(128.0, 128.0, 256, 640, 480);
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 0.5).abs() < 1e-6);

        // top-left of the input is above the frame because of the padding
        let (x, y) = roi.to_frame_normalized(0.0, 0.0, 256, 640, 480);
        assert_eq!(x, 0.0);
        assert!(y < 0.0);
    }

    #[test]
    fn test_extract_roi_pads_and_resizes() {
        let image = core::Mat::new_rows_cols_with_default(
            480,
            640,
            core::CV_8UC3,
            core::Scalar::all(255.0),
        )
        .unwrap();

        let roi = SquareRoi::full_frame(640, 480);
        let out = extract_roi(&image, &roi, 256).unwrap();
        let size = out.size().unwrap();
        assert_eq!(size.width, 256);
        assert_eq!(size.height, 256);

        // top rows come from the black padding, middle rows from the frame
        let top = out.at_2d::<core::Vec3b>(0, 128).unwrap();
        assert_eq!(top[0], 0);
        let middle = out.at_2d::<core::Vec3b>(128, 128).unwrap();
        assert_eq!(middle[0], 255);
    }

    #[test]
    fn test_extract_roi_outside_frame_fails() {
        let image =
            core::Mat::new_rows_cols_with_default(100, 100, core::CV_8UC3, core::Scalar::all(0.0))
                .unwrap();
        let roi = SquareRoi { x: 200, y: 200, side: 50 };
        assert!(extract_roi(&image, &roi, 256).is_err());
    }

    #[test]
    fn test_to_input_tensor() {
        let image =
            core::Mat::new_rows_cols_with_default(4, 2, core::CV_8UC3, core::Scalar::all(255.0))
                .unwrap();
        let tensor = to_input_tensor(&image).unwrap();
        assert_eq!(tensor.shape(), &[1, 4, 2, 3]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
