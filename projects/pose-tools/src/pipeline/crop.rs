use crate::video::probe::VideoDimensions;
use anyhow::Result;

/// Rectangular pixel region of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Value for ffmpeg's `crop` filter: `w:h:x:y`.
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// Vertical split of a two-person recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitGeometry {
    pub width: u32,
    pub height: u32,
    pub split_x: u32,
}

impl SplitGeometry {
    /// `split_x = floor(width / 2) + offset`. The split line must leave at
    /// least one column on each side.
    pub fn new(dims: VideoDimensions, offset: u32) -> Result<Self> {
        let split_x = (dims.width / 2).checked_add(offset).ok_or_else(|| {
            anyhow::anyhow!(
                "Split offset {} overflows for a {}px wide frame",
                offset,
                dims.width
            )
        })?;
        if split_x == 0 || split_x >= dims.width {
            anyhow::bail!(
                "Split point {} is outside the {}px wide frame (offset {})",
                split_x,
                dims.width,
                offset
            );
        }

        Ok(Self {
            width: dims.width,
            height: dims.height,
            split_x,
        })
    }

    /// Left region: `[0, split_x)`.
    pub fn crop_a(&self) -> CropRegion {
        CropRegion {
            x: 0,
            y: 0,
            width: self.split_x,
            height: self.height,
        }
    }

    /// Right region: `[split_x, width)`.
    pub fn crop_b(&self) -> CropRegion {
        CropRegion {
            x: self.split_x,
            y: 0,
            width: self.width - self.split_x,
            height: self.height,
        }
    }
}
