// Landmark table: header layout and row serialization

use crate::pose::{LandmarkName, PoseLandmarks, LANDMARK_COORDS};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Number of columns: `frame` plus x/y/z/visibility per landmark.
pub const TABLE_COLUMNS: usize = 1 + LandmarkName::COUNT * LANDMARK_COORDS.len();

/// `frame`, then `<landmark>_<coord>` in glossary order.
pub fn table_header() -> Vec<String> {
    let mut header = Vec::with_capacity(TABLE_COLUMNS);
    header.push("frame".to_string());
    for name in LandmarkName::ALL {
        for coord in LANDMARK_COORDS {
            header.push(format!("{}_{}", name.as_str(), coord));
        }
    }
    header
}

/// CSV writer for one video's landmark table.
pub struct PoseTableWriter {
    writer: csv::Writer<File>,
    rows: usize,
}

impl PoseTableWriter {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create table {}", path.display()))?;
        writer.write_record(table_header())?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_pose(&mut self, frame: usize, pose: &PoseLandmarks) -> Result<()> {
        let mut record = Vec::with_capacity(TABLE_COLUMNS);
        record.push(frame.to_string());
        record.extend(pose.flatten().iter().map(|v| v.to_string()));
        self.writer.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// A row with only the frame index set.
    pub fn write_empty(&mut self, frame: usize) -> Result<()> {
        let mut record = vec![String::new(); TABLE_COLUMNS];
        record[0] = frame.to_string();
        self.writer.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes to disk and returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}
