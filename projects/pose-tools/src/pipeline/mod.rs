// Batch pipelines: landmark extraction and recording split

pub mod crop;
pub mod extract;
pub mod split;
pub mod table;
pub mod types;
