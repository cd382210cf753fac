//! Result types returned by the directory driver.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Structured data the service returned for one document.
///
/// Key order is the order in the tool-call arguments; it becomes the column
/// order of the appended row.
pub type ExtractionResult = serde_json::Map<String, serde_json::Value>;

/// What happened to a single PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// File name as written to the provenance column.
    pub file_name: String,
    /// Number of extracted fields. Zero when skipped.
    pub fields: usize,
    /// Pages sent to the service.
    pub pages_sent: usize,
    /// Wall-clock time for render + request + write.
    pub duration_ms: u64,
    /// `Some` if the service returned nothing usable.
    pub error: Option<FileError>,
}

impl FileOutcome {
    pub fn is_extracted(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a directory run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// PDFs found in the input directory.
    pub total_files: usize,
    /// PDFs that produced a row.
    pub extracted_files: usize,
    /// PDFs skipped because of a [`FileError`].
    pub skipped_files: usize,
    /// Total wall-clock time in milliseconds.
    pub total_duration_ms: u64,
}

/// Complete result of processing one input directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Table rows were appended to.
    pub output_csv: PathBuf,
    /// Per-file outcomes in processing order.
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Outcomes that carry an error.
    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_extracted())
    }
}
