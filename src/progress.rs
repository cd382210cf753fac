//! Progress-callback trait for per-file extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the directory driver works through the PDFs.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2csv::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     extracted: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_file_extracted(&self, file_name: &str, fields: usize) {
//!         self.extracted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{file_name}: {fields} fields");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { extracted: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the directory driver as it processes each PDF.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed one at a time, so events for
/// one file never interleave with another's.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the directory has been listed.
    ///
    /// # Arguments
    /// * `total_files` — number of PDFs that will be processed
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a PDF is rendered.
    fn on_file_start(&self, index: usize, total_files: usize, file_name: &str) {
        let _ = (index, total_files, file_name);
    }

    /// Called when a row was appended for the PDF.
    ///
    /// # Arguments
    /// * `file_name` — source file name written to the provenance column
    /// * `fields`    — number of extracted fields (excluding provenance)
    fn on_file_extracted(&self, file_name: &str, fields: usize) {
        let _ = (file_name, fields);
    }

    /// Called when the service returned nothing usable for the PDF.
    fn on_file_skipped(&self, file_name: &str, reason: &str) {
        let _ = (file_name, reason);
    }

    /// Called once after every PDF has been attempted.
    ///
    /// # Arguments
    /// * `total_files` — PDFs attempted
    /// * `extracted`   — PDFs that produced a row
    fn on_batch_complete(&self, total_files: usize, extracted: usize) {
        let _ = (total_files, extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        starts: AtomicUsize,
        extracted: AtomicUsize,
        skipped: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total_files: usize, _file_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_extracted(&self, _file_name: &str, _fields: usize) {
            self.extracted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, file_name: &str, _reason: &str) {
            self.skipped.lock().unwrap().push(file_name.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, "a.pdf");
        cb.on_file_extracted("a.pdf", 4);
        cb.on_file_skipped("b.pdf", "no tool calls");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        tracker.on_file_start(1, 3, "a.pdf");
        tracker.on_file_extracted("a.pdf", 2);
        tracker.on_file_start(2, 3, "b.pdf");
        tracker.on_file_skipped("b.pdf", "HTTP 500");
        tracker.on_file_start(3, 3, "c.pdf");
        tracker.on_file_extracted("c.pdf", 2);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.extracted.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.skipped.lock().unwrap(), vec!["b.pdf".to_string()]);
    }
}
