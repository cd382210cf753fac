//! # edgequake-pdf2csv
//!
//! Extract structured fields from folders of PDFs with a multimodal
//! chat-completion API and append them to CSV tables.
//!
//! ## How it works
//!
//! A function catalog lists the available extraction jobs (name, API key,
//! endpoint, model, description); a parameter catalog lists the fields each
//! job should produce. The operator picks one job, its parameters become a
//! JSON-schema tool definition, and every PDF in the job's input folder is
//! sent to the service as page images. The tool-call arguments that come
//! back are appended as one row of the job's output table.
//!
//! ```text
//! GPT_Functions.csv ─┐
//!                    ├─ 1. Catalog  pick a function, collect its parameters
//! GPT_Function_      │  2. Schema   parameters → tool JSON schema
//!   Parameters.csv ──┘
//! Test_Data/<fn>/*.pdf
//!  ├─ 3. Render  first five pages via pdfium (spawn_blocking)
//!  ├─ 4. Encode  JPEG → base64 data URL
//!  ├─ 5. Client  one request per PDF, forced tool call
//!  └─ 6. Writer  append arguments + "Source File" to Output/<fn>.csv
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2csv::{run, Catalog, ExtractionConfig, ExtractionJob, FolderLayout};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layout = FolderLayout::under(".");
//!     let catalog = Catalog::load(&layout.functions_csv, &layout.parameters_csv)?;
//!     let job = ExtractionJob::new(catalog.select("1")?, &layout)?;
//!
//!     let report = run(&job, &ExtractionConfig::default()).await?;
//!     eprintln!(
//!         "{}/{} files extracted into {}",
//!         report.stats.extracted_files,
//!         report.stats.total_files,
//!         report.output_csv.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2csv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2csv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{prompt_for_selection, Catalog, FunctionRecord, FunctionSelection, ParameterRecord};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, FolderLayout};
pub use error::{FileError, Pdf2CsvError};
pub use extract::{process_directory, process_file, run, ExtractionJob};
pub use output::{BatchReport, BatchStats, ExtractionResult, FileOutcome};
pub use pipeline::client::{ChatTransport, HttpTransport, RawResponse};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use schema::ParameterSchema;
