//! Directory driver: run every PDF of a function's input folder through
//! render → request → append.
//!
//! Files are processed strictly one at a time in directory-listing order.
//! A service failure for one file is recorded as a skipped
//! [`FileOutcome`] and the run moves on; rendering and output errors abort
//! the whole run.

use crate::catalog::{FunctionRecord, FunctionSelection, ParameterRecord};
use crate::config::{ExtractionConfig, FolderLayout};
use crate::error::Pdf2CsvError;
use crate::output::{BatchReport, BatchStats, FileOutcome};
use crate::pipeline::client::{self, ChatTransport, HttpTransport};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::writer;
use crate::schema::ParameterSchema;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything later stages need to know about the selected function.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub function: FunctionRecord,
    pub parameters: Vec<ParameterRecord>,
    /// Function name with spaces replaced; sent as the tool name.
    pub tool_name: String,
    pub schema: ParameterSchema,
    /// Folder scanned for `*.pdf` files.
    pub input_dir: PathBuf,
    /// Table the results are appended to.
    pub output_csv: PathBuf,
}

impl ExtractionJob {
    /// Build the job for a selection, resolving folders from `layout`.
    ///
    /// # Errors
    /// * [`Pdf2CsvError::NoParameters`] — the selection carries no parameter rows
    /// * schema errors from [`ParameterSchema::build`]
    pub fn new(selection: FunctionSelection, layout: &FolderLayout) -> Result<Self, Pdf2CsvError> {
        let FunctionSelection {
            function,
            parameters,
        } = selection;

        if parameters.is_empty() {
            return Err(Pdf2CsvError::NoParameters {
                function: function.name,
            });
        }

        let schema = ParameterSchema::build(&parameters)?;
        Ok(Self {
            tool_name: crate::config::normalize_function_name(&function.name),
            input_dir: layout.input_dir(&function.name),
            output_csv: layout.output_csv(&function.name),
            function,
            parameters,
            schema,
        })
    }
}

/// Process the job's input folder with pdfium and the HTTP transport.
pub async fn run(job: &ExtractionJob, config: &ExtractionConfig) -> Result<BatchReport, Pdf2CsvError> {
    let renderer = PdfiumRenderer::from_config(config);
    let transport = HttpTransport::new()?;
    process_directory(job, &renderer, &transport, config).await
}

/// Process every PDF in `job.input_dir`.
///
/// # Returns
/// `Ok(BatchReport)` once every file has been attempted, even if some were
/// skipped (check `report.stats.skipped_files`).
///
/// # Errors
/// * [`Pdf2CsvError::InputDirNotFound`] — the input folder does not exist
/// * [`Pdf2CsvError::Io`] — the output folder cannot be created or the
///   input folder cannot be listed
/// * any rendering or writing error for an individual file
pub async fn process_directory<R, T>(
    job: &ExtractionJob,
    renderer: &R,
    transport: &T,
    config: &ExtractionConfig,
) -> Result<BatchReport, Pdf2CsvError>
where
    R: PageRenderer,
    T: ChatTransport,
{
    let batch_start = Instant::now();

    if !job.input_dir.is_dir() {
        return Err(Pdf2CsvError::InputDirNotFound {
            path: job.input_dir.clone(),
        });
    }

    if let Some(parent) = job.output_csv.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| Pdf2CsvError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let pdfs = list_pdfs(&job.input_dir).await?;
    let total_files = pdfs.len();
    info!(
        "Found {} PDF(s) in {}",
        total_files,
        job.input_dir.display()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total_files);
    }

    let mut files = Vec::with_capacity(total_files);
    for (idx, path) in pdfs.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(idx + 1, total_files, &file_name_of(path));
        }

        let outcome = process_file(job, path, renderer, transport, config).await?;

        if let Some(ref cb) = config.progress_callback {
            match &outcome.error {
                None => cb.on_file_extracted(&outcome.file_name, outcome.fields),
                Some(e) => cb.on_file_skipped(&outcome.file_name, &e.to_string()),
            }
        }
        files.push(outcome);
    }

    let extracted_files = files.iter().filter(|f| f.is_extracted()).count();
    let stats = BatchStats {
        total_files,
        extracted_files,
        skipped_files: total_files - extracted_files,
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {}/{} files, {}ms total",
        extracted_files, total_files, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total_files, extracted_files);
    }

    Ok(BatchReport {
        output_csv: job.output_csv.clone(),
        files,
        stats,
    })
}

/// Render, request and append a single PDF.
///
/// A [`crate::error::FileError`] from the service ends up in the returned
/// outcome; only rendering and writing errors are returned as `Err`.
pub async fn process_file<R, T>(
    job: &ExtractionJob,
    pdf_path: &Path,
    renderer: &R,
    transport: &T,
    config: &ExtractionConfig,
) -> Result<FileOutcome, Pdf2CsvError>
where
    R: PageRenderer,
    T: ChatTransport,
{
    let start = Instant::now();
    let file_name = file_name_of(pdf_path);
    info!("Processing {}", file_name);

    let images = renderer.render_data_urls(pdf_path).await?;
    let pages_sent = images.len();
    debug!("{}: sending {} page image(s)", file_name, pages_sent);

    let (fields, error) = match client::request_extraction(job, &images, transport, config).await {
        Ok(result) => {
            writer::append_result(&job.output_csv, &file_name, &result)?;
            info!("Data appended to {}", job.output_csv.display());
            (result.len(), None)
        }
        Err(e) => {
            warn!("Skipping {}: {}", file_name, e);
            (0, Some(e))
        }
    };

    Ok(FileOutcome {
        file_name,
        fields,
        pages_sent,
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    })
}

/// Regular files in `dir` whose name ends in `.pdf`, any case, in listing order.
pub async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, Pdf2CsvError> {
    let io_error = |source| Pdf2CsvError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut pdfs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if is_pdf_name(&path) && path.is_file() {
            pdfs.push(path);
        }
    }
    Ok(pdfs)
}

fn is_pdf_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
