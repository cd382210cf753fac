//! Error types for the edgequake-pdf2csv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2CsvError`] — **Fatal**: the run cannot proceed at all (bad
//!   selection, no parameters for the function, unreadable catalog, pdfium
//!   failure, output file not writable). Returned as `Err(Pdf2CsvError)` and
//!   mapped to exit code 1 by the binary.
//!
//! * [`FileError`] — **Non-fatal**: the remote service did not return usable
//!   data for one PDF (bad status, malformed body, no tool call). Stored
//!   inside [`crate::output::FileOutcome`]; the directory run continues with
//!   the next file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2csv library.
///
/// Per-file service failures use [`FileError`] and are stored in
/// [`crate::output::FileOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2CsvError {
    // ── Operator input ────────────────────────────────────────────────────
    /// The selection was not a number between 1 and the catalog size.
    #[error("Invalid selection '{input}': expected a number between 1 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// The interactive prompt could not be written or answered.
    #[error("Failed to read the function selection: {0}")]
    Prompt(#[source] std::io::Error),

    /// The function catalog has no rows to choose from.
    #[error("Function catalog '{path}' contains no functions")]
    EmptyCatalog { path: PathBuf },

    // ── Catalog / configuration ───────────────────────────────────────────
    /// A catalog file does not exist.
    #[error("Catalog file not found: '{path}'")]
    CatalogNotFound { path: PathBuf },

    /// A catalog file could not be parsed (bad CSV, missing column).
    #[error("Failed to read catalog '{path}': {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No parameter rows reference the selected function.
    #[error("No parameters found for function '{function}'")]
    NoParameters { function: String },

    /// A parameter row carries a type that is not a JSON-schema type.
    #[error("Parameter '{parameter}' has invalid type '{value}'\nExpected one of: string, number, integer, boolean, array, object, null")]
    InvalidParameterType { parameter: String, value: String },

    /// A parameter row carries an enum cell that is not a literal list.
    #[error("Parameter '{parameter}' has an invalid enum list: {detail}")]
    InvalidEnum { parameter: String, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    /// The PDF could not be opened by pdfium.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// A rendered page could not be JPEG-encoded.
    #[error("Image encoding failed for page {page}: {source}")]
    ImageEncodingFailed {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The PDF folder for the selected function does not exist.
    #[error("Input directory not found: '{path}'")]
    InputDirNotFound { path: PathBuf },

    /// Could not create, open or list a file or directory.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV writer failed while appending a row.
    #[error("Failed to append row to '{path}': {source}")]
    CsvWriteFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single PDF.
///
/// Stored in [`crate::output::FileOutcome`] when the remote service returns
/// nothing usable. The directory run always continues with the next file.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {detail}")]
    Transport { detail: String },

    /// The service answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The 200 body is not JSON or lacks the expected message shape.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    /// The response has no `choices` (or an empty list).
    #[error("no choices found in the response")]
    NoChoices,

    /// The first choice carries no `tool_calls`.
    #[error("no tool calls found in the response")]
    NoToolCalls,

    /// The tool-call arguments are not a JSON object.
    #[error("tool-call arguments are not a JSON object: {detail}")]
    InvalidArguments { detail: String },

    /// The tool call returned an empty object.
    #[error("no data extracted")]
    EmptyExtraction,
}
