//! Pipeline stages for PDF-to-CSV extraction.
//!
//! Each submodule implements one step applied to a single PDF.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ encode ──▶ client ──▶ writer
//! (pdfium)   (JPEG/b64) (tool call) (CSV row)
//! ```
//!
//! 1. [`render`] — rasterise the first pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`encode`] — JPEG-encode and base64-wrap each page as a data URL
//! 3. [`client`] — one chat-completion request carrying the tool schema;
//!    the only stage with network I/O
//! 4. [`writer`] — append the tool-call arguments as a row of the output table

pub mod client;
pub mod encode;
pub mod render;
pub mod writer;
