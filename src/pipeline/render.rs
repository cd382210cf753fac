//! PDF rasterisation: render the leading pages of a PDF via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so rendering runs in
//! `tokio::task::spawn_blocking`. Only the first `max_pages` pages are
//! rendered; shorter documents yield fewer images.

use crate::config::ExtractionConfig;
use crate::error::Pdf2CsvError;
use crate::pipeline::encode;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns a PDF into the ordered image URLs sent to the service.
///
/// [`PdfiumRenderer`] is the production implementation; the directory
/// driver is generic over this trait so it can run without pdfium.
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    /// Render the leading pages of `pdf_path` as data URLs, in page order.
    async fn render_data_urls(&self, pdf_path: &Path) -> Result<Vec<String>, Pdf2CsvError>;
}

/// Renders with pdfium and encodes each page as a JPEG data URL.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    dpi: u32,
    max_rendered_pixels: u32,
    max_pages: usize,
}

impl PdfiumRenderer {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            max_pages: config.max_pages,
        }
    }
}

impl PageRenderer for PdfiumRenderer {
    async fn render_data_urls(&self, pdf_path: &Path) -> Result<Vec<String>, Pdf2CsvError> {
        let images = render_pages(pdf_path, self.dpi, self.max_rendered_pixels, self.max_pages).await?;

        images
            .iter()
            .enumerate()
            .map(|(idx, img)| {
                encode::encode_page(img).map_err(|source| Pdf2CsvError::ImageEncodingFailed {
                    page: idx + 1,
                    source,
                })
            })
            .collect()
    }
}

/// Number of pages rendered for a document of `total_pages`.
pub fn pages_to_render(total_pages: usize, max_pages: usize) -> usize {
    total_pages.min(max_pages)
}

/// Rasterise pages `1..=max_pages` of a PDF (fewer if the document is shorter).
pub async fn render_pages(
    pdf_path: &Path,
    dpi: u32,
    max_rendered_pixels: u32,
    max_pages: usize,
) -> Result<Vec<DynamicImage>, Pdf2CsvError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_rendered_pixels, max_pages)
    })
    .await
    .map_err(|e| Pdf2CsvError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the
/// system library path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2CsvError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(PathBuf::from(path)),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2CsvError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_rendered_pixels: u32,
    max_pages: usize,
) -> Result<Vec<DynamicImage>, Pdf2CsvError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| Pdf2CsvError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let count = pages_to_render(total_pages, max_pages);
    info!(
        "{}: {} pages, rendering {}",
        pdf_path.display(),
        total_pages,
        count
    );

    let max_px = max_rendered_pixels as i32;
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_px)
        .set_maximum_height(max_px);

    let mut results = Vec::with_capacity(count);
    for idx in 0..count {
        let rasterisation_failed = |e: PdfiumError| Pdf2CsvError::RasterisationFailed {
            path: pdf_path.to_path_buf(),
            page: idx + 1,
            detail: format!("{:?}", e),
        };

        let page = pages.get(idx as u16).map_err(rasterisation_failed)?;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(rasterisation_failed)?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        results.push(image);
    }

    Ok(results)
}
