//! Configuration types for a PDF-to-CSV extraction run.
//!
//! Rendering and request knobs live in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Where files are read from and written to is
//! described separately by [`FolderLayout`], because the layout depends on
//! which function the operator selects while the knobs do not.

use crate::error::Pdf2CsvError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the folder holding both catalogs, relative to the base directory.
pub const CATALOG_DIR: &str = "GPT Functions";
/// Default file name of the function catalog.
pub const FUNCTIONS_FILE: &str = "GPT_Functions.csv";
/// Default file name of the parameter catalog.
pub const PARAMETERS_FILE: &str = "GPT_Function_Parameters.csv";
/// Default root of the per-function PDF folders.
pub const INPUT_ROOT: &str = "Test_Data";
/// Default root of the per-function output tables.
pub const OUTPUT_ROOT: &str = "Output";

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2csv::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(150)
///     .max_pages(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 3);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2400.
    ///
    /// Caps large-format pages independently of DPI; the other side is
    /// scaled proportionally.
    pub max_rendered_pixels: u32,

    /// Number of leading pages sent to the service per PDF. Default: 5.
    pub max_pages: usize,

    /// Sampling temperature for the completion. Default: 0.0.
    pub temperature: f32,

    /// Token cap sent with every request. Default: 4096.
    pub max_tokens: u32,

    /// Custom system message. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom user instruction. If None, uses [`crate::prompts::EXTRACTION_INSTRUCTION`].
    pub instruction: Option<String>,

    /// Receives per-file events while a directory is processed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2400,
            max_pages: 5,
            temperature: 0.0,
            max_tokens: 4096,
            system_prompt: None,
            instruction: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("max_pages", &self.max_pages)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .field("instruction", &self.instruction)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2CsvError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2CsvError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_pages == 0 {
            return Err(Pdf2CsvError::InvalidConfig(
                "At least one page must be rendered per PDF".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2CsvError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Folder layout ────────────────────────────────────────────────────────

/// Where catalogs, PDFs and output tables live.
///
/// The default layout is rooted at a base directory:
///
/// ```text
/// <base>/GPT Functions/GPT_Functions.csv
/// <base>/GPT Functions/GPT_Function_Parameters.csv
/// <base>/Test_Data/<Function_Name>/*.pdf
/// <base>/Output/<Function_Name>.csv
/// ```
///
/// where `<Function_Name>` has spaces replaced by underscores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub functions_csv: PathBuf,
    pub parameters_csv: PathBuf,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
}

impl FolderLayout {
    /// The default layout under `base`.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let catalogs = base.join(CATALOG_DIR);
        Self {
            functions_csv: catalogs.join(FUNCTIONS_FILE),
            parameters_csv: catalogs.join(PARAMETERS_FILE),
            input_root: base.join(INPUT_ROOT),
            output_root: base.join(OUTPUT_ROOT),
        }
    }

    /// Folder holding the PDFs for a function.
    pub fn input_dir(&self, function_name: &str) -> PathBuf {
        self.input_root.join(normalize_function_name(function_name))
    }

    /// Output table for a function.
    pub fn output_csv(&self, function_name: &str) -> PathBuf {
        self.output_root
            .join(format!("{}.csv", normalize_function_name(function_name)))
    }
}

/// Replace spaces with underscores.
///
/// The result names the tool sent to the service as well as the input
/// folder and the output table.
pub fn normalize_function_name(name: &str) -> String {
    name.replace(' ', "_")
}
