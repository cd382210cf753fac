//! CLI binary for edgequake-pdf2csv.
//!
//! A thin shim over the library crate: loads the catalogs, asks which
//! function to run, maps CLI flags to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2csv::{
    prompt_for_selection, run, Catalog, ExtractionConfig, ExtractionJob,
    ExtractionProgressCallback, FolderLayout, FunctionSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per PDF.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the file currently being processed.
    current_start: Mutex<Option<Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports how many PDFs there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current_start: Mutex::new(None),
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.current_start
            .lock()
            .ok()
            .and_then(|mut start| start.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting data from {total_files} PDF(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total_files: usize, file_name: &str) {
        if let Ok(mut start) = self.current_start.lock() {
            *start = Some(Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_extracted(&self, file_name: &str, fields: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:<40}  {:<10}  {}",
            green("✓"),
            file_name,
            dim(&format!("{fields:>3} fields")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, file_name: &str, reason: &str) {
        let secs = self.elapsed_secs();
        self.skipped.fetch_add(1, Ordering::SeqCst);

        let msg: String = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            file_name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, extracted: usize) {
        let skipped = total_files.saturating_sub(extracted);
        self.bar.finish_and_clear();

        if skipped == 0 {
            eprintln!(
                "{} {} file(s) extracted successfully",
                green("✔"),
                bold(&extracted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) extracted  ({} skipped)",
                if extracted == 0 { red("✘") } else { cyan("⚠") },
                bold(&extracted.to_string()),
                total_files,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Pick a function interactively, using ./GPT Functions, ./Test_Data, ./Output
  pdf2csv

  # List the available functions
  pdf2csv --list

  # Run the second function without prompting
  pdf2csv --select 2

  # Different project folder, JSON report on stdout
  pdf2csv --base-dir /data/invoices --select 1 --json > report.json

FOLDER LAYOUT:
  <base>/GPT Functions/GPT_Functions.csv             function catalog
  <base>/GPT Functions/GPT_Function_Parameters.csv   parameter catalog
  <base>/Test_Data/<Function_Name>/*.pdf             input PDFs
  <base>/Output/<Function_Name>.csv                  appended results

  <Function_Name> is the catalog name with spaces replaced by underscores.

ENVIRONMENT VARIABLES:
  PDF2CSV_BASE_DIR        Project folder (default: current directory)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter
"#;

/// Extract structured data from PDFs into CSV tables using a chat-completion API.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2csv",
    version,
    about = "Extract structured data from PDFs into CSV tables using a chat-completion API",
    long_about = "Reads a function catalog and a parameter catalog, lets you pick one function, \
sends the first pages of every PDF in the function's input folder to the function's endpoint \
with a generated tool schema, and appends the returned fields to the function's output table.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Project folder holding `GPT Functions/`, `Test_Data/` and `Output/`.
    #[arg(long, env = "PDF2CSV_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Function catalog CSV (overrides the default under --base-dir).
    #[arg(long, env = "PDF2CSV_FUNCTIONS")]
    functions: Option<PathBuf>,

    /// Parameter catalog CSV (overrides the default under --base-dir).
    #[arg(long, env = "PDF2CSV_PARAMETERS")]
    parameters: Option<PathBuf>,

    /// Folder containing one input folder per function.
    #[arg(long, env = "PDF2CSV_INPUT_ROOT")]
    input_root: Option<PathBuf>,

    /// Folder receiving one output table per function.
    #[arg(long, env = "PDF2CSV_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// 1-based function number; skips the interactive prompt.
    #[arg(long)]
    select: Option<String>,

    /// Print the numbered function list and exit.
    #[arg(long)]
    list: bool,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2CSV_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Pages rendered per PDF.
    #[arg(long, env = "PDF2CSV_MAX_PAGES", default_value_t = 5)]
    max_pages: usize,

    /// Max output tokens per request.
    #[arg(long, env = "PDF2CSV_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: u32,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDF2CSV_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (includes response bodies).
    #[arg(short, long, env = "PDF2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2CSV_QUIET")]
    quiet: bool,
}

impl Cli {
    fn layout(&self) -> FolderLayout {
        let mut layout = FolderLayout::under(&self.base_dir);
        if let Some(ref path) = self.functions {
            layout.functions_csv = path.clone();
        }
        if let Some(ref path) = self.parameters {
            layout.parameters_csv = path.clone();
        }
        if let Some(ref path) = self.input_root {
            layout.input_root = path.clone();
        }
        if let Some(ref path) = self.output_root {
            layout.output_root = path.clone();
        }
        layout
    }

    /// Where the interactive menu is shown. stdout carries the report with `--json`.
    fn prompt_on_stderr(&self) -> bool {
        self.json
    }

    fn prompt_output(&self) -> Box<dyn Write> {
        if self.prompt_on_stderr() {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Catalogs ─────────────────────────────────────────────────────────
    let layout = cli.layout();
    let catalog = Catalog::load(&layout.functions_csv, &layout.parameters_csv)
        .context("Failed to load the function catalogs")?;

    if cli.list {
        print!("{}", catalog.format_menu());
        return Ok(());
    }

    let selection = match cli.select {
        Some(ref input) => catalog.select(input),
        None => tokio::task::block_in_place(|| {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = cli.prompt_output();
            prompt_for_selection(&catalog, &mut input, &mut output)
        }),
    }
    .context("Invalid function selection")?;

    if !cli.quiet && !cli.json {
        print_selection(&selection);
    }

    let job = ExtractionJob::new(selection, &layout)
        .context("Invalid parameter catalog for the selected function")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let report = run(&job, &config).await.context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Extracted {}/{} file(s) in {}ms",
                report.stats.extracted_files,
                report.stats.total_files,
                report.stats.total_duration_ms
            );
            for outcome in report.skipped() {
                if let Some(ref e) = outcome.error {
                    eprintln!("  skipped {}: {}", outcome.file_name, e);
                }
            }
        }
        eprintln!(
            "   {}  →  {}",
            dim(&format!("{}ms total", report.stats.total_duration_ms)),
            bold(&report.output_csv.display().to_string()),
        );
    }

    Ok(())
}

/// Echo the chosen function and its parameter rows, key masked.
fn print_selection(selection: &FunctionSelection) {
    let function = &selection.function;
    println!();
    println!("{}", bold("Selected Function:"));
    println!("  Function_Name: {}", function.name);
    println!("  API_Key:       {}", function.masked_api_key());
    println!("  Endpoint:      {}", function.endpoint);
    println!("  Model:         {}", function.model);
    println!("  Description:   {}", function.description);
    println!();
    println!("{}", bold("Function Parameters:"));
    for p in &selection.parameters {
        println!(
            "  {:<28} {:<8} {:<3} {}",
            p.parameter_name,
            p.parameter_type,
            p.required.as_deref().unwrap_or(""),
            dim(p.enum_literal.as_deref().unwrap_or(&p.description)),
        );
    }
    println!();
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .max_pages(cli.max_pages)
        .max_tokens(cli.max_tokens);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
