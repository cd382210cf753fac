//! Directory-driver tests with an in-memory renderer and transport.
//!
//! No pdfium library or network access is needed: the fake renderer turns
//! each PDF into a single "image" naming the file, and the fake transport
//! answers according to the image it finds in the request body.

use edgequake_pdf2csv::pipeline::client::ChatCompletionRequest;
use edgequake_pdf2csv::{
    process_directory, Catalog, ChatTransport, ExtractionConfig, ExtractionJob,
    ExtractionProgressCallback, FileError, FolderLayout, PageRenderer, Pdf2CsvError, RawResponse,
};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};

const FUNCTIONS_CSV: &str = "\
Function_Name,API_Key,Endpoint,Model,Description
Invoice Reader,sk-test-0123456789,https://api.example.com/v1/chat/completions,gpt-4o,Reads invoices
";

const PARAMETERS_CSV: &str = "\
GPT_Function_Parent,GPT_Function_Parameter_Name,Paremeter_Type,Parameter_Description,Parameter_Enums,Required
Invoice Reader,vendor,string,Vendor name,,Yes
Invoice Reader,currency,string,Currency code,\"['EUR', 'USD']\",Yes
";

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FakeRenderer;

impl PageRenderer for FakeRenderer {
    async fn render_data_urls(&self, pdf_path: &Path) -> Result<Vec<String>, Pdf2CsvError> {
        let name = pdf_path.file_name().unwrap().to_string_lossy();
        if name.starts_with("broken") {
            return Err(Pdf2CsvError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: "bad header".into(),
            });
        }
        Ok(vec![format!("data:image/jpeg;base64,{name}")])
    }
}

/// Replies with a tool call unless the rendered file name starts with `a`.
#[derive(Default)]
struct FakeTransport {
    requests: Mutex<Vec<serde_json::Value>>,
}

impl ChatTransport for FakeTransport {
    async fn post_json(
        &self,
        _endpoint: &str,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<RawResponse, FileError> {
        assert_eq!(api_key, "sk-test-0123456789");
        let body = serde_json::to_value(body).unwrap();
        let url = body["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .to_string();
        self.requests.lock().unwrap().push(body);

        let message = if url.ends_with("a.pdf") {
            json!({"role": "assistant", "content": "no function call here"})
        } else {
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "Invoice_Reader",
                        "arguments": "{\"vendor\": \"Acme\", \"currency\": \"EUR\"}"
                    }
                }]
            })
        };

        Ok(RawResponse {
            status: 200,
            body: json!({"choices": [{"index": 0, "message": message}]}).to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ExtractionProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start {total_files}"));
    }

    fn on_file_extracted(&self, file_name: &str, fields: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("extracted {file_name} {fields}"));
    }

    fn on_file_skipped(&self, file_name: &str, _reason: &str) {
        self.events.lock().unwrap().push(format!("skipped {file_name}"));
    }

    fn on_batch_complete(&self, total_files: usize, extracted: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {total_files} {extracted}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn job_under(base: &Path) -> ExtractionJob {
    let catalog = Catalog::from_readers(FUNCTIONS_CSV.as_bytes(), PARAMETERS_CSV.as_bytes()).unwrap();
    let selection = catalog.select("1").unwrap();
    ExtractionJob::new(selection, &FolderLayout::under(base)).unwrap()
}

fn seed_input(job: &ExtractionJob, files: &[&str]) {
    std::fs::create_dir_all(&job.input_dir).unwrap();
    for name in files {
        std::fs::write(job.input_dir.join(name), b"%PDF-1.7").unwrap();
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_tool_calls_skips_file_and_continues() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &["a.pdf", "b.PDF", "notes.txt"]);

    let transport = FakeTransport::default();
    let report = tokio_test::assert_ok!(
        process_directory(&job, &FakeRenderer, &transport, &ExtractionConfig::default()).await
    );

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.extracted_files, 1);
    assert_eq!(report.stats.skipped_files, 1);
    assert_eq!(transport.requests.lock().unwrap().len(), 2);

    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].file_name, "a.pdf");
    assert_eq!(skipped[0].error, Some(FileError::NoToolCalls));

    let extracted = report.files.iter().find(|f| f.is_extracted()).unwrap();
    assert_eq!(extracted.file_name, "b.PDF");
    assert_eq!(extracted.fields, 2);
    assert_eq!(extracted.pages_sent, 1);

    assert_eq!(report.output_csv, base.path().join("Output/Invoice_Reader.csv"));
    let text = std::fs::read_to_string(&report.output_csv).unwrap();
    assert_eq!(text, "vendor,currency,Source File\r\nAcme,EUR,b.PDF\r\n");
}

#[tokio::test]
async fn request_carries_function_schema() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &["b.pdf"]);

    let transport = FakeTransport::default();
    process_directory(&job, &FakeRenderer, &transport, &ExtractionConfig::default())
        .await
        .unwrap();

    let requests = transport.requests.lock().unwrap();
    let tool = &requests[0]["tools"][0]["function"];
    assert_eq!(tool["name"], "Invoice_Reader");
    assert_eq!(tool["description"], "Reads invoices");
    assert_eq!(
        tool["parameters"]["properties"]["currency"]["enum"],
        json!(["EUR", "USD"])
    );
    assert_eq!(tool["parameters"]["required"], json!(["vendor", "currency"]));
    assert_eq!(requests[0]["model"], "gpt-4o");
}

#[tokio::test]
async fn header_is_written_once_across_runs() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &["b.pdf"]);

    let config = ExtractionConfig::default();
    let transport = FakeTransport::default();
    process_directory(&job, &FakeRenderer, &transport, &config).await.unwrap();
    process_directory(&job, &FakeRenderer, &transport, &config).await.unwrap();

    let text = std::fs::read_to_string(&job.output_csv).unwrap();
    assert_eq!(
        text,
        "vendor,currency,Source File\r\nAcme,EUR,b.pdf\r\nAcme,EUR,b.pdf\r\n"
    );
}

#[tokio::test]
async fn progress_events_follow_outcomes() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &["a.pdf"]);

    let recorder = Arc::new(RecordingCallback::default());
    let config = ExtractionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    process_directory(&job, &FakeRenderer, &FakeTransport::default(), &config)
        .await
        .unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        ["start 1", "skipped a.pdf", "complete 1 0"]
    );
    // Nothing was extracted, so no table was created.
    assert!(!job.output_csv.exists());
    assert!(job.output_csv.parent().unwrap().is_dir());
}

#[tokio::test]
async fn rendering_failure_aborts_the_run() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &["broken.pdf"]);

    let err = process_directory(
        &job,
        &FakeRenderer,
        &FakeTransport::default(),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Pdf2CsvError::CorruptPdf { .. }));
}

#[tokio::test]
async fn missing_input_folder_is_fatal() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());

    let err = process_directory(
        &job,
        &FakeRenderer,
        &FakeTransport::default(),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Pdf2CsvError::InputDirNotFound { .. }));
}

#[tokio::test]
async fn empty_folder_yields_empty_report() {
    let base = tempfile::tempdir().unwrap();
    let job = job_under(base.path());
    seed_input(&job, &[]);

    let report = process_directory(
        &job,
        &FakeRenderer,
        &FakeTransport::default(),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(report.stats.total_files, 0);
    assert!(report.files.is_empty());
}
