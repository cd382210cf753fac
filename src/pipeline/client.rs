//! Chat-completion request with a single extraction tool.
//!
//! One request is sent per PDF. It carries the system prompt, a user
//! message with the instruction text followed by every page image, and a
//! single `function` tool whose `parameters` are the schema built from the
//! parameter catalog. Temperature and response format are fixed so the
//! service answers deterministically with JSON.
//!
//! The response is reduced to the arguments of the first tool call. Every
//! way that can fail is a [`FileError`]: the caller logs it and moves on to
//! the next file.

use crate::config::ExtractionConfig;
use crate::error::{FileError, Pdf2CsvError};
use crate::extract::ExtractionJob;
use crate::output::ExtractionResult;
use crate::prompts::{EXTRACTION_INSTRUCTION, SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
enum ResponseFormat {
    JsonObject,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role")]
#[serde(rename_all = "lowercase")]
enum RequestMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart<'a>> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ToolType {
    Function,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Tool<'a> {
    r#type: ToolType,
    function: FunctionDefinition<'a>,
}

/// Body of one extraction request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<RequestMessage<'a>>,
    tools: Vec<Tool<'a>>,
    max_tokens: u32,
}

/// Assemble the request for one PDF's page images.
pub fn build_request<'a>(
    job: &'a ExtractionJob,
    images: &'a [String],
    config: &'a ExtractionConfig,
) -> ChatCompletionRequest<'a> {
    let instruction = config
        .instruction
        .as_deref()
        .unwrap_or(EXTRACTION_INSTRUCTION);
    let system_prompt = config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT);

    let mut content = Vec::with_capacity(images.len() + 1);
    content.push(ContentPart::Text { text: instruction });
    content.extend(images.iter().map(|url| ContentPart::ImageUrl {
        image_url: ImageUrl { url },
    }));

    ChatCompletionRequest {
        model: &job.function.model,
        temperature: config.temperature,
        response_format: ResponseFormat::JsonObject,
        messages: vec![
            RequestMessage::System {
                content: system_prompt,
            },
            RequestMessage::User { content },
        ],
        tools: vec![Tool {
            r#type: ToolType::Function,
            function: FunctionDefinition {
                name: &job.tool_name,
                description: &job.function.description,
                parameters: job.schema.to_json_schema(),
            },
        }],
        max_tokens: config.max_tokens,
    }
}

// ── Transport ────────────────────────────────────────────────────────────

/// Status and body exactly as the service returned them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a request body to an endpoint with a bearer key.
///
/// [`HttpTransport`] is the production implementation.
#[allow(async_fn_in_trait)]
pub trait ChatTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<RawResponse, FileError>;
}

/// reqwest-backed transport. No timeout is configured.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, Pdf2CsvError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Pdf2CsvError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ChatTransport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<RawResponse, FileError> {
        let res = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| FileError::Transport {
                detail: format!("Error sending request to '{endpoint}': {e}"),
            })?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| FileError::Transport {
            detail: format!("Error reading response body: {e}"),
        })?;

        Ok(RawResponse { status, body })
    }
}

// ── Response ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResponseFunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

// Leaving out id, model, usage and everything else we never read.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

/// Decode the first tool call's arguments from a raw response.
///
/// # Errors
/// A [`FileError`] describing why no data could be taken from the response.
pub fn parse_tool_arguments(raw: &RawResponse) -> Result<ExtractionResult, FileError> {
    if raw.status != 200 {
        return Err(FileError::HttpStatus {
            status: raw.status,
            body: raw.body.clone(),
        });
    }

    let response: ChatCompletionResponse =
        serde_json::from_str(&raw.body).map_err(|e| FileError::MalformedResponse {
            detail: e.to_string(),
        })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(FileError::NoChoices)?;
    let call = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(FileError::NoToolCalls)?;

    match serde_json::from_str::<Value>(&call.function.arguments) {
        Ok(Value::Object(fields)) if fields.is_empty() => Err(FileError::EmptyExtraction),
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(FileError::InvalidArguments {
            detail: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(FileError::InvalidArguments {
            detail: e.to_string(),
        }),
    }
}

/// Send one PDF's page images and return the extracted fields.
pub async fn request_extraction<T: ChatTransport>(
    job: &ExtractionJob,
    images: &[String],
    transport: &T,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FileError> {
    let request = build_request(job, images, config);
    let raw = transport
        .post_json(&job.function.endpoint, &job.function.api_key, &request)
        .await?;

    info!("Status Code: {}", raw.status);
    debug!("Response Body: {}", raw.body);

    parse_tool_arguments(&raw)
}
