//! Fixed message texts sent with every extraction request.
//!
//! Callers can override both via [`crate::config::ExtractionConfig`]; the
//! constants here are used only when no override is provided.

/// System message. JSON-object response mode requires the word "JSON" to
/// appear somewhere in the conversation.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant designed to output JSON.";

/// Text part of the user message, placed before the page images.
pub const EXTRACTION_INSTRUCTION: &str =
    "Extract the data from these images in JSON format defined by the Data_Extraction function.";
