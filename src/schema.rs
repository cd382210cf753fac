//! Tool-call schema built from parameter rows.
//!
//! Each [`ParameterRecord`] becomes one JSON-schema property:
//!
//! ```json
//! "currency": { "type": "string", "description": "Currency code", "enum": ["EUR", "USD"] }
//! ```
//!
//! and every record flagged `Required = "Yes"` is listed under `"required"`.
//! Property order follows the catalog's row order.
//!
//! The enum column holds a literal list as text. It is parsed as a JSON
//! array, or failing that as a restricted literal list (quoted strings,
//! numbers, `True`/`False`/`None`) so catalogs written with single quotes
//! keep working. The text is never evaluated.

use crate::catalog::ParameterRecord;
use crate::error::Pdf2CsvError;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// JSON-schema primitive types accepted in the type column.
const ALLOWED_TYPES: [&str; 7] = [
    "string", "number", "integer", "boolean", "array", "object", "null",
];

/// One property of the tool schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

/// Properties and required names for one function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSchema {
    properties: Vec<(String, PropertyDescriptor)>,
    required: Vec<String>,
}

impl ParameterSchema {
    /// Build the schema from the selected function's parameter rows.
    ///
    /// A repeated parameter name replaces the earlier descriptor in place.
    ///
    /// # Errors
    /// * [`Pdf2CsvError::InvalidParameterType`] — type is not a JSON-schema type
    /// * [`Pdf2CsvError::InvalidEnum`] — enum cell is not a non-empty literal list
    pub fn build(records: &[ParameterRecord]) -> Result<Self, Pdf2CsvError> {
        let mut schema = Self::default();

        for record in records {
            let name = record.parameter_name.clone();
            let descriptor = PropertyDescriptor {
                property_type: validate_type(record)?,
                description: record.description.clone(),
                allowed_values: match record.enum_literal.as_deref().map(str::trim) {
                    Some(text) if !text.is_empty() => Some(
                        parse_enum_literal(text).map_err(|detail| Pdf2CsvError::InvalidEnum {
                            parameter: name.clone(),
                            detail,
                        })?,
                    ),
                    _ => None,
                },
            };

            match schema.properties.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => *existing = descriptor,
                None => schema.properties.push((name.clone(), descriptor)),
            }
            if record.is_required() && !schema.required.contains(&name) {
                schema.required.push(name);
            }
        }

        Ok(schema)
    }

    pub fn properties(&self) -> &[(String, PropertyDescriptor)] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// The `parameters` object of the tool definition.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, descriptor)| {
                (
                    name.clone(),
                    serde_json::to_value(descriptor).unwrap_or(Value::Null),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

fn validate_type(record: &ParameterRecord) -> Result<String, Pdf2CsvError> {
    let normalised = record.parameter_type.trim().to_ascii_lowercase();
    if ALLOWED_TYPES.contains(&normalised.as_str()) {
        Ok(normalised)
    } else {
        Err(Pdf2CsvError::InvalidParameterType {
            parameter: record.parameter_name.clone(),
            value: record.parameter_type.clone(),
        })
    }
}

/// Parse an enum cell into a list of scalar values.
pub fn parse_enum_literal(text: &str) -> Result<Vec<Value>, String> {
    let values = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(other) => return Err(format!("expected a list, got {other}")),
        Err(_) => LiteralParser::new(text).parse_list()?,
    };

    if values.is_empty() {
        return Err("the list is empty".into());
    }
    if let Some(bad) = values.iter().find(|v| v.is_array() || v.is_object()) {
        return Err(format!("nested value {bad} is not allowed"));
    }
    Ok(values)
}

// ── Restricted literal-list parser ───────────────────────────────────────

struct LiteralParser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            text,
        }
    }

    fn parse_list(mut self) -> Result<Vec<Value>, String> {
        self.skip_whitespace();
        self.expect('[')?;

        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(']') {
                break;
            }
            items.push(self.parse_scalar()?);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            break;
        }

        self.skip_whitespace();
        match self.chars.peek() {
            None => Ok(items),
            Some(&(pos, _)) => Err(format!("unexpected trailing text at offset {pos}")),
        }
    }

    fn parse_scalar(&mut self) -> Result<Value, String> {
        match self.chars.peek().copied() {
            Some((_, quote @ ('\'' | '"'))) => {
                self.chars.next();
                self.parse_string(quote).map(Value::String)
            }
            Some((start, _)) => {
                let mut end = self.text.len();
                while let Some(&(pos, c)) = self.chars.peek() {
                    if c == ',' || c == ']' || c.is_whitespace() {
                        end = pos;
                        break;
                    }
                    self.chars.next();
                }
                bare_word(&self.text[start..end])
            }
            None => Err("unterminated list".into()),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, escaped @ ('\\' | '\'' | '"'))) => out.push(escaped),
                    Some((pos, escaped)) => {
                        return Err(format!("unsupported escape '\\{escaped}' at offset {pos}"))
                    }
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err("unterminated string".into())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(format!("expected '{expected}' at offset {pos}, found '{c}'")),
            None => Err(format!("expected '{expected}', found end of text")),
        }
    }
}

fn bare_word(word: &str) -> Result<Value, String> {
    match word {
        "True" | "true" => return Ok(Value::Bool(true)),
        "False" | "false" => return Ok(Value::Bool(false)),
        "None" | "null" => return Ok(Value::Null),
        _ => {}
    }
    if let Ok(i) = word.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    word.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("unsupported literal '{word}'"))
}
