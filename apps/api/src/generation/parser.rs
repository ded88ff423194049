//! Response Parser: raw model text → `{short_html, long_html}`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("response is missing a non-empty '{0}' field")]
    MissingField(&'static str),
}

/// The two trusted fields of a generator reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCopy {
    pub short_html: String,
    pub long_html: String,
}

/// Parses a generator reply. Code fences are stripped first; every key other than
/// `short_html` and `long_html` is ignored.
pub fn parse_generated(raw: &str) -> Result<GeneratedCopy, ParseError> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    let field = |key: &'static str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(ParseError::MissingField(key))
    };

    Ok(GeneratedCopy {
        short_html: field("short_html")?,
        long_html: field("long_html")?,
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    // language tag, if any
    let stripped = stripped.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(stripped)
}
