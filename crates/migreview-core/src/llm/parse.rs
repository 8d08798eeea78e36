//! # Response Interpreter
//!
//! Turns the model's raw answer into a `ReviewOutcome`. Plain mode is a
//! passthrough. Structured mode pulls the JSON out of any code fence and
//! deserializes it in two stages:
//!
//! 1. Parse into an untyped `serde_json::Value`. A failure here means the
//!    model did not produce JSON at all and becomes `MigReviewError::Parse`.
//! 2. Deserialize the value into `StructuredReviewResult`. A failure here
//!    means the JSON has the wrong shape or an out-of-range score and becomes
//!    `MigReviewError::Schema`.
//!
//! Both errors carry the unmodified response for diagnostic display.

use crate::error::{MigReviewError, Result};
use crate::review::request::OutputMode;
use crate::review::result::{ReviewOutcome, StructuredReviewResult};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Interpret a raw model response according to the requested output mode.
pub fn interpret(raw: &str, mode: OutputMode) -> Result<ReviewOutcome> {
    match mode {
        OutputMode::Plain => Ok(ReviewOutcome::Plain(raw.to_string())),
        OutputMode::Structured => parse_structured(raw).map(ReviewOutcome::Structured),
    }
}

/// Parse a structured-mode response into the typed review result.
pub fn parse_structured(raw: &str) -> Result<StructuredReviewResult> {
    let json_str = extract_json(raw);

    // Stage 1: is it JSON at all?
    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| MigReviewError::Parse {
            message: e.to_string(),
            raw: raw.to_string(),
        })?;

    // Stage 2: does it have the review shape?
    serde_json::from_value::<StructuredReviewResult>(value).map_err(|e| {
        tracing::debug!("Structured response rejected: {}", e);
        MigReviewError::Schema {
            message: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

/// Extract the JSON text from a response that may be wrapped in a markdown
/// code fence or surrounded by prose.
///
/// 1. ```` ```json ```` fence: the text after the first marker, up to the
///    next closing fence (or the end if it is never closed)
/// 2. bare ```` ``` ```` fence: the text between the first pair of fences
/// 3. otherwise the trimmed response as-is
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find(JSON_FENCE) {
        return until_fence(&trimmed[start + JSON_FENCE.len()..]);
    }
    if let Some(start) = trimmed.find(FENCE) {
        return until_fence(&trimmed[start + FENCE.len()..]);
    }

    trimmed
}

fn until_fence(after_open: &str) -> &str {
    match after_open.find(FENCE) {
        Some(end) => after_open[..end].trim(),
        None => after_open.trim(),
    }
}
