//! Line parsing for the `data: <json>` protocol.
//!
//! Each complete line is classified as one of:
//! - not a data line (keep-alives, comments, `event:` lines) -> skipped
//! - the `[DONE]` sentinel -> end of stream
//! - a JSON payload -> zero or more [`StreamRecord`]s
//!
//! Two payload shapes are accepted. The discriminated shape carries a `type`
//! field; the legacy OpenAI-compatible shape carries
//! `choices[0].delta.{reasoning_content,content}`.

use crate::sse::events::{DecodeError, ParsedLine, StreamRecord};
use crate::sse::payloads::{LegacyPayload, TypedPayload};

/// Prefix every record line must start with.
pub const DATA_MARKER: &str = "data: ";

/// Payload that ends the stream without being decoded.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Parse one complete line (without its trailing newline).
pub fn parse_record_line(line: &str) -> Result<ParsedLine, DecodeError> {
    let Some(payload) = line.strip_prefix(DATA_MARKER) else {
        return Ok(ParsedLine::Skip);
    };

    if payload.trim() == DONE_SENTINEL {
        return Ok(ParsedLine::EndOfStream);
    }

    parse_payload(payload, line)
}

/// Decode a JSON payload into records.
fn parse_payload(payload: &str, line: &str) -> Result<ParsedLine, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(payload.trim()).map_err(|e| DecodeError::InvalidJson {
            reason: e.to_string(),
            line: line.to_string(),
        })?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject {
            line: line.to_string(),
        });
    }

    let typed: TypedPayload =
        serde_json::from_value(value.clone()).map_err(|e| DecodeError::InvalidJson {
            reason: e.to_string(),
            line: line.to_string(),
        })?;

    if let Some(kind) = typed.kind.as_deref() {
        if let Some(result) = parse_typed(kind, &typed, line) {
            if value.get("choices").is_some() {
                tracing::warn!(
                    kind,
                    "payload matches both the typed and the legacy shape; using the `type` field"
                );
            }
            return result;
        }
        tracing::debug!(kind, "unrecognised record type, trying legacy shape");
    }

    let legacy: LegacyPayload =
        serde_json::from_value(value).map_err(|e| DecodeError::InvalidJson {
            reason: e.to_string(),
            line: line.to_string(),
        })?;

    let records = parse_legacy(&legacy);
    if !records.is_empty() {
        return Ok(ParsedLine::Records(records));
    }

    // A bare `{"error": "..."}` object, sent when the backend rejects a
    // request before streaming starts
    if let Some(message) = typed.error {
        return Ok(ParsedLine::Records(vec![StreamRecord::Error { message }]));
    }

    Ok(ParsedLine::Skip)
}

/// Map a discriminated payload. `None` means the discriminator is unknown.
fn parse_typed(
    kind: &str,
    payload: &TypedPayload,
    line: &str,
) -> Option<Result<ParsedLine, DecodeError>> {
    let missing = |field: &'static str| DecodeError::MissingField {
        kind: kind.to_string(),
        field,
        line: line.to_string(),
    };

    let record = match kind {
        "thinking" => payload
            .content
            .clone()
            .map(|content| StreamRecord::Thinking { content })
            .ok_or_else(|| missing("content")),
        "thinking_end" => Ok(StreamRecord::ThinkingEnd {
            content: payload.content.clone().unwrap_or_default(),
        }),
        "answer_start" => Ok(StreamRecord::AnswerStart),
        "content" => payload
            .content
            .clone()
            .map(|content| StreamRecord::Content { content })
            .ok_or_else(|| missing("content")),
        "usage" => Ok(StreamRecord::Usage {
            usage: payload.usage.clone().unwrap_or(serde_json::Value::Null),
        }),
        "done" => Ok(StreamRecord::Done),
        "error" => payload
            .error
            .clone()
            .map(|message| StreamRecord::Error { message })
            .ok_or_else(|| missing("error")),
        _ => return None,
    };

    Some(record.map(|r| ParsedLine::Records(vec![r])))
}

/// Map the legacy `choices[0].delta` shape.
fn parse_legacy(payload: &LegacyPayload) -> Vec<StreamRecord> {
    let mut records = Vec::new();

    if let Some(delta) = payload.first_delta() {
        let reasoning = delta
            .reasoning_content
            .as_deref()
            .or(delta.reasoning.as_deref())
            .filter(|s| !s.is_empty());
        if let Some(text) = reasoning {
            records.push(StreamRecord::Thinking {
                content: text.to_string(),
            });
        }
        if let Some(text) = delta.content.as_deref().filter(|s| !s.is_empty()) {
            records.push(StreamRecord::Content {
                content: text.to_string(),
            });
        }
    } else if payload.phase_change.as_deref() == Some("answer_start") {
        records.push(StreamRecord::AnswerStart);
    } else if payload.summary.is_some() {
        records.push(StreamRecord::Done);
    }

    records
}
