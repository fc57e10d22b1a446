//! Record types for the `data: <json>` line protocol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One logical record decoded from a `data:` line.
///
/// Both the discriminated payload shape (`{"type": ...}`) and the legacy
/// `choices[0].delta` shape map onto these variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRecord {
    /// Intermediate reasoning text
    Thinking { content: String },
    /// Reasoning phase finished
    ThinkingEnd {
        #[serde(default)]
        content: String,
    },
    /// Backend announced the start of the answer
    AnswerStart,
    /// Final answer text
    Content { content: String },
    /// Token usage statistics
    Usage { usage: serde_json::Value },
    /// Stream completed successfully
    Done,
    /// Backend reported an error; terminates the stream
    Error { message: String },
}

impl StreamRecord {
    /// Wire name of the record kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamRecord::Thinking { .. } => "thinking",
            StreamRecord::ThinkingEnd { .. } => "thinking_end",
            StreamRecord::AnswerStart => "answer_start",
            StreamRecord::Content { .. } => "content",
            StreamRecord::Usage { .. } => "usage",
            StreamRecord::Done => "done",
            StreamRecord::Error { .. } => "error",
        }
    }

    /// Whether this record ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamRecord::Done | StreamRecord::Error { .. })
    }
}

/// Outcome of parsing a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Not a data line, or a payload we deliberately ignore
    Skip,
    /// The `[DONE]` sentinel
    EndOfStream,
    /// One or more records, in dispatch order
    Records(Vec<StreamRecord>),
}

/// A single malformed record. Recovered locally: logged and skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON
    #[error("invalid JSON payload: {reason}")]
    InvalidJson { reason: String, line: String },

    /// Payload is JSON but not an object
    #[error("payload is not a JSON object")]
    NotAnObject { line: String },

    /// Recognised record kind without its required field
    #[error("'{kind}' record is missing field '{field}'")]
    MissingField {
        kind: String,
        field: &'static str,
        line: String,
    },
}

impl DecodeError {
    /// The raw line that failed to decode.
    pub fn line(&self) -> &str {
        match self {
            DecodeError::InvalidJson { line, .. }
            | DecodeError::NotAnObject { line }
            | DecodeError::MissingField { line, .. } => line,
        }
    }
}
