//! Payload deserialization structs
//!
//! Internal shapes used to decode the JSON carried on `data:` lines.

use serde::Deserialize;

/// Fields shared by the discriminated payload shape.
///
/// Every field is optional so one struct covers all record kinds; the parser
/// checks the fields each kind requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TypedPayload {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// OpenAI-compatible payload: `{"choices":[{"delta":{...}}]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LegacyPayload {
    #[serde(default)]
    pub choices: Vec<LegacyChoice>,
    /// Older backends announce the answer phase separately
    #[serde(default)]
    pub phase_change: Option<String>,
    /// Older backends close the stream with a summary object
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LegacyChoice {
    #[serde(default)]
    pub delta: Option<LegacyDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LegacyDelta {
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl LegacyPayload {
    /// The first choice's delta, if present.
    pub fn first_delta(&self) -> Option<&LegacyDelta> {
        self.choices.first().and_then(|c| c.delta.as_ref())
    }
}
