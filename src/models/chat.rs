use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat backends the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    /// Fast conversational mode
    #[default]
    QwenNormal,
    /// Deep-thinking mode, streams reasoning before the answer
    QwenThinking,
    Hunyuan,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::QwenNormal, ModelId::QwenThinking, ModelId::Hunyuan];

    /// Wire name, as used in requests and the model catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::QwenNormal => "qwen_normal",
            ModelId::QwenThinking => "qwen_thinking",
            ModelId::Hunyuan => "hunyuan",
        }
    }

    /// Whether turns on this model should be streamed by default.
    ///
    /// Only the thinking model produces a reasoning phase worth showing
    /// incrementally; the others answer in one shot.
    pub fn prefers_streaming(&self) -> bool {
        matches!(self, ModelId::QwenThinking)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown model '{}'. Expected one of: qwen_normal, qwen_thinking, hunyuan",
                    s
                )
            })
    }
}

/// One completed exchange, sent back as context on the next turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub model: ModelId,
    pub message: String,
    /// Prior turns, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    pub stream: bool,
}

impl ChatRequest {
    /// Create a request that streams iff the model prefers it.
    pub fn new(model: ModelId, message: impl Into<String>) -> Self {
        Self {
            model,
            message: message.into(),
            history: Vec::new(),
            stream: model.prefers_streaming(),
        }
    }

    /// Attach prior turns (builder pattern)
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    /// Force streaming on or off (builder pattern)
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Body of a non-streamed `POST /chat` response.
///
/// Errors come back with `status: "error"` and an `error` message, sometimes
/// with a 2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Display name of the backend that answered
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_id_wire_names() {
        assert_eq!(serde_json::to_value(ModelId::QwenThinking).unwrap(), json!("qwen_thinking"));
        assert_eq!("hunyuan".parse::<ModelId>().unwrap(), ModelId::Hunyuan);
        assert!("gpt".parse::<ModelId>().is_err());
        assert_eq!(ModelId::default(), ModelId::QwenNormal);
    }

    #[test]
    fn test_only_thinking_model_prefers_streaming() {
        assert!(ModelId::QwenThinking.prefers_streaming());
        assert!(!ModelId::QwenNormal.prefers_streaming());
        assert!(!ModelId::Hunyuan.prefers_streaming());
    }

    #[test]
    fn test_chat_request_serialization() {
        let req = ChatRequest::new(ModelId::QwenNormal, "hi");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"model": "qwen_normal", "message": "hi", "stream": false})
        );

        let req = ChatRequest::new(ModelId::QwenThinking, "why?").with_history(vec![HistoryEntry {
            user: "a".to_string(),
            assistant: "b".to_string(),
        }]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["history"][0]["assistant"], "b");
    }

    #[test]
    fn test_chat_reply_success_and_error() {
        let ok: ChatReply = serde_json::from_value(json!({
            "response": "hello",
            "status": "success",
            "model": "hunyuan",
            "source": "Hunyuan"
        }))
        .unwrap();
        assert!(ok.is_success());

        let err: ChatReply = serde_json::from_value(json!({
            "error": "quota exceeded",
            "status": "error",
            "model": "hunyuan"
        }))
        .unwrap();
        assert!(!err.is_success());
        assert_eq!(err.response, "");
    }
}
