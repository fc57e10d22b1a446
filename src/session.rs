//! Conversation session.
//!
//! A [`ChatSession`] holds what persists across turns of one conversation:
//! the selected model, the exchange history sent back as context, and the
//! cancellation token of the turn currently streaming. Only one turn is
//! active at a time; starting a new one cancels the previous one so two
//! streams never write into the same output.
//!
//! A turn is a [`ChatTurn`] value owning its request and token, so the
//! session is free while the turn streams:
//!
//! ```text
//! let turn = session.begin_turn(text);          // cancels the older turn
//! let transcript = client.run_turn(&turn, h).await?;
//! session.finish_turn(&turn, &transcript);      // records it unless superseded
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{ChatRequest, HistoryEntry, ModelId};
use crate::stream::Transcript;

/// One chat turn in flight.
///
/// Holds a snapshot of the request taken when the turn began, plus the
/// token that the next [`ChatSession::begin_turn`] cancels.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    seq: u64,
    request: ChatRequest,
    cancel: CancellationToken,
}

impl ChatTurn {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn message(&self) -> &str {
        &self.request.message
    }

    /// Token that aborts this turn's stream or request.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// State for one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    model: ModelId,
    /// Completed exchanges, oldest first
    history: Vec<HistoryEntry>,
    /// `Some` overrides the model's streaming preference
    force_stream: Option<bool>,
    #[serde(skip)]
    active_turn: Option<(u64, CancellationToken)>,
    #[serde(skip)]
    turns_started: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ModelId::default())
    }
}

impl ChatSession {
    pub fn new(model: ModelId) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model,
            history: Vec::new(),
            force_stream: None,
            active_turn: None,
            turns_started: 0,
        }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Switch models. History is kept.
    pub fn set_model(&mut self, model: ModelId) {
        self.model = model;
    }

    /// Override whether turns are streamed (builder pattern)
    pub fn with_force_stream(mut self, stream: Option<bool>) -> Self {
        self.force_stream = stream;
        self
    }

    /// Whether the next turn should be streamed.
    pub fn wants_stream(&self) -> bool {
        self.force_stream
            .unwrap_or_else(|| self.model.prefers_streaming())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Start a turn: cancel the previous one and snapshot the request.
    ///
    /// The history in the request is what was recorded before this call, so
    /// a superseded turn never leaks into the context of its successor.
    pub fn begin_turn(&mut self, message: impl Into<String>) -> ChatTurn {
        if let Some((_, previous)) = self.active_turn.take() {
            if !previous.is_cancelled() {
                tracing::debug!(session_id = %self.id, "superseding active turn");
                previous.cancel();
            }
        }

        self.turns_started += 1;
        let cancel = CancellationToken::new();
        self.active_turn = Some((self.turns_started, cancel.clone()));

        let request = ChatRequest::new(self.model, message.into().trim())
            .with_history(self.history.clone())
            .with_stream(self.wants_stream());
        ChatTurn {
            seq: self.turns_started,
            request,
            cancel,
        }
    }

    /// Token of the current turn, if one is running.
    pub fn active_turn(&self) -> Option<&CancellationToken> {
        self.active_turn.as_ref().map(|(_, token)| token)
    }

    /// Cancel the running turn, if any.
    pub fn cancel_turn(&mut self) {
        if let Some((_, token)) = self.active_turn.take() {
            token.cancel();
        }
    }

    /// Record a turn's answer in the history.
    ///
    /// Returns `false` and records nothing if the turn was cancelled.
    pub fn finish_turn(&mut self, turn: &ChatTurn, transcript: &Transcript) -> bool {
        if matches!(self.active_turn, Some((seq, _)) if seq == turn.seq) {
            self.active_turn = None;
        }
        if turn.is_cancelled() {
            tracing::debug!(session_id = %self.id, "dropping cancelled turn");
            return false;
        }
        self.record_turn(turn.message(), transcript.answer.clone());
        true
    }

    /// Append a completed exchange to the history.
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(HistoryEntry {
            user: user.into(),
            assistant: assistant.into(),
        });
    }

    /// Drop the history and cancel any active turn.
    pub fn clear(&mut self) {
        self.cancel_turn();
        self.history.clear();
    }
}
