//! Phase tracking and accumulation for one streamed response.
//!
//! ```text
//! Idle -> Streaming -> {Thinking, Answering} -> Done | Errored
//! ```
//!
//! Thinking and answering can overlap in time: some backends keep sending
//! reasoning after the first answer token. The first answer record is the
//! phase boundary, but thinking text is still appended after it.

use serde::Serialize;

use crate::sse::StreamRecord;

/// Lifecycle phase of a streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    /// Reader created, nothing requested yet
    #[default]
    Idle,
    /// Reading, no records yet
    Streaming,
    /// Receiving reasoning
    Thinking,
    /// First answer content has arrived
    Answering,
    /// Terminated normally
    Done,
    /// Terminated by an error record or a transport failure
    Errored,
}

impl StreamPhase {
    /// Whether the phase is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamPhase::Done | StreamPhase::Errored)
    }
}

/// A change of phase, reported to handlers before the record that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: StreamPhase,
    pub to: StreamPhase,
}

/// Final text of a successfully completed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub thinking: String,
    pub answer: String,
    pub usage: Option<serde_json::Value>,
}

/// Accumulated state for one stream. Owned and mutated only by the reader.
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    phase: StreamPhase,
    thinking: String,
    answer: String,
    thinking_finished: bool,
    answer_started: bool,
    usage: Option<serde_json::Value>,
    error: Option<String>,
    records: usize,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave `Idle` when the first read is requested.
    pub fn start(&mut self) -> Option<PhaseTransition> {
        if self.phase == StreamPhase::Idle {
            self.transition(StreamPhase::Streaming)
        } else {
            None
        }
    }

    /// Fold one record into the accumulators.
    ///
    /// Records arriving after a terminal phase are ignored.
    pub fn apply(&mut self, record: &StreamRecord) -> Option<PhaseTransition> {
        if self.phase.is_terminal() {
            tracing::debug!(kind = record.kind(), "record after terminal phase ignored");
            return None;
        }
        self.records += 1;

        match record {
            StreamRecord::Thinking { content } => {
                self.thinking.push_str(content);
                if matches!(self.phase, StreamPhase::Idle | StreamPhase::Streaming) {
                    return self.transition(StreamPhase::Thinking);
                }
                None
            }
            StreamRecord::ThinkingEnd { content } => {
                self.thinking.push_str(content);
                self.thinking_finished = true;
                None
            }
            StreamRecord::AnswerStart => self.begin_answer(),
            StreamRecord::Content { content } => {
                self.answer.push_str(content);
                self.begin_answer()
            }
            StreamRecord::Usage { usage } => {
                self.usage = Some(usage.clone());
                None
            }
            StreamRecord::Done => self.transition(StreamPhase::Done),
            StreamRecord::Error { message } => {
                self.error = Some(message.clone());
                self.transition(StreamPhase::Errored)
            }
        }
    }

    /// Terminate normally at the sentinel or end of input.
    pub fn finish(&mut self) -> Option<PhaseTransition> {
        if self.phase.is_terminal() {
            None
        } else {
            self.transition(StreamPhase::Done)
        }
    }

    /// Terminate after a transport failure, timeout or cancellation.
    pub fn abort(&mut self, reason: impl Into<String>) -> Option<PhaseTransition> {
        if self.phase.is_terminal() {
            return None;
        }
        self.error = Some(reason.into());
        self.transition(StreamPhase::Errored)
    }

    fn begin_answer(&mut self) -> Option<PhaseTransition> {
        if self.answer_started {
            return None;
        }
        self.answer_started = true;
        self.transition(StreamPhase::Answering)
    }

    fn transition(&mut self, to: StreamPhase) -> Option<PhaseTransition> {
        let from = self.phase;
        if from == to {
            return None;
        }
        self.phase = to;
        Some(PhaseTransition { from, to })
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// True once the first answer record has arrived.
    pub fn is_answering(&self) -> bool {
        self.answer_started
    }

    pub fn thinking_finished(&self) -> bool {
        self.thinking_finished
    }

    pub fn usage(&self) -> Option<&serde_json::Value> {
        self.usage.as_ref()
    }

    /// Message of the error record (or abort reason), if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of records applied.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Consume the state into its final text.
    pub fn into_transcript(self) -> Transcript {
        Transcript {
            thinking: self.thinking,
            answer: self.answer,
            usage: self.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thinking(s: &str) -> StreamRecord {
        StreamRecord::Thinking {
            content: s.to_string(),
        }
    }

    fn content(s: &str) -> StreamRecord {
        StreamRecord::Content {
            content: s.to_string(),
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut state = StreamState::new();
        assert_eq!(state.phase(), StreamPhase::Idle);

        let t = state.start().unwrap();
        assert_eq!((t.from, t.to), (StreamPhase::Idle, StreamPhase::Streaming));

        let t = state.apply(&thinking("hmm")).unwrap();
        assert_eq!(t.to, StreamPhase::Thinking);
        assert!(state.apply(&thinking(" more")).is_none());

        let t = state.apply(&content("Hi")).unwrap();
        assert_eq!((t.from, t.to), (StreamPhase::Thinking, StreamPhase::Answering));
        assert!(state.apply(&content("!")).is_none());

        let t = state.apply(&StreamRecord::Done).unwrap();
        assert_eq!(t.to, StreamPhase::Done);

        assert_eq!(state.thinking(), "hmm more");
        assert_eq!(state.answer(), "Hi!");
        assert_eq!(state.record_count(), 5);
    }

    #[test]
    fn test_thinking_after_answer_is_appended_without_phase_change() {
        let mut state = StreamState::new();
        state.start();
        state.apply(&content("A"));
        assert!(state.apply(&thinking("late")).is_none());
        assert_eq!(state.phase(), StreamPhase::Answering);
        assert_eq!(state.thinking(), "late");
    }

    #[test]
    fn test_answer_start_flips_phase_once() {
        let mut state = StreamState::new();
        state.start();
        assert_eq!(
            state.apply(&StreamRecord::AnswerStart).map(|t| t.to),
            Some(StreamPhase::Answering)
        );
        assert!(state.apply(&content("x")).is_none());
        assert!(state.is_answering());
    }

    #[test]
    fn test_thinking_end_marks_finished() {
        let mut state = StreamState::new();
        state.start();
        state.apply(&thinking("a"));
        state.apply(&StreamRecord::ThinkingEnd {
            content: "b".to_string(),
        });
        assert!(state.thinking_finished());
        assert_eq!(state.thinking(), "ab");
        assert_eq!(state.phase(), StreamPhase::Thinking);
    }

    #[test]
    fn test_error_record() {
        let mut state = StreamState::new();
        state.start();
        let t = state
            .apply(&StreamRecord::Error {
                message: "boom".to_string(),
            })
            .unwrap();
        assert_eq!(t.to, StreamPhase::Errored);
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_records_after_terminal_are_ignored() {
        let mut state = StreamState::new();
        state.start();
        state.apply(&StreamRecord::Done);
        assert!(state.apply(&content("late")).is_none());
        assert_eq!(state.answer(), "");
        assert!(state.finish().is_none());
    }

    #[test]
    fn test_finish_and_abort() {
        let mut state = StreamState::new();
        state.start();
        assert_eq!(state.finish().map(|t| t.to), Some(StreamPhase::Done));

        let mut state = StreamState::new();
        state.start();
        assert_eq!(
            state.abort("reset").map(|t| t.to),
            Some(StreamPhase::Errored)
        );
        assert_eq!(state.error(), Some("reset"));
    }

    #[test]
    fn test_usage_is_kept() {
        let mut state = StreamState::new();
        state.apply(&StreamRecord::Usage {
            usage: serde_json::json!({"total_tokens": 7}),
        });
        assert_eq!(state.usage().unwrap()["total_tokens"], 7);
        let transcript = state.into_transcript();
        assert!(transcript.usage.is_some());
    }
}
