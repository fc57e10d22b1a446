//! Record dispatch.
//!
//! The reader calls a [`RecordHandler`] synchronously, in arrival order,
//! exactly once per record, before it requests the next chunk. Handlers hold
//! no rendering logic of their own in this crate: [`EventSender`] turns records
//! into abstract [`StreamEvent`]s and a UI subscribes to the channel.

use serde::Serialize;
use tokio::sync::mpsc;

use super::state::{PhaseTransition, StreamPhase, StreamState};
use crate::sse::StreamRecord;

/// Receives records as the reader decodes them.
pub trait RecordHandler {
    /// Called once per record, after it has been applied to `state`.
    fn on_record(&mut self, record: &StreamRecord, state: &StreamState);

    /// Called when the stream changes phase, before the record that caused it.
    fn on_phase(&mut self, _transition: PhaseTransition) {}
}

impl<H: RecordHandler + ?Sized> RecordHandler for &mut H {
    fn on_record(&mut self, record: &StreamRecord, state: &StreamState) {
        (**self).on_record(record, state)
    }

    fn on_phase(&mut self, transition: PhaseTransition) {
        (**self).on_phase(transition)
    }
}

/// Handler that ignores everything; useful when only the outcome matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl RecordHandler for NoopHandler {
    fn on_record(&mut self, _record: &StreamRecord, _state: &StreamState) {}
}

/// Collects every record and transition, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordCollector {
    pub records: Vec<StreamRecord>,
    pub transitions: Vec<PhaseTransition>,
}

impl RecordCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated text of all `Content` records.
    pub fn answer_text(&self) -> String {
        self.records
            .iter()
            .filter_map(|r| match r {
                StreamRecord::Content { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RecordHandler for RecordCollector {
    fn on_record(&mut self, record: &StreamRecord, _state: &StreamState) {
        self.records.push(record.clone());
    }

    fn on_phase(&mut self, transition: PhaseTransition) {
        self.transitions.push(transition);
    }
}

/// Adapts a closure into a handler.
pub struct FnHandler<F>(pub F);

impl<F> RecordHandler for FnHandler<F>
where
    F: FnMut(&StreamRecord, &StreamState),
{
    fn on_record(&mut self, record: &StreamRecord, state: &StreamState) {
        (self.0)(record, state)
    }
}

/// UI-independent events derived from records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    PhaseChanged { from: StreamPhase, to: StreamPhase },
    ThinkingDelta { text: String },
    ThinkingFinished,
    AnswerDelta { text: String },
    Usage { usage: serde_json::Value },
    Finished,
    Failed { message: String },
}

impl StreamEvent {
    /// Map a record to the event a subscriber sees. `None` for records that
    /// only matter as phase changes.
    pub fn from_record(record: &StreamRecord) -> Option<Self> {
        match record {
            StreamRecord::Thinking { content } => Some(StreamEvent::ThinkingDelta {
                text: content.clone(),
            }),
            StreamRecord::ThinkingEnd { .. } => Some(StreamEvent::ThinkingFinished),
            StreamRecord::AnswerStart => None,
            StreamRecord::Content { content } => Some(StreamEvent::AnswerDelta {
                text: content.clone(),
            }),
            StreamRecord::Usage { usage } => Some(StreamEvent::Usage {
                usage: usage.clone(),
            }),
            StreamRecord::Done => Some(StreamEvent::Finished),
            StreamRecord::Error { message } => Some(StreamEvent::Failed {
                message: message.clone(),
            }),
        }
    }
}

/// Forwards [`StreamEvent`]s to a channel subscriber.
///
/// A dropped receiver is not an error: the stream keeps being consumed so the
/// final outcome is still available to the caller.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Create a sender together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("stream event subscriber dropped");
        }
    }
}

impl RecordHandler for EventSender {
    fn on_record(&mut self, record: &StreamRecord, _state: &StreamState) {
        if let Some(event) = StreamEvent::from_record(record) {
            self.send(event);
        }
    }

    fn on_phase(&mut self, transition: PhaseTransition) {
        self.send(StreamEvent::PhaseChanged {
            from: transition.from,
            to: transition.to,
        });
    }
}
