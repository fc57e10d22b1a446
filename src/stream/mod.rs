//! Streamed response handling: phase tracking, dispatch and the reader loop.

pub mod dispatch;
pub mod reader;
pub mod state;

pub use dispatch::{
    EventSender, FnHandler, NoopHandler, RecordCollector, RecordHandler, StreamEvent,
};
pub use reader::{EventStreamReader, ReaderOptions, StreamOutcome, Termination};
pub use state::{PhaseTransition, StreamPhase, StreamState, Transcript};
