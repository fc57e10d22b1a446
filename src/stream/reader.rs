//! Incremental event-stream reader.
//!
//! Consumes a byte stream, reassembles `data:` lines and dispatches each
//! decoded record as soon as its line is complete. Each chunk read is a
//! cancellable suspension point, bounded by an optional idle timeout.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::dispatch::RecordHandler;
use super::state::{PhaseTransition, StreamState, Transcript};
use crate::error::StreamError;
use crate::sse::{parse_record_line, LineBuffer, ParsedLine, StreamRecord};
use crate::traits::{ByteStream, HttpError};

/// Per-stream reader settings.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    /// Fail with [`StreamError::IdleTimeout`] if no chunk arrives in time
    pub idle_timeout: Option<Duration>,
    /// Fires to abort the pending transport read
    pub cancel: CancellationToken,
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Why a stream stopped without a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// A `done` record
    Done,
    /// The `[DONE]` sentinel
    Sentinel,
    /// The transport ended the body
    EndOfInput,
    /// An `error` record
    Error { message: String },
}

/// Final result of [`EventStreamReader::pump`].
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub termination: Termination,
    pub state: StreamState,
    /// Malformed lines that were skipped
    pub decode_errors: usize,
}

impl StreamOutcome {
    /// Convert to the final text, surfacing error records and streams
    /// that produced no answer content.
    pub fn into_transcript(self) -> Result<Transcript, StreamError> {
        if let Termination::Error { message } = self.termination {
            return Err(StreamError::Protocol { message });
        }
        if self.state.answer().is_empty() {
            if !self.state.thinking().is_empty() {
                tracing::warn!(
                    thinking_chars = self.state.thinking().chars().count(),
                    "stream ended after reasoning with no answer"
                );
            }
            return Err(StreamError::EmptyResult);
        }
        Ok(self.state.into_transcript())
    }
}

/// Reader over one streamed response.
///
/// The buffer only ever holds the suffix of decoded text that has not yet
/// formed a complete line; every complete line is parsed once, in order.
pub struct EventStreamReader<S = ByteStream> {
    id: Uuid,
    stream: S,
    buffer: LineBuffer,
    /// Records decoded from the current line but not yet returned
    queue: VecDeque<StreamRecord>,
    options: ReaderOptions,
    state: StreamState,
    transitions: Vec<PhaseTransition>,
    termination: Option<Termination>,
    aborted: bool,
    input_done: bool,
    decode_errors: usize,
}

impl<S> EventStreamReader<S>
where
    S: Stream<Item = Result<Bytes, HttpError>> + Unpin,
{
    /// Wrap a byte stream. Nothing is read until the first record is requested.
    pub fn open(stream: S, options: ReaderOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream,
            buffer: LineBuffer::new(),
            queue: VecDeque::new(),
            options,
            state: StreamState::new(),
            transitions: Vec::new(),
            termination: None,
            aborted: false,
            input_done: false,
            decode_errors: 0,
        }
    }

    /// Next record in arrival order, or `None` once the stream has terminated.
    ///
    /// The record has already been applied to [`state`](Self::state).
    pub async fn next_record(&mut self) -> Result<Option<StreamRecord>, StreamError> {
        if self.aborted {
            return Ok(None);
        }
        if let Some(t) = self.state.start() {
            self.transitions.push(t);
        }

        loop {
            if self.termination.is_some() {
                return Ok(None);
            }

            if let Some(record) = self.queue.pop_front() {
                if let Some(t) = self.state.apply(&record) {
                    self.transitions.push(t);
                }
                match &record {
                    StreamRecord::Done => self.terminate(Termination::Done),
                    StreamRecord::Error { message } => {
                        let message = message.clone();
                        self.terminate(Termination::Error { message });
                    }
                    _ => {}
                }
                return Ok(Some(record));
            }

            if let Some(line) = self.buffer.next_line() {
                self.handle_line(&line);
                continue;
            }

            if self.input_done {
                match self.buffer.finish() {
                    Some(tail) => self.handle_line(&tail),
                    None => self.terminate(Termination::EndOfInput),
                }
                continue;
            }

            match self.read_chunk().await {
                Ok(Some(chunk)) => self.buffer.push_chunk(&chunk),
                Ok(None) => self.input_done = true,
                Err(e) => {
                    self.aborted = true;
                    if let Some(t) = self.state.abort(e.to_string()) {
                        self.transitions.push(t);
                    }
                    tracing::warn!(stream_id = %self.id, error = %e, "stream aborted");
                    return Err(e);
                }
            }
        }
    }

    /// Drive the stream to termination, dispatching every record to `handler`.
    ///
    /// Phase transitions are reported before the record that caused them.
    pub async fn pump<H>(&mut self, handler: &mut H) -> Result<StreamOutcome, StreamError>
    where
        H: RecordHandler + ?Sized,
    {
        loop {
            let next = self.next_record().await;
            for transition in self.transitions.drain(..) {
                handler.on_phase(transition);
            }
            match next? {
                Some(record) => handler.on_record(&record, &self.state),
                None => break,
            }
        }

        Ok(StreamOutcome {
            termination: self
                .termination
                .clone()
                .unwrap_or(Termination::EndOfInput),
            state: self.state.clone(),
            decode_errors: self.decode_errors,
        })
    }

    /// Classify one complete line and queue its records.
    fn handle_line(&mut self, line: &str) {
        match parse_record_line(line) {
            Ok(ParsedLine::Skip) => {}
            Ok(ParsedLine::EndOfStream) => {
                if !self.buffer.is_empty() {
                    tracing::debug!(
                        stream_id = %self.id,
                        remaining = self.buffer.remainder().len(),
                        "discarding bytes after end-of-stream sentinel"
                    );
                }
                self.terminate(Termination::Sentinel);
            }
            Ok(ParsedLine::Records(records)) => self.queue.extend(records),
            Err(e) => {
                self.decode_errors += 1;
                tracing::warn!(
                    stream_id = %self.id,
                    error = %e,
                    line = e.line(),
                    "skipping malformed record"
                );
            }
        }
    }

    fn terminate(&mut self, termination: Termination) {
        if matches!(termination, Termination::Sentinel | Termination::EndOfInput) {
            if let Some(t) = self.state.finish() {
                self.transitions.push(t);
            }
        }
        tracing::info!(
            stream_id = %self.id,
            termination = ?termination,
            records = self.state.record_count(),
            decode_errors = self.decode_errors,
            "stream finished"
        );
        self.queue.clear();
        self.termination = Some(termination);
    }

    /// Await the next chunk, honouring cancellation and the idle timeout.
    async fn read_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        let idle_timeout = self.options.idle_timeout;
        let cancel = self.options.cancel.clone();
        let stream = &mut self.stream;

        let read = async move {
            match idle_timeout {
                Some(limit) => tokio::time::timeout(limit, stream.next())
                    .await
                    .map_err(|_| StreamError::IdleTimeout { limit }),
                None => Ok(stream.next().await),
            }
        };

        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StreamError::Cancelled),
            item = read => item?,
        };

        match item {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(StreamError::Transport(e)),
            None => Ok(None),
        }
    }
}

impl<S> EventStreamReader<S> {
    /// Identifier used in log lines for this stream.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Accumulated state so far.
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// How the stream terminated, if it has.
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// Number of malformed lines skipped so far.
    pub fn decode_errors(&self) -> usize {
        self.decode_errors
    }

    /// Token that cancels this reader's pending read.
    pub fn cancel_token(&self) -> CancellationToken {
        self.options.cancel.clone()
    }
}
