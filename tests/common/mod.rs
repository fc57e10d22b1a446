//! Common test utilities for integration tests.
//!
//! Helpers for feeding byte chunks through the stream reader and for
//! building clients against a mock transport or a wiremock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thinkwire::adapters::MockHttpClient;
use thinkwire::poll::PollPolicy;
use thinkwire::sse::StreamRecord;
use thinkwire::stream::{EventStreamReader, ReaderOptions, RecordCollector, StreamOutcome};
use thinkwire::traits::{ByteStream, HttpClient, HttpError};
use thinkwire::{ClientConfig, StudioClient};

/// Wrap raw chunks in a byte stream.
pub fn byte_stream(chunks: Vec<Vec<u8>>) -> ByteStream {
    let items: Vec<Result<Bytes, HttpError>> =
        chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
    Box::pin(futures::stream::iter(items))
}

/// Run a full stream and return what the handler saw plus the outcome.
pub async fn run_chunks(chunks: Vec<Vec<u8>>) -> (RecordCollector, StreamOutcome) {
    let mut reader = EventStreamReader::open(byte_stream(chunks), ReaderOptions::new());
    let mut collector = RecordCollector::new();
    let outcome = reader
        .pump(&mut collector)
        .await
        .expect("stream should not fail");
    (collector, outcome)
}

/// Records dispatched for the given string chunks.
pub async fn records_for(chunks: &[&str]) -> Vec<StreamRecord> {
    let chunks = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
    run_chunks(chunks).await.0.records
}

/// Every way to split `input` into two chunks, at every byte offset,
/// including offsets inside multibyte characters.
pub fn two_way_splits(input: &[u8]) -> Vec<Vec<Vec<u8>>> {
    (0..=input.len())
        .map(|i| vec![input[..i].to_vec(), input[i..].to_vec()])
        .collect()
}

/// `input` delivered one byte per chunk.
pub fn byte_by_byte(input: &[u8]) -> Vec<Vec<u8>> {
    input.iter().map(|b| vec![*b]).collect()
}

/// Poll policy that does not slow tests down.
pub fn fast_poll() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(5), Duration::from_millis(5))
}

/// Client over the in-process mock transport.
pub fn mock_client(mock: &Arc<MockHttpClient>, base_url: &str) -> StudioClient {
    StudioClient::with_http(
        ClientConfig::new()
            .with_base_url(base_url)
            .with_image_poll(fast_poll())
            .with_video_poll(fast_poll()),
        mock.clone() as Arc<dyn HttpClient>,
    )
}

/// Real reqwest client pointed at a wiremock server.
pub fn live_client(base_url: &str) -> StudioClient {
    StudioClient::new(
        ClientConfig::new()
            .with_base_url(base_url)
            .with_idle_timeout(Some(Duration::from_secs(5)))
            .with_image_poll(fast_poll())
            .with_video_poll(fast_poll()),
    )
}

/// Format one record line the way the backend does.
pub fn data_line(payload: serde_json::Value) -> String {
    format!("data: {}\n\n", payload)
}
