//! Scripted transport for tests.
//!
//! Responses queue per URL and each request takes the front one. The last
//! response stays, so a poll loop reads as "pending, pending, completed".

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// One call seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Headers,
    /// `None` for GET
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.body.as_deref()?).ok()
    }
}

/// What the mock does for one request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a full response
    Success(Response),
    /// Fail the request
    Error(HttpError),
    /// Stream these chunks, then end
    Stream(Vec<Bytes>),
    /// Stream these chunks, then fail the read
    StreamThenError(Vec<Bytes>, HttpError),
    /// Stream these chunks, then never yield again
    StreamThenStall(Vec<Bytes>),
}

impl MockResponse {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_body(status, &value))
    }

    /// Stream built from string chunks.
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(chunks.into_iter().map(|c| Bytes::from(c.into())).collect())
    }
}

#[derive(Debug, Default)]
struct Script {
    queues: HashMap<String, VecDeque<MockResponse>>,
    log: Vec<RecordedRequest>,
}

/// In-process [`HttpClient`] driven by per-URL scripts.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    script: Arc<Mutex<Script>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the log from the others
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the queue for `url` with a single sticky response.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.script()
            .queues
            .insert(url.to_string(), VecDeque::from([response]));
    }

    /// Append a response to the queue for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.script()
            .queues
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script().log.clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.script().log.iter().filter(|r| r.url == url).count()
    }

    /// Log the call and pick its scripted response.
    fn answer(
        &self,
        method: &'static str,
        url: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<MockResponse, HttpError> {
        let mut script = self.script();
        script.log.push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(str::to_string),
        });

        let queue = script.queues.get_mut(url);
        let next = match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        next.ok_or_else(|| HttpError::Other(format!("No mock response for URL: {}", url)))
    }

    fn whole(response: MockResponse) -> Result<Response, HttpError> {
        match response {
            MockResponse::Success(response) => Ok(response),
            MockResponse::Error(err) => Err(err),
            _ => Err(HttpError::Other(
                "Stream response on non-stream request".to_string(),
            )),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        Self::whole(self.answer("GET", url, headers, None)?)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        Self::whole(self.answer("POST", url, headers, Some(body))?)
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        match self.answer("POST", url, headers, Some(body))? {
            MockResponse::Stream(chunks) => {
                Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>))))
            }
            MockResponse::StreamThenError(chunks, err) => {
                let items = chunks
                    .into_iter()
                    .map(Ok::<Bytes, HttpError>)
                    .chain(std::iter::once(Err(err)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            MockResponse::StreamThenStall(chunks) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>))
                    .chain(futures::stream::pending());
                Ok(Box::pin(stream))
            }
            MockResponse::Success(response) if !response.is_success() => {
                Err(HttpError::ServerError {
                    status: response.status,
                    message: response.error_message(),
                })
            }
            MockResponse::Success(_) => Err(HttpError::Other(
                "Non-stream response on stream request".to_string(),
            )),
            MockResponse::Error(err) => Err(err),
        }
    }
}
