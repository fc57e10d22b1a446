//! [`HttpClient`] over `reqwest`.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// Production transport.
///
/// `request_timeout` bounds plain GET/POST calls only. Streaming calls are
/// bounded by the reader's idle timeout, since a total deadline would cut
/// off long but healthy streams.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing connection pool.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Attach headers and send, optionally under the request deadline.
    async fn send(
        &self,
        mut builder: reqwest::RequestBuilder,
        headers: &Headers,
        bounded: bool,
    ) -> Result<reqwest::Response, HttpError> {
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if bounded {
            if let Some(timeout) = self.request_timeout {
                builder = builder.timeout(timeout);
            }
        }
        builder.send().await.map_err(transport_error)
    }
}

/// Sort a reqwest failure into the transport error kinds.
fn transport_error(err: reqwest::Error) -> HttpError {
    let text = err.to_string();
    if err.is_timeout() {
        HttpError::Timeout(text)
    } else if err.is_connect() {
        HttpError::ConnectionFailed(text)
    } else if err.is_builder() {
        HttpError::InvalidUrl(text)
    } else if err.is_body() || err.is_decode() {
        HttpError::Io(text)
    } else {
        HttpError::Other(text)
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect()
}

async fn collect(response: reqwest::Response) -> Result<Response, HttpError> {
    let status = response.status().as_u16();
    let headers = header_map(response.headers());
    let body = response.bytes().await.map_err(transport_error)?;
    Ok(Response {
        status,
        headers,
        body,
    })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let response = self.send(self.client.get(url), headers, true).await?;
        collect(response).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let request = self.client.post(url).body(body.to_owned());
        let response = self.send(request, headers, true).await?;
        collect(response).await
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        let request = self.client.post(url).body(body.to_owned());
        let response = self.send(request, headers, false).await?;

        if !response.status().is_success() {
            let failed = collect(response).await?;
            tracing::debug!(url, status = failed.status, "stream request refused");
            return Err(HttpError::ServerError {
                status: failed.status,
                message: failed.error_message(),
            });
        }

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(transport_error)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_is_opt_in() {
        assert_eq!(ReqwestHttpClient::new().request_timeout, None);
        let client = ReqwestHttpClient::new().with_request_timeout(Duration::from_secs(5));
        assert_eq!(client.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_header_map_skips_opaque_values() {
        let mut map = reqwest::header::HeaderMap::new();
        map.insert(
            reqwest::header::CONTENT_TYPE,
            "text/event-stream".parse().unwrap(),
        );
        map.insert(
            "x-binary",
            reqwest::header::HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );

        let headers = header_map(&map);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["content-type"], "text/event-stream");
    }

    #[tokio::test]
    async fn test_get_invalid_url() {
        let result = ReqwestHttpClient::new()
            .get("not-a-valid-url", &Headers::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_post_stream_connection_refused() {
        let result = ReqwestHttpClient::new()
            .post_stream("http://127.0.0.1:59999/chat", "{}", &Headers::new())
            .await;
        assert!(matches!(result, Err(e) if e.is_retryable()));
    }
}
