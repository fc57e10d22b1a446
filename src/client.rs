//! Client for the studio backend.
//!
//! Wraps an [`HttpClient`] and exposes one method per endpoint, plus the
//! higher-level flows that combine them: a session-aware chat turn and the
//! create-then-poll generation jobs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ChatReply, ChatRequest, ImageRequest, ImageStyles, ModelCatalog, TaskCreated, TaskKind,
    TaskProgress, TaskStatus, VideoRequest,
};
use crate::poll::{PollPolicy, PollStep, PollTask};
use crate::session::{ChatSession, ChatTurn};
use crate::stream::{EventStreamReader, ReaderOptions, RecordHandler, Transcript};
use crate::traits::{Headers, HttpClient};

/// Client for the chat, image and video endpoints.
#[derive(Clone)]
pub struct StudioClient {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl StudioClient {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> Self {
        let mut http = ReqwestHttpClient::new();
        if let Some(timeout) = config.request_timeout {
            http = http.with_request_timeout(timeout);
        }
        Self::with_http(config, Arc::new(http))
    }

    /// Create a client over any transport, e.g. a mock in tests.
    pub fn with_http(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reader settings for a streamed turn, using the configured idle timeout.
    pub fn reader_options(&self, cancel: CancellationToken) -> ReaderOptions {
        let options = ReaderOptions::new().with_cancel(cancel);
        match self.config.idle_timeout {
            Some(timeout) => options.with_idle_timeout(timeout),
            None => options,
        }
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// Open a streamed chat response.
    ///
    /// Records are read lazily; drive the returned reader with
    /// [`EventStreamReader::pump`] or [`EventStreamReader::next_record`].
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        options: ReaderOptions,
    ) -> ClientResult<EventStreamReader> {
        let request = request.clone().with_stream(true);
        let body = to_body(&request)?;
        let url = self.config.url("/chat");

        let mut headers = json_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        tracing::debug!(
            model = %request.model,
            history = request.history.len(),
            "opening chat stream"
        );
        let stream = self.http.post_stream(&url, &body, &headers).await?;
        Ok(EventStreamReader::open(stream, options))
    }

    /// Send a chat message and wait for the whole reply.
    pub async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatReply> {
        let request = request.clone().with_stream(false);
        let reply: ChatReply = self.post_json("/chat", &request).await?;
        if !reply.is_success() {
            return Err(ClientError::Rejected {
                message: reply.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(reply)
    }

    /// Run a turn started with [`ChatSession::begin_turn`].
    ///
    /// Streams when the turn's request asks for it, dispatching records to
    /// `handler` as they arrive. Cancelling the turn (directly or by
    /// beginning a newer one) ends this call with a cancellation error. The
    /// session is not touched; pass the result to
    /// [`ChatSession::finish_turn`].
    pub async fn run_turn<H>(&self, turn: &ChatTurn, handler: &mut H) -> ClientResult<Transcript>
    where
        H: RecordHandler + ?Sized,
    {
        let request = turn.request();
        if request.message.is_empty() {
            return Err(ClientError::InvalidInput("Message cannot be empty".to_string()));
        }
        let cancel = turn.cancel_token().clone();

        if request.stream {
            let mut reader = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                reader = self.chat_stream(request, self.reader_options(cancel.clone())) => reader?,
            };
            return Ok(reader.pump(handler).await?.into_transcript()?);
        }

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            reply = self.chat(request) => reply?,
        };
        Ok(Transcript {
            answer: reply.response,
            ..Default::default()
        })
    }

    /// Begin, run and record one turn.
    ///
    /// Holds the session for the whole turn; callers that need to supersede
    /// a running turn use [`ChatSession::begin_turn`] and
    /// [`StudioClient::run_turn`] directly.
    pub async fn send_message<H>(
        &self,
        session: &mut ChatSession,
        message: &str,
        handler: &mut H,
    ) -> ClientResult<Transcript>
    where
        H: RecordHandler + ?Sized,
    {
        // Checked before begin_turn so a blank line does not cancel anything
        if message.trim().is_empty() {
            return Err(ClientError::InvalidInput("Message cannot be empty".to_string()));
        }

        let turn = session.begin_turn(message);
        let transcript = self.run_turn(&turn, handler).await?;
        session.finish_turn(&turn, &transcript);
        tracing::info!(
            session_id = %session.id,
            turns = session.history().len(),
            "chat turn complete"
        );
        Ok(transcript)
    }

    /// Fetch the available chat models.
    pub async fn models(&self) -> ClientResult<ModelCatalog> {
        self.get_json("/models").await
    }

    /// Fetch the image style and size options.
    pub async fn image_styles(&self) -> ClientResult<ImageStyles> {
        self.get_json("/image-styles").await
    }

    // ========================================================================
    // Generation jobs
    // ========================================================================

    /// Create an image job and return its task id.
    pub async fn create_image_task(&self, request: &ImageRequest) -> ClientResult<String> {
        if request.prompt.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Image prompt cannot be empty".to_string(),
            ));
        }
        self.create_task(TaskKind::Image, request).await
    }

    /// Check an image job once.
    pub async fn image_task_progress(&self, task_id: &str) -> ClientResult<TaskProgress> {
        self.task_progress(TaskKind::Image, task_id).await
    }

    /// Create an image job and poll it to completion.
    ///
    /// `on_progress` sees every status response, including the final one.
    pub async fn generate_image<F>(
        &self,
        request: &ImageRequest,
        cancel: CancellationToken,
        on_progress: F,
    ) -> ClientResult<TaskProgress>
    where
        F: Fn(&TaskProgress) + Sync,
    {
        let task_id = self.create_image_task(request).await?;
        self.await_task(
            TaskKind::Image,
            &task_id,
            self.config.poll_policy(TaskKind::Image),
            cancel,
            on_progress,
        )
        .await
    }

    /// Create a video job and return its task id.
    pub async fn create_video_task(&self, request: &VideoRequest) -> ClientResult<String> {
        if request.prompt.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Video prompt cannot be empty".to_string(),
            ));
        }
        request.validate().map_err(ClientError::InvalidInput)?;
        self.create_task(TaskKind::Video, request).await
    }

    /// Check a video job once.
    pub async fn video_task_progress(&self, task_id: &str) -> ClientResult<TaskProgress> {
        self.task_progress(TaskKind::Video, task_id).await
    }

    /// Create a video job and poll it to completion.
    pub async fn generate_video<F>(
        &self,
        request: &VideoRequest,
        cancel: CancellationToken,
        on_progress: F,
    ) -> ClientResult<TaskProgress>
    where
        F: Fn(&TaskProgress) + Sync,
    {
        let task_id = self.create_video_task(request).await?;
        self.await_task(
            TaskKind::Video,
            &task_id,
            self.config.poll_policy(TaskKind::Video),
            cancel,
            on_progress,
        )
        .await
    }

    /// Poll an existing job until it completes, fails or is cancelled.
    pub async fn await_task<F>(
        &self,
        kind: TaskKind,
        task_id: &str,
        policy: PollPolicy,
        cancel: CancellationToken,
        on_progress: F,
    ) -> ClientResult<TaskProgress>
    where
        F: Fn(&TaskProgress) + Sync,
    {
        let on_progress = &on_progress;
        let poll = PollTask::new(policy, cancel).with_task_id(task_id);

        let progress = poll
            .run(move || async move {
                let progress = self.task_progress(kind, task_id).await?;
                on_progress(&progress);
                classify(kind, task_id, progress)
            })
            .await?;

        tracing::info!(
            kind = %kind,
            task_id,
            url = progress.result_url(kind).unwrap_or(""),
            "generation complete"
        );
        Ok(progress)
    }

    async fn create_task<B: Serialize>(&self, kind: TaskKind, request: &B) -> ClientResult<String> {
        let created: TaskCreated = self.post_json(kind.create_path(), request).await?;
        match (created.task_id, created.error) {
            (Some(task_id), None) => {
                tracing::info!(
                    kind = %kind,
                    task_id = %task_id,
                    estimated = created.estimated_time.as_deref().unwrap_or("unknown"),
                    "generation task created"
                );
                Ok(task_id)
            }
            (_, Some(error)) => Err(ClientError::Rejected { message: error }),
            (None, None) => Err(ClientError::Rejected {
                message: format!("Failed to create {} task", kind),
            }),
        }
    }

    async fn task_progress(&self, kind: TaskKind, task_id: &str) -> ClientResult<TaskProgress> {
        let path = format!("{}/{}", kind.progress_path(), urlencoding::encode(task_id));
        let progress: TaskProgress = self.get_json(&path).await?;
        if !progress.success {
            return Err(ClientError::Rejected {
                message: progress
                    .error
                    .unwrap_or_else(|| format!("Could not check {} task {}", kind, task_id)),
            });
        }
        Ok(progress)
    }

    // ========================================================================
    // Transport helpers
    // ========================================================================

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.config.url(path);
        let response = self.http.get(&url, &Headers::new()).await?;
        if !response.is_success() {
            return Err(ClientError::Server {
                status: response.status,
                message: response.error_message(),
            });
        }
        response.json().map_err(|source| ClientError::Json {
            endpoint: path.to_string(),
            source,
        })
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.config.url(path);
        let body = to_body(body)?;
        let response = self.http.post(&url, &body, &json_headers()).await?;
        if !response.is_success() {
            return Err(ClientError::Server {
                status: response.status,
                message: response.error_message(),
            });
        }
        response.json().map_err(|source| ClientError::Json {
            endpoint: path.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for StudioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Map one status response onto the poll loop.
fn classify(
    kind: TaskKind,
    task_id: &str,
    progress: TaskProgress,
) -> ClientResult<PollStep<TaskProgress>> {
    match progress.status {
        TaskStatus::Completed => Ok(PollStep::Ready(progress)),
        TaskStatus::Failed => Err(ClientError::TaskFailed {
            task_id: task_id.to_string(),
            message: progress.failure_message(kind),
        }),
        status => Ok(PollStep::Pending {
            active: status == kind.active_status(),
        }),
    }
}

fn json_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

fn to_body<B: Serialize>(body: &B) -> ClientResult<String> {
    serde_json::to_string(body).map_err(|e| ClientError::InvalidInput(e.to_string()))
}
