use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::poll::PollPolicy;

/// Default style token: the backend picks a style from the prompt.
pub const AUTO_STYLE: &str = "<auto>";
pub const DEFAULT_IMAGE_SIZE: &str = "1024*1024";
pub const DEFAULT_VIDEO_QUALITY: &str = "speed";
pub const DEFAULT_VIDEO_SIZE: &str = "1920x1080";
pub const DEFAULT_VIDEO_DURATION: u32 = 5;

const VIDEO_QUALITIES: [&str; 2] = ["speed", "quality"];
const VIDEO_DURATIONS: [u32; 2] = [5, 10];

/// Task ids come back as strings from some backends and integers from others.
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// The two kinds of long-running generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Image,
    Video,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Image => "image",
            TaskKind::Video => "video",
        }
    }

    /// Endpoint that creates a job of this kind.
    pub fn create_path(&self) -> &'static str {
        match self {
            TaskKind::Image => "/text-to-image",
            TaskKind::Video => "/create-video",
        }
    }

    /// Endpoint prefix for status checks; the task id is appended.
    pub fn progress_path(&self) -> &'static str {
        match self {
            TaskKind::Image => "/image-task-progress",
            TaskKind::Video => "/video-task-progress",
        }
    }

    /// Status that means "still working, keep the short interval".
    pub fn active_status(&self) -> TaskStatus {
        match self {
            TaskKind::Image => TaskStatus::Running,
            TaskKind::Video => TaskStatus::Processing,
        }
    }

    pub fn default_policy(&self) -> PollPolicy {
        match self {
            TaskKind::Image => PollPolicy::image(),
            TaskKind::Video => PollPolicy::video(),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /text-to-image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: String,
    pub size: String,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: AUTO_STYLE.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }
}

/// Body of `POST /create-video`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRequest {
    pub prompt: String,
    /// `speed` or `quality`
    pub quality: String,
    pub size: String,
    /// Seconds; the backend accepts 5 or 10
    pub duration: u32,
    pub fps: u32,
    pub with_audio: bool,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            quality: DEFAULT_VIDEO_QUALITY.to_string(),
            size: DEFAULT_VIDEO_SIZE.to_string(),
            duration: DEFAULT_VIDEO_DURATION,
            fps: 30,
            with_audio: false,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    /// Reject options the backend is known not to support.
    pub fn validate(&self) -> Result<(), String> {
        if !VIDEO_QUALITIES.contains(&self.quality.as_str()) {
            return Err(format!(
                "Unsupported quality '{}', expected speed or quality",
                self.quality
            ));
        }
        if !VIDEO_DURATIONS.contains(&self.duration) {
            return Err(format!(
                "Unsupported duration {}s, expected 5 or 10",
                self.duration
            ));
        }
        Ok(())
    }
}

/// Response of a job-creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskCreated {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable estimate, e.g. "3-8 minutes"
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Job status as reported by the progress endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Processing,
    Completed,
    Failed,
    /// Anything else, including a missing status
    #[default]
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Optional detail attached to an in-progress job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProgressInfo {
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

/// Response of a progress endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskProgress {
    /// False when the status lookup itself failed
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub progress: Option<ProgressInfo>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskProgress {
    /// Message for a failed job: `error`, then `message`, then a generic one.
    pub fn failure_message(&self, kind: TaskKind) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| format!("{} generation failed", kind))
    }

    /// URL of the finished artifact for this kind of job.
    pub fn result_url(&self, kind: TaskKind) -> Option<&str> {
        match kind {
            TaskKind::Image => self.image_url.as_deref(),
            TaskKind::Video => self.video_url.as_deref(),
        }
    }

    pub fn percentage(&self) -> Option<f64> {
        self.progress.as_ref().and_then(|p| p.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_request_defaults() {
        let req = ImageRequest::new("a cat");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"prompt": "a cat", "style": "<auto>", "size": "1024*1024"})
        );
    }

    #[test]
    fn test_video_request_defaults_and_validation() {
        let req = VideoRequest::new("waves");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["fps"], 30);
        assert_eq!(value["with_audio"], false);
        assert_eq!(value["quality"], "speed");
        assert!(req.validate().is_ok());

        assert!(VideoRequest::new("x").with_duration(7).validate().is_err());
        assert!(VideoRequest::new("x").with_quality("ultra").validate().is_err());
        assert!(VideoRequest::new("x").with_duration(10).validate().is_ok());
    }

    #[test]
    fn test_task_created_accepts_numeric_id() {
        let created: TaskCreated = serde_json::from_value(json!({"task_id": 42})).unwrap();
        assert_eq!(created.task_id.as_deref(), Some("42"));

        let created: TaskCreated =
            serde_json::from_value(json!({"task_id": "abc", "status": "pending"})).unwrap();
        assert_eq!(created.task_id.as_deref(), Some("abc"));

        let created: TaskCreated = serde_json::from_value(json!({"error": "bad prompt"})).unwrap();
        assert!(created.task_id.is_none());
    }

    #[test]
    fn test_task_status_unknown_values() {
        let progress: TaskProgress =
            serde_json::from_value(json!({"success": true, "status": "queued"})).unwrap();
        assert_eq!(progress.status, TaskStatus::Unknown);

        let progress: TaskProgress = serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(progress.status, TaskStatus::Unknown);
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let p = TaskProgress {
            error: Some("nsfw".to_string()),
            message: Some("other".to_string()),
            ..Default::default()
        };
        assert_eq!(p.failure_message(TaskKind::Image), "nsfw");

        let p = TaskProgress {
            message: Some("quota".to_string()),
            ..Default::default()
        };
        assert_eq!(p.failure_message(TaskKind::Image), "quota");

        assert_eq!(
            TaskProgress::default().failure_message(TaskKind::Video),
            "video generation failed"
        );
    }

    #[test]
    fn test_progress_detail() {
        let p: TaskProgress = serde_json::from_value(json!({
            "success": true,
            "status": "processing",
            "progress": {"percentage": 60, "current_stage": "rendering"}
        }))
        .unwrap();
        assert_eq!(p.percentage(), Some(60.0));
        assert_eq!(p.result_url(TaskKind::Video), None);
    }
}
