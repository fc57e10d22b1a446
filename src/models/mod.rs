//! Request and response types for the studio backend.

mod catalog;
mod chat;
mod task;

pub use catalog::{ImageStyles, ModelCatalog, ModelInfo};
pub use chat::{ChatReply, ChatRequest, HistoryEntry, ModelId};
pub use task::{
    ImageRequest, ProgressInfo, TaskCreated, TaskKind, TaskProgress, TaskStatus, VideoRequest,
    AUTO_STYLE, DEFAULT_IMAGE_SIZE, DEFAULT_VIDEO_DURATION, DEFAULT_VIDEO_QUALITY,
    DEFAULT_VIDEO_SIZE,
};
