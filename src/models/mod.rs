pub mod analysis;
pub mod chat;
pub mod snapshot;

pub use analysis::{AiDetectionResult, AnalysisResult, BoundingBox, FileMetadata, TamperAnalysis};
pub use chat::{ChatMessage, ChatRole, ChatTranscript, CHAT_APOLOGY, CHAT_GREETING};
pub use snapshot::{SnapshotDraft, StoredSnapshot, UPLOAD_DATE_FORMAT};
