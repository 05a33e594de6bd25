use serde::{Deserialize, Serialize};

use super::{AnalysisResult, FileMetadata};

/// Format of the capture timestamp shown as "Analysis performed on".
pub const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What the controller hands to the persistence adapter; the adapter stamps
/// the capture time itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDraft {
    pub analysis_result: AnalysisResult,
    pub original_image_url: String,
    pub file_metadata: Option<FileMetadata>,
}

/// The single persisted record of the last successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub analysis_result: AnalysisResult,
    pub original_image_url: String,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_metadata: Option<FileMetadata>,
}

impl StoredSnapshot {
    pub fn stamp(draft: SnapshotDraft, upload_date: String) -> Self {
        Self {
            analysis_result: draft.analysis_result,
            original_image_url: draft.original_image_url,
            upload_date,
            file_metadata: draft.file_metadata,
        }
    }
}
