use serde::Serialize;

use crate::error::TutorError;
use crate::hub::data::{ExampleImage, EXAMPLE_IMAGES};
use crate::imaging::ImageFile;
use crate::models::{
    AnalysisResult, ChatMessage, ChatTranscript, FileMetadata, SnapshotDraft, StoredSnapshot,
};
use crate::narration::NarrationState;

pub const NO_IMAGE_MESSAGE: &str = "Please upload an image first.";
pub const FETCH_FAILED_MESSAGE: &str = "Could not load the example image due to network or \
cross-origin (CORS) restrictions. Please upload an image manually.";
pub const ENHANCEMENT_FAILED_MESSAGE: &str = "Image enhancement failed.";

/// Side effects requested by a state transition, performed in order by the
/// controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ClearSnapshot,
    StopNarration,
    DeriveMetadata { token: u64, file: ImageFile },
    /// Save, then read back the stored capture time for `token`.
    PersistSnapshot { token: u64, draft: SnapshotDraft },
    Narrate { token: u64, text: String, volume: f32 },
}

/// Everything an analysis run needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub token: u64,
    pub image: ImageFile,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct EnhancementTicket {
    pub token: u64,
    pub image_url: String,
}

/// Render snapshot of the application.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppView {
    pub has_image_file: bool,
    pub image_url: Option<String>,
    pub file_metadata: Option<FileMetadata>,
    pub prompt: String,
    pub result: Option<AnalysisResult>,
    /// Identity of `result`; changes whenever a new analysis lands.
    pub result_id: Option<u64>,
    pub upload_date: Option<String>,
    pub is_loading: bool,
    pub is_enhancing: bool,
    pub error: Option<String>,
    pub narration_state: NarrationState,
    pub narration_volume: f32,
    pub chat_messages: Vec<ChatMessage>,
    pub chat_loading: bool,
    /// Sample images offered when nothing has been uploaded yet.
    pub example_images: &'static [ExampleImage],
}

/// All cross-cutting application state. Transitions mutate it and hand back
/// the effects the controller must carry out; results that arrive with a
/// token other than the one currently expected are dropped.
#[derive(Debug, Clone)]
pub struct AppState {
    image: Option<ImageFile>,
    image_url: Option<String>,
    metadata: Option<FileMetadata>,
    prompt: String,
    result: Option<AnalysisResult>,
    result_id: Option<u64>,
    upload_date: Option<String>,
    error: Option<String>,
    narration_volume: f32,
    chat: ChatTranscript,
    chat_loading: bool,

    last_token: u64,
    image_token: u64,
    pending_analysis: Option<u64>,
    pending_enhancement: Option<u64>,
}

impl AppState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            image: None,
            image_url: None,
            metadata: None,
            prompt: prompt.into(),
            result: None,
            result_id: None,
            upload_date: None,
            error: None,
            narration_volume: 1.0,
            chat: ChatTranscript::default(),
            chat_loading: false,
            last_token: 0,
            image_token: 0,
            pending_analysis: None,
            pending_enhancement: None,
        }
    }

    fn next_token(&mut self) -> u64 {
        self.last_token += 1;
        self.last_token
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.result_id = None;
        self.upload_date = None;
        self.pending_enhancement = None;
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn narration_volume(&self) -> f32 {
        self.narration_volume
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_narration_volume(&mut self, volume: f32) -> f32 {
        self.narration_volume = volume.clamp(0.0, 1.0);
        self.narration_volume
    }

    /// A new image replaces the old one wholesale and supersedes any analysis
    /// still in flight.
    pub fn begin_upload(&mut self, file: ImageFile) -> Vec<Effect> {
        let token = self.next_token();
        self.image_token = token;
        self.image_url = Some(file.to_data_url());
        self.image = Some(file.clone());
        self.metadata = None;
        self.error = None;
        self.pending_analysis = None;
        self.clear_result();

        vec![Effect::ClearSnapshot, Effect::DeriveMetadata { token, file }]
    }

    pub fn apply_metadata(&mut self, token: u64, metadata: FileMetadata) -> bool {
        if token != self.image_token {
            return false;
        }
        self.metadata = Some(metadata);
        true
    }

    pub fn begin_example_fetch(&mut self) -> Vec<Effect> {
        self.error = None;
        self.clear_result();
        vec![Effect::ClearSnapshot]
    }

    pub fn fail_example_fetch(&mut self) {
        self.error = Some(FETCH_FAILED_MESSAGE.to_string());
    }

    pub fn begin_analysis(&mut self) -> Result<(AnalysisTicket, Vec<Effect>), TutorError> {
        let Some(image) = self.image.clone() else {
            self.error = Some(NO_IMAGE_MESSAGE.to_string());
            return Err(TutorError::Precondition("no image".into()));
        };

        let token = self.next_token();
        self.pending_analysis = Some(token);
        self.error = None;
        self.clear_result();

        let ticket = AnalysisTicket {
            token,
            image,
            prompt: self.prompt.clone(),
        };
        Ok((ticket, vec![Effect::StopNarration]))
    }

    /// Install the merged result of run `token`. Returns `None` when the run
    /// has been superseded.
    pub fn complete_analysis(&mut self, token: u64, result: AnalysisResult) -> Option<Vec<Effect>> {
        if self.pending_analysis != Some(token) {
            return None;
        }
        self.result = Some(result.clone());
        self.result_id = Some(token);

        let mut effects = Vec::with_capacity(2);
        if let Some(original_image_url) = self.image_url.clone() {
            effects.push(Effect::PersistSnapshot {
                token,
                draft: SnapshotDraft {
                    analysis_result: result.clone(),
                    original_image_url,
                    file_metadata: self.metadata.clone(),
                },
            });
        }
        effects.push(Effect::Narrate {
            token,
            text: result.analysis_text,
            volume: self.narration_volume,
        });
        Some(effects)
    }

    /// Whether the displayed result still comes from `token`.
    pub fn is_current_result(&self, token: u64) -> bool {
        self.result_id == Some(token)
    }

    pub fn record_upload_date(&mut self, token: u64, upload_date: String) {
        if self.result_id == Some(token) {
            self.upload_date = Some(upload_date);
        }
    }

    pub fn fail_analysis(&mut self, token: u64, message: &str) -> bool {
        if self.pending_analysis != Some(token) {
            return false;
        }
        self.error = Some(format!("Analysis Failed: {message}"));
        true
    }

    pub fn finish_analysis(&mut self, token: u64) {
        if self.pending_analysis == Some(token) {
            self.pending_analysis = None;
        }
    }

    pub fn begin_enhancement(&mut self) -> Result<EnhancementTicket, TutorError> {
        let Some(result) = self.result.as_ref() else {
            return Err(TutorError::Precondition(
                "no analysis result to enhance".into(),
            ));
        };
        let image_url = result.tampered_image_url.clone();
        let token = self.next_token();
        self.pending_enhancement = Some(token);
        Ok(EnhancementTicket { token, image_url })
    }

    /// Replace only the tampered image of the current result.
    pub fn complete_enhancement(&mut self, token: u64, image_url: String) -> bool {
        if self.pending_enhancement != Some(token) {
            return false;
        }
        match self.result.as_mut() {
            Some(result) => {
                result.tampered_image_url = image_url;
                true
            }
            None => false,
        }
    }

    pub fn fail_enhancement(&mut self, token: u64) {
        if self.pending_enhancement == Some(token) {
            self.error = Some(ENHANCEMENT_FAILED_MESSAGE.to_string());
        }
    }

    pub fn finish_enhancement(&mut self, token: u64) {
        if self.pending_enhancement == Some(token) {
            self.pending_enhancement = None;
        }
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        self.image_token = self.next_token();
        self.image = None;
        self.image_url = None;
        self.metadata = None;
        self.error = None;
        self.pending_analysis = None;
        self.clear_result();
        vec![Effect::StopNarration, Effect::ClearSnapshot]
    }

    /// Show a stored snapshot. The original file is gone, so re-analysis
    /// needs a fresh upload.
    pub fn restore(&mut self, snapshot: StoredSnapshot) {
        let token = self.next_token();
        self.image_token = token;
        self.image = None;
        self.image_url = Some(snapshot.original_image_url);
        self.metadata = snapshot.file_metadata;
        self.result = Some(snapshot.analysis_result);
        self.result_id = Some(token);
        self.upload_date = Some(snapshot.upload_date);
    }

    /// Append the user's message. Returns the text to send, or `None` for
    /// blank input or while a reply is pending.
    pub fn begin_chat(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || self.chat_loading {
            return None;
        }
        self.chat.push(ChatMessage::user(text));
        self.chat_loading = true;
        Some(text.to_string())
    }

    pub fn finish_chat(&mut self, reply: String) {
        self.chat.push(ChatMessage::model(reply));
        self.chat_loading = false;
    }

    pub fn view(&self, narration_state: NarrationState) -> AppView {
        AppView {
            has_image_file: self.image.is_some(),
            image_url: self.image_url.clone(),
            file_metadata: self.metadata.clone(),
            prompt: self.prompt.clone(),
            result: self.result.clone(),
            result_id: self.result_id,
            upload_date: self.upload_date.clone(),
            is_loading: self.pending_analysis.is_some(),
            is_enhancing: self.pending_enhancement.is_some(),
            error: self.error.clone(),
            narration_state,
            narration_volume: self.narration_volume,
            chat_messages: self.chat.messages().to_vec(),
            chat_loading: self.chat_loading,
            example_images: &EXAMPLE_IMAGES,
        }
    }
}
