//! Calls to the generative model: tamper analysis, tampered-image synthesis
//! and the tutor chat.

use async_trait::async_trait;

pub mod client;
pub mod prompts;
pub mod wire;

pub use client::GeminiClient;

use crate::error::TutorResult;
use crate::imaging::ImageFile;
use crate::models::TamperAnalysis;

#[async_trait]
pub trait ForensicsModel: Send + Sync {
    /// Structured tamper analysis of `image` guided by `prompt`.
    async fn analyze_tampering(&self, image: &ImageFile, prompt: &str)
        -> TutorResult<TamperAnalysis>;

    /// A subtly altered copy of `image`, as a data URL.
    async fn synthesize_tampered_image(&self, image: &ImageFile) -> TutorResult<String>;

    /// One stateless chat turn; no history is sent.
    async fn send_chat_turn(&self, user_text: &str) -> TutorResult<String>;
}
