use async_trait::async_trait;
use log::{debug, info};

use super::prompts::{
    analysis_response_schema, ANALYSIS_SYSTEM_INSTRUCTION, CHAT_SYSTEM_INSTRUCTION,
    SYNTHESIS_INSTRUCTION,
};
use super::wire::{
    decode_analysis, error_message, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part,
};
use super::ForensicsModel;
use crate::config::GeminiSettings;
use crate::error::{TutorError, TutorResult};
use crate::imaging::ImageFile;
use crate::models::TamperAnalysis;

/// `generateContent` over HTTPS. One request per call; retries and timeouts
/// belong to the caller.
pub struct GeminiClient {
    client: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> TutorResult<GenerateContentResponse> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| TutorError::Backend("Gemini API key not configured".into()))?;

        debug!("POST generateContent model={model}");
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TutorError::Backend(error_message(status.as_u16(), &body)));
        }

        serde_json::from_str(&body).map_err(|err| TutorError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ForensicsModel for GeminiClient {
    async fn analyze_tampering(
        &self,
        image: &ImageFile,
        prompt: &str,
    ) -> TutorResult<TamperAnalysis> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::image(image), Part::text(prompt)])],
            system_instruction: Some(Content::system(ANALYSIS_SYSTEM_INSTRUCTION)),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(analysis_response_schema()),
                response_modalities: None,
            }),
        };

        let response = self
            .generate(&self.settings.analysis_model, &request)
            .await?;
        let text = response
            .text()
            .ok_or_else(|| TutorError::Decode("analysis response contained no text".into()))?;
        let analysis = decode_analysis(&text)?;
        info!(
            "Tamper analysis returned {} area(s)",
            analysis.manipulated_areas.len()
        );
        Ok(analysis)
    }

    async fn synthesize_tampered_image(&self, image: &ImageFile) -> TutorResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::image(image),
                Part::text(SYNTHESIS_INSTRUCTION),
            ])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: Some(vec!["IMAGE".into(), "TEXT".into()]),
            }),
        };

        let response = self.generate(&self.settings.image_model, &request).await?;
        response
            .image_data_url()
            .ok_or_else(|| TutorError::Generation("no image part returned".into()))
    }

    async fn send_chat_turn(&self, user_text: &str) -> TutorResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(user_text)])],
            system_instruction: Some(Content::system(CHAT_SYSTEM_INSTRUCTION)),
            generation_config: None,
        };

        let response = self.generate(&self.settings.chat_model, &request).await?;
        response
            .text()
            .ok_or_else(|| TutorError::Generation("empty chat reply".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            reqwest::Client::new(),
            GeminiSettings {
                api_key: api_key.map(str::to_string),
                base_url: "https://example.invalid/v1beta/".into(),
                ..GeminiSettings::default()
            },
        )
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        assert_eq!(
            client(Some("k")).endpoint("gemini-2.5-flash"),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let image = ImageFile::new("a.png", "image/png", vec![1, 2, 3]);
        let err = client(None)
            .synthesize_tampered_image(&image)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TutorError::Backend("Gemini API key not configured".into())
        );
    }
}
