use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_PROMPT: &str = "Analyze this image for tampering";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub analysis_model: String,
    pub image_model: String,
    pub chat_model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            analysis_model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image-preview".into(),
            chat_model: "gemini-2.5-flash".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NarrationSettings {
    pub language: String,
    pub rate: f32,
    #[serde(skip_serializing)]
    pub tts_api_key: Option<String>,
    pub tts_base_url: String,
    pub voice_id: String,
    pub tts_model: String,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            rate: 1.0,
            tts_api_key: None,
            tts_base_url: "https://api.elevenlabs.io/v1".into(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            tts_model: "eleven_multilingual_v2".into(),
        }
    }
}

/// Timings of the result view. Milliseconds so the JSON stays readable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PresentationSettings {
    pub reveal_base_ms: u64,
    pub reveal_stride_ms: u64,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            reveal_base_ms: 500,
            reveal_stride_ms: 300,
        }
    }
}

impl PresentationSettings {
    pub fn reveal_base(&self) -> Duration {
        Duration::from_millis(self.reveal_base_ms)
    }

    pub fn reveal_stride(&self) -> Duration {
        Duration::from_millis(self.reveal_stride_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub gemini: GeminiSettings,
    pub narration: NarrationSettings,
    pub presentation: PresentationSettings,
    pub request_timeout_secs: u64,
    pub enhancement_delay_ms: u64,
    pub default_prompt: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiSettings::default(),
            narration: NarrationSettings::default(),
            presentation: PresentationSettings::default(),
            request_timeout_secs: 60,
            enhancement_delay_ms: 2_000,
            default_prompt: DEFAULT_PROMPT.into(),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Read `path` if it exists, then apply environment overrides. A missing
    /// file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Malformed settings at {}", path.display()))?
        } else {
            AppConfig::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Defaults plus environment overrides, for when the file is unusable.
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(key) = var("ELEVENLABS_API_KEY") {
            self.narration.tts_api_key = Some(key);
        }
        if let Some(value) = var("FORENSICS_TUTOR_DEBUG") {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }
    }

    /// Write the settings minus secrets, creating the directory if needed.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn enhancement_delay(&self) -> Duration {
        Duration::from_millis(self.enhancement_delay_ms)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

/// `<platform data dir>/forensics-tutor`, or the working directory when the
/// platform has none.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("forensics-tutor")
}
