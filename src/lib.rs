pub mod app;
pub mod config;
pub mod db;
pub mod enhance;
pub mod error;
pub mod gemini;
pub mod hub;
pub mod imaging;
pub mod models;
pub mod narration;
pub mod storage;
pub mod utils;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use log::{error, info, warn};

use app::{AppController, Backends};
use config::AppConfig;
use db::Database;
use enhance::DelayedEcho;
use gemini::GeminiClient;
use hub::ForensicsHub;
use imaging::{HttpFetcher, ImageFile};
use narration::{NarrationController, SpeechEngine};
use storage::SnapshotStore;

#[cfg(feature = "speaker")]
fn speech_engine(http: &reqwest::Client, config: &AppConfig) -> Arc<dyn SpeechEngine> {
    Arc::new(narration::SpeakerEngine::new(
        http.clone(),
        config.narration.clone(),
    ))
}

#[cfg(not(feature = "speaker"))]
fn speech_engine(_http: &reqwest::Client, _config: &AppConfig) -> Arc<dyn SpeechEngine> {
    Arc::new(narration::NoSpeech)
}

/// Headless driver: restore the last analysis, then upload and analyze the
/// image named by the first argument (if any) and print the view as JSON.
pub fn run() {
    let data_dir = config::data_dir();
    let (config, problem) = load_config(&data_dir.join("settings.json"));
    utils::logging::init(config.log_level());
    if let Some(err) = problem {
        warn!("Settings problem: {err:#}");
    }

    info!("Forensics tutor starting up...");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            return;
        }
    };

    if let Err(err) = runtime.block_on(drive(config, data_dir)) {
        error!("Forensics tutor stopped: {err:#}");
    }
}

/// Settings for this run, plus a problem to report once logging is up. A
/// missing settings file is written out with the defaults as a template.
fn load_config(path: &Path) -> (AppConfig, Option<anyhow::Error>) {
    match AppConfig::load(path) {
        Ok(config) if path.exists() => (config, None),
        Ok(config) => {
            let problem = config.persist(path).err();
            (config, problem)
        }
        Err(err) => (AppConfig::from_env(), Some(err)),
    }
}

async fn drive(config: AppConfig, data_dir: PathBuf) -> anyhow::Result<()> {
    let database = match Database::new(data_dir.join("forensics-tutor.sqlite3")) {
        Ok(database) => database,
        Err(err) => {
            warn!("Falling back to an in-memory database: {err:#}");
            Database::in_memory()?
        }
    };

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let backends = Backends {
        model: Arc::new(GeminiClient::new(http.clone(), config.gemini.clone())),
        enhancer: Arc::new(DelayedEcho::new(config.enhancement_delay())),
        fetcher: Arc::new(HttpFetcher::new(http.clone())),
    };
    let narration = NarrationController::new(speech_engine(&http, &config), &config.narration);
    if !narration.is_supported() {
        info!("Speech synthesis unavailable; narration disabled");
    }

    let (_hub, signals) = ForensicsHub::new();
    let app = AppController::new(
        &config,
        backends,
        narration,
        SnapshotStore::new(Arc::new(database)),
        signals,
    );

    app.restore().await;

    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        app.upload(ImageFile::from_path_bytes(name, bytes))
            .await
            .await
            .context("metadata task panicked")?;

        if let Err(err) = app.analyze().await {
            warn!("Analysis did not complete: {err}");
        }
        if let Some(distance) = app.tamper_distance().await {
            info!("Perceptual distance between original and tampered image: {distance}");
        }
    }

    let view = app.view().await;
    println!("{}", serde_json::to_string_pretty(&view)?);

    app.stop_narration();
    Ok(())
}
