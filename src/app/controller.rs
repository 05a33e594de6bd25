use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    config::AppConfig,
    enhance::Enhancer,
    error::{with_timeout, TutorError, TutorResult},
    gemini::ForensicsModel,
    hub::{HubCommand, HubSignals},
    imaging::{
        decode_data_url, derive_metadata,
        phash::{compute_phash, hamming_distance},
        ImageFetcher, ImageFile,
    },
    models::{AnalysisResult, CHAT_APOLOGY},
    narration::{NarrationController, NarrationState},
    storage::SnapshotStore,
};

use super::state::{AnalysisTicket, AppState, AppView, Effect};

/// The external services the controller talks to.
#[derive(Clone)]
pub struct Backends {
    pub model: Arc<dyn ForensicsModel>,
    pub enhancer: Arc<dyn Enhancer>,
    pub fetcher: Arc<dyn ImageFetcher>,
}

/// Owns [`AppState`] and sequences every user action against the backends.
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AppController {
    state: Arc<Mutex<AppState>>,
    backends: Backends,
    narration: NarrationController,
    snapshots: SnapshotStore,
    hub: HubSignals,
    request_timeout: Duration,
}

impl AppController {
    pub fn new(
        config: &AppConfig,
        backends: Backends,
        narration: NarrationController,
        snapshots: SnapshotStore,
        hub: HubSignals,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(AppState::new(config.default_prompt.clone()))),
            backends,
            narration,
            snapshots,
            hub,
            request_timeout: config.request_timeout(),
        }
    }

    pub async fn view(&self) -> AppView {
        let narration_state = self.narration.state();
        self.state.lock().await.view(narration_state)
    }

    /// Show the last stored analysis, if any. Returns whether one was found.
    pub async fn restore(&self) -> bool {
        match self.snapshots.load().await {
            Some(snapshot) => {
                info!("Restoring analysis from {}", snapshot.upload_date);
                self.state.lock().await.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Replace the current image. Metadata is derived in the background; the
    /// returned handle resolves once it has been applied or discarded.
    pub async fn upload(&self, file: ImageFile) -> JoinHandle<()> {
        info!("Image uploaded: {} ({} bytes)", file.name, file.bytes.len());
        let effects = self.state.lock().await.begin_upload(file);
        let mut background = self.perform(effects).await;
        background
            .pop()
            .unwrap_or_else(|| tokio::spawn(async {}))
    }

    pub async fn select_example(&self, url: &str) -> TutorResult<JoinHandle<()>> {
        let effects = self.state.lock().await.begin_example_fetch();
        self.perform(effects).await;

        let fetched = with_timeout(
            "example image fetch",
            self.request_timeout,
            self.backends.fetcher.fetch(url),
        )
        .await;
        match fetched {
            Ok(file) => Ok(self.upload(file).await),
            Err(err) => {
                error!("Failed to fetch example image {url}: {err}");
                self.state.lock().await.fail_example_fetch();
                Err(err)
            }
        }
    }

    pub async fn set_prompt(&self, prompt: impl Into<String>) {
        self.state.lock().await.set_prompt(prompt);
    }

    /// Run tamper analysis and tampered-image synthesis together and install
    /// the merged result. `Ok(None)` means a newer upload, analysis or reset
    /// superseded this run and its outcome was dropped.
    pub async fn analyze(&self) -> TutorResult<Option<AnalysisResult>> {
        let (ticket, effects) = self.state.lock().await.begin_analysis()?;
        self.perform(effects).await;
        info!(
            "Analysis {} started for {} ({} bytes)",
            ticket.token,
            ticket.image.name,
            ticket.image.bytes.len()
        );

        let outcome = match self.run_analysis(&ticket).await {
            Ok(result) => self.settle(ticket.token, result).await,
            Err(errors) => {
                let message = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                error!("Analysis {} failed: {message}", ticket.token);
                self.state.lock().await.fail_analysis(ticket.token, &message);
                Err(errors.into_iter().next().unwrap_or_else(|| {
                    TutorError::Generation("analysis failed".into())
                }))
            }
        };

        self.state.lock().await.finish_analysis(ticket.token);
        outcome
    }

    async fn run_analysis(&self, ticket: &AnalysisTicket) -> Result<AnalysisResult, Vec<TutorError>> {
        let model = &self.backends.model;
        let analysis = with_timeout(
            "tamper analysis",
            self.request_timeout,
            model.analyze_tampering(&ticket.image, &ticket.prompt),
        );
        let synthesis = with_timeout(
            "tampered image synthesis",
            self.request_timeout,
            model.synthesize_tampered_image(&ticket.image),
        );

        match tokio::join!(analysis, synthesis) {
            (Ok(analysis), Ok(tampered_image_url)) => {
                Ok(AnalysisResult::merge(analysis, tampered_image_url))
            }
            (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(vec![err]),
            (Err(analysis_err), Err(synthesis_err)) => Err(vec![analysis_err, synthesis_err]),
        }
    }

    async fn settle(&self, token: u64, result: AnalysisResult) -> TutorResult<Option<AnalysisResult>> {
        let effects = self
            .state
            .lock()
            .await
            .complete_analysis(token, result.clone());

        match effects {
            Some(effects) => {
                info!(
                    "Analysis {token} complete: {} manipulated area(s)",
                    result.manipulated_areas.len()
                );
                self.perform(effects).await;
                Ok(Some(result))
            }
            None => {
                info!("Discarding result of superseded analysis {token}");
                Ok(None)
            }
        }
    }

    /// Re-render the tampered image of the current result.
    pub async fn enhance(&self) -> TutorResult<()> {
        let ticket = self.state.lock().await.begin_enhancement()?;
        debug!("Enhancement {} started", ticket.token);

        let outcome = with_timeout(
            "image enhancement",
            self.request_timeout,
            self.backends.enhancer.enhance(&ticket.image_url),
        )
        .await;

        let mut state = self.state.lock().await;
        let outcome = match outcome {
            Ok(image_url) => {
                if !state.complete_enhancement(ticket.token, image_url) {
                    debug!("Discarding enhancement {} for a replaced result", ticket.token);
                }
                Ok(())
            }
            Err(err) => {
                error!("Enhancement {} failed: {err}", ticket.token);
                state.fail_enhancement(ticket.token);
                Err(match err {
                    TutorError::Enhancement(_) => err,
                    other => TutorError::Enhancement(other.to_string()),
                })
            }
        };
        state.finish_enhancement(ticket.token);
        outcome
    }

    pub async fn reset(&self) {
        info!("Resetting analysis state");
        let effects = self.state.lock().await.reset();
        self.perform(effects).await;
    }

    /// Send one chat turn. Returns the reply appended to the transcript, or
    /// `None` when the input was ignored.
    pub async fn send_chat(&self, text: &str) -> Option<String> {
        let text = self.state.lock().await.begin_chat(text)?;

        let reply = match with_timeout(
            "chat",
            self.request_timeout,
            self.backends.model.send_chat_turn(&text),
        )
        .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!("Chat turn failed: {err}");
                CHAT_APOLOGY.to_string()
            }
        };

        self.state.lock().await.finish_chat(reply.clone());
        Some(reply)
    }

    /// Play/pause/resume toggle for the narration control. Starting from
    /// stopped speaks the current analysis text; the returned handle resolves
    /// when that utterance ends. `None` when nothing new started.
    pub async fn toggle_narration(&self) -> Option<JoinHandle<()>> {
        match self.narration.state() {
            NarrationState::Playing => {
                self.narration.pause();
                None
            }
            NarrationState::Paused => {
                self.narration.resume();
                None
            }
            NarrationState::Stopped => {
                let state = self.state.lock().await;
                let text = &state.result()?.analysis_text;
                self.narrate(text, state.narration_volume())
            }
        }
    }

    pub fn stop_narration(&self) {
        self.narration.stop();
    }

    pub async fn set_volume(&self, volume: f32) {
        let volume = self.state.lock().await.set_narration_volume(volume);
        self.narration.set_volume(volume);
    }

    pub fn jump_to_timeline(&self, step_id: &str) {
        self.hub.send(HubCommand::JumpToTimeline(step_id.to_string()));
    }

    pub fn find_similar_cases(&self) {
        self.hub.send(HubCommand::FindSimilarCases);
    }

    /// Hamming distance between the perceptual hashes of the original and
    /// the tampered image. `None` until both are available and decodable.
    pub async fn tamper_distance(&self) -> Option<u32> {
        let (original, tampered) = {
            let state = self.state.lock().await;
            (
                state.image_url()?.to_string(),
                state.result()?.tampered_image_url.clone(),
            )
        };

        let hashes = tokio::task::spawn_blocking(move || {
            let hash = |url: &str| {
                let (_, bytes) = decode_data_url(url).ok()?;
                compute_phash(&bytes).ok()
            };
            Some((hash(&original)?, hash(&tampered)?))
        })
        .await;

        match hashes {
            Ok(Some((lhs, rhs))) => hamming_distance(&lhs, &rhs),
            Ok(None) => None,
            Err(err) => {
                error!("Perceptual hash task failed: {err}");
                None
            }
        }
    }

    /// Start speaking now and follow the utterance in the background.
    fn narrate(&self, text: &str, volume: f32) -> Option<JoinHandle<()>> {
        match self.narration.start(text, volume) {
            Ok(playback) => Some(tokio::spawn(async move {
                if let Err(err) = playback.finished().await {
                    warn!("Narration failed: {err}");
                }
            })),
            Err(err) => {
                warn!("Narration failed: {err}");
                None
            }
        }
    }

    /// Carry out `effects` in order. Returns handles for work left running in
    /// the background.
    async fn perform(&self, effects: Vec<Effect>) -> Vec<JoinHandle<()>> {
        let mut background = Vec::new();
        for effect in effects {
            match effect {
                Effect::ClearSnapshot => self.snapshots.clear().await,
                Effect::StopNarration => self.narration.stop(),
                Effect::DeriveMetadata { token, file } => {
                    background.push(self.spawn_metadata(token, file));
                }
                Effect::PersistSnapshot { token, draft } => {
                    // Held across the write so a reset or upload cannot clear
                    // the slot before this save lands.
                    let mut state = self.state.lock().await;
                    if !state.is_current_result(token) {
                        debug!("Skipping snapshot of superseded analysis {token}");
                        continue;
                    }
                    self.snapshots.save(draft).await;
                    if let Some(stored) = self.snapshots.load().await {
                        state.record_upload_date(token, stored.upload_date);
                    }
                }
                Effect::Narrate {
                    token,
                    text,
                    volume,
                } => {
                    let state = self.state.lock().await;
                    if !state.is_current_result(token) {
                        debug!("Skipping narration of superseded analysis {token}");
                        continue;
                    }
                    background.extend(self.narrate(&text, volume));
                }
            }
        }
        background
    }

    fn spawn_metadata(&self, token: u64, file: ImageFile) -> JoinHandle<()> {
        let state = self.state.clone();
        tokio::spawn(async move {
            let metadata = match tokio::task::spawn_blocking(move || derive_metadata(&file)).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    error!("Metadata task failed: {err}");
                    return;
                }
            };
            if !state.lock().await.apply_metadata(token, metadata) {
                debug!("Discarding metadata for replaced upload {token}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::NarrationSettings,
        db::Database,
        hub::{ForensicsHub, ScrollTarget},
        imaging::{encode_data_url, phash::tests::png},
        models::{AiDetectionResult, BoundingBox, ChatRole, TamperAnalysis},
        narration::engine::fake::ScriptedSpeech,
        storage::{tests::BrokenStore, KeyValueStore},
    };
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex as StdMutex};
    use tokio::time::Instant;

    const TAMPERED: &str = "data:image/png;base64,VEFNUEVSRUQ=";

    fn area(x1: f64, description: &str) -> BoundingBox {
        BoundingBox {
            x1,
            y1: 0.1,
            x2: x1 + 0.1,
            y2: 0.3,
            description: description.into(),
        }
    }

    /// Scripted model: per-call delays and outcomes, with a call log.
    struct FakeModel {
        analysis_delay: Duration,
        synthesis_delay: Duration,
        analysis: TutorResult<TamperAnalysis>,
        synthesis: TutorResult<String>,
        chat: TutorResult<String>,
        prompts: StdMutex<Vec<String>>,
    }

    impl Default for FakeModel {
        fn default() -> Self {
            Self {
                analysis_delay: Duration::ZERO,
                synthesis_delay: Duration::ZERO,
                analysis: Ok(TamperAnalysis {
                    analysis_text: "T1".into(),
                    manipulated_areas: vec![area(0.1, "first"), area(0.5, "second")],
                    ai_detection: Some(AiDetectionResult {
                        is_ai_generated: false,
                        reasoning: "camera noise present".into(),
                    }),
                }),
                synthesis: Ok(TAMPERED.into()),
                chat: Ok("Look at the shadows.".into()),
                prompts: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ForensicsModel for FakeModel {
        async fn analyze_tampering(
            &self,
            _image: &ImageFile,
            prompt: &str,
        ) -> TutorResult<TamperAnalysis> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            tokio::time::sleep(self.analysis_delay).await;
            self.analysis.clone()
        }

        async fn synthesize_tampered_image(&self, _image: &ImageFile) -> TutorResult<String> {
            tokio::time::sleep(self.synthesis_delay).await;
            self.synthesis.clone()
        }

        async fn send_chat_turn(&self, _user_text: &str) -> TutorResult<String> {
            self.chat.clone()
        }
    }

    struct FakeEnhancer(TutorResult<String>);

    #[async_trait]
    impl Enhancer for FakeEnhancer {
        async fn enhance(&self, _image_url: &str) -> TutorResult<String> {
            self.0.clone()
        }
    }

    struct FakeFetcher(TutorResult<ImageFile>);

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str) -> TutorResult<ImageFile> {
            self.0.clone()
        }
    }

    /// In-memory store whose writes take a while to land.
    #[derive(Default)]
    struct SlowStore {
        write_delay: Duration,
        values: StdMutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
            tokio::time::sleep(self.write_delay).await;
            self.values.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct Harness {
        app: AppController,
        model: Arc<FakeModel>,
        speech: Arc<ScriptedSpeech>,
        snapshots: SnapshotStore,
        hub: ForensicsHub,
    }

    fn harness_with(model: FakeModel, enhancer: FakeEnhancer, snapshots: SnapshotStore) -> Harness {
        let speech = Arc::new(ScriptedSpeech::default());
        let narration = NarrationController::new(speech.clone(), &NarrationSettings::default());
        let (hub, signals) = ForensicsHub::new();
        let model = Arc::new(model);
        let backends = Backends {
            model: model.clone(),
            enhancer: Arc::new(enhancer),
            fetcher: Arc::new(FakeFetcher(Ok(photo()))),
        };
        let app = AppController::new(
            &AppConfig::default(),
            backends,
            narration,
            snapshots.clone(),
            signals,
        );
        Harness {
            app,
            model,
            speech,
            snapshots,
            hub,
        }
    }

    fn sqlite_snapshots() -> SnapshotStore {
        SnapshotStore::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn harness(model: FakeModel) -> Harness {
        harness_with(
            model,
            FakeEnhancer(Ok("data:image/png;base64,RU5I".into())),
            sqlite_snapshots(),
        )
    }

    fn photo() -> ImageFile {
        ImageFile::new("desk.png", "image/png", png(32, 32, |x, y| [(x * 8) as u8, (y * 4) as u8, 0]))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn analysis_merges_both_calls_and_persists_a_snapshot() {
        let h = harness(FakeModel::default());
        h.app.upload(photo()).await.await.unwrap();

        let result = h.app.analyze().await.unwrap().expect("current run");
        assert_eq!(result.analysis_text, "T1");
        assert_eq!(result.tampered_image_url, TAMPERED);
        let descriptions: Vec<_> = result
            .manipulated_areas
            .iter()
            .map(|a| a.description.as_str())
            .collect();
        assert_eq!(descriptions, ["first", "second"]);

        let view = h.app.view().await;
        assert!(!view.is_loading);
        assert!(view.error.is_none());
        assert_eq!(view.result.as_ref(), Some(&result));
        assert!(view.upload_date.is_some());
        assert_eq!(view.file_metadata.as_ref().unwrap().dimensions, "32x32");

        let stored = h.snapshots.load().await.expect("snapshot saved");
        assert_eq!(stored.analysis_result, result);
        assert_eq!(stored.original_image_url, photo().to_data_url());
        assert_eq!(Some(stored.upload_date), view.upload_date);
    }

    #[tokio::test]
    async fn analysis_uses_the_current_prompt() {
        let h = harness(FakeModel::default());
        assert_eq!(h.app.view().await.prompt, "Analyze this image for tampering");
        h.app.upload(photo()).await;
        h.app.set_prompt("Look for cloned regions").await;
        h.app.analyze().await.unwrap();
        assert_eq!(*h.model.prompts.lock().unwrap(), ["Look for cloned regions"]);
    }

    #[tokio::test]
    async fn completed_analysis_starts_narration() {
        let h = harness(FakeModel::default());
        h.app.upload(photo()).await;
        h.app.set_volume(0.4).await;
        h.app.analyze().await.unwrap();
        settle().await;

        let spoken = h.speech.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "T1");
        assert_eq!(spoken[0].volume, 0.4);
        assert_eq!(h.app.view().await.narration_state, NarrationState::Playing);

        h.speech.finish();
        settle().await;
        assert_eq!(h.app.view().await.narration_state, NarrationState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn both_calls_run_concurrently() {
        let h = harness(FakeModel {
            analysis_delay: Duration::from_secs(3),
            synthesis_delay: Duration::from_secs(3),
            ..Default::default()
        });
        h.app.upload(photo()).await.await.unwrap();

        let started = Instant::now();
        h.app.analyze().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn synthesis_failure_fails_the_whole_run() {
        let h = harness(FakeModel {
            synthesis: Err(TutorError::Generation("no image part returned".into())),
            ..Default::default()
        });
        h.app.upload(photo()).await;

        let err = h.app.analyze().await.unwrap_err();
        assert_eq!(err, TutorError::Generation("no image part returned".into()));

        let view = h.app.view().await;
        assert!(view.result.is_none());
        assert!(!view.is_loading);
        assert_eq!(
            view.error.as_deref(),
            Some("Analysis Failed: no image part returned")
        );
        assert!(h.snapshots.load().await.is_none());
        assert!(h.speech.spoken().is_empty());
    }

    #[tokio::test]
    async fn double_failure_reports_both_messages() {
        let h = harness(FakeModel {
            analysis: Err(TutorError::Decode("bad json".into())),
            synthesis: Err(TutorError::Generation("blocked".into())),
            ..Default::default()
        });
        h.app.upload(photo()).await;

        assert_eq!(
            h.app.analyze().await.unwrap_err(),
            TutorError::Decode("bad json".into())
        );
        let error = h.app.view().await.error.unwrap();
        assert!(error.starts_with("Analysis Failed: "));
        assert!(error.contains("bad json") && error.contains("blocked"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out() {
        let h = harness(FakeModel {
            synthesis_delay: Duration::from_secs(3_600),
            ..Default::default()
        });
        h.app.upload(photo()).await.await.unwrap();

        let err = h.app.analyze().await.unwrap_err();
        assert!(matches!(
            err,
            TutorError::Timeout {
                operation: "tampered image synthesis",
                seconds: 60
            }
        ));
        assert!(!h.app.view().await.is_loading);
    }

    #[tokio::test]
    async fn analyze_without_image_is_rejected() {
        let h = harness(FakeModel::default());
        assert!(matches!(
            h.app.analyze().await,
            Err(TutorError::Precondition(_))
        ));
        let view = h.app.view().await;
        assert_eq!(view.error.as_deref(), Some("Please upload an image first."));
        assert!(!view.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_analysis_drops_the_late_result() {
        let h = harness(FakeModel {
            analysis_delay: Duration::from_secs(5),
            synthesis_delay: Duration::from_secs(5),
            ..Default::default()
        });
        h.app.upload(photo()).await.await.unwrap();

        let run = tokio::spawn({
            let app = h.app.clone();
            async move { app.analyze().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.app.view().await.is_loading);

        h.app.reset().await;
        assert_eq!(run.await.unwrap(), Ok(None));

        let view = h.app.view().await;
        assert!(view.result.is_none() && view.image_url.is_none());
        assert!(!view.is_loading);
        assert!(h.snapshots.load().await.is_none());
        assert!(h.speech.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_snapshot_save_leaves_nothing_behind() {
        let slow = SnapshotStore::new(Arc::new(SlowStore {
            write_delay: Duration::from_secs(5),
            ..Default::default()
        }));
        let h = harness_with(FakeModel::default(), FakeEnhancer(Ok(String::new())), slow);
        h.app.upload(photo()).await.await.unwrap();

        let run = tokio::spawn({
            let app = h.app.clone();
            async move { app.analyze().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.app.reset().await;
        run.await.unwrap().unwrap();
        settle().await;

        assert!(h.snapshots.load().await.is_none());
        assert!(h.speech.spoken().is_empty());
        let view = h.app.view().await;
        assert!(view.result.is_none() && view.upload_date.is_none());
        assert_eq!(view.narration_state, NarrationState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_during_snapshot_save_leaves_the_slot_empty() {
        let slow = SnapshotStore::new(Arc::new(SlowStore {
            write_delay: Duration::from_secs(5),
            ..Default::default()
        }));
        let h = harness_with(FakeModel::default(), FakeEnhancer(Ok(String::new())), slow);
        h.app.upload(photo()).await.await.unwrap();

        let run = tokio::spawn({
            let app = h.app.clone();
            async move { app.analyze().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.app.upload(photo()).await.await.unwrap();
        run.await.unwrap().unwrap();
        settle().await;

        assert!(h.snapshots.load().await.is_none());
        assert!(h.speech.spoken().is_empty());
        assert!(h.app.view().await.result.is_none());
    }

    #[tokio::test]
    async fn reset_clears_state_snapshot_and_narration() {
        let h = harness(FakeModel::default());
        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();
        settle().await;

        h.app.reset().await;
        let view = h.app.view().await;
        assert!(!view.has_image_file);
        assert!(view.image_url.is_none() && view.file_metadata.is_none());
        assert!(view.result.is_none() && view.upload_date.is_none());
        assert!(view.error.is_none());
        assert_eq!(view.narration_state, NarrationState::Stopped);
        assert!(h.snapshots.load().await.is_none());
    }

    #[tokio::test]
    async fn new_upload_clears_the_previous_snapshot() {
        let h = harness(FakeModel::default());
        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();
        assert!(h.snapshots.load().await.is_some());

        h.app.upload(photo()).await;
        assert!(h.snapshots.load().await.is_none());
        assert!(h.app.view().await.result.is_none());
    }

    #[tokio::test]
    async fn restore_shows_the_stored_analysis() {
        let snapshots = sqlite_snapshots();
        let first = harness_with(
            FakeModel::default(),
            FakeEnhancer(Ok(String::new())),
            snapshots.clone(),
        );
        first.app.upload(photo()).await.await.unwrap();
        first.app.analyze().await.unwrap();

        let second = harness_with(
            FakeModel::default(),
            FakeEnhancer(Ok(String::new())),
            snapshots,
        );
        assert!(second.app.restore().await);

        let view = second.app.view().await;
        assert!(!view.has_image_file);
        assert_eq!(view.result.unwrap().analysis_text, "T1");
        assert_eq!(view.image_url, Some(photo().to_data_url()));
        assert!(view.upload_date.is_some());
    }

    #[tokio::test]
    async fn broken_storage_never_interrupts_analysis() {
        let h = harness_with(
            FakeModel::default(),
            FakeEnhancer(Ok(String::new())),
            SnapshotStore::new(Arc::new(BrokenStore)),
        );
        assert!(!h.app.restore().await);
        h.app.upload(photo()).await;

        let result = h.app.analyze().await.unwrap();
        assert!(result.is_some());
        let view = h.app.view().await;
        assert!(view.error.is_none());
        assert!(view.upload_date.is_none());
    }

    #[tokio::test]
    async fn enhancement_replaces_the_tampered_image() {
        let h = harness(FakeModel::default());
        assert!(matches!(
            h.app.enhance().await,
            Err(TutorError::Precondition(_))
        ));

        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();
        let before = h.app.view().await;

        h.app.enhance().await.unwrap();
        let after = h.app.view().await;
        let result = after.result.unwrap();
        assert_eq!(result.tampered_image_url, "data:image/png;base64,RU5I");
        assert_eq!(result.analysis_text, "T1");
        assert_eq!(after.result_id, before.result_id);
        assert!(!after.is_enhancing);
    }

    #[tokio::test]
    async fn enhancement_failure_keeps_the_result() {
        let h = harness_with(
            FakeModel::default(),
            FakeEnhancer(Err(TutorError::Backend("offline".into()))),
            sqlite_snapshots(),
        );
        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();

        let err = h.app.enhance().await.unwrap_err();
        assert!(matches!(err, TutorError::Enhancement(_)));

        let view = h.app.view().await;
        assert_eq!(view.result.unwrap().tampered_image_url, TAMPERED);
        assert_eq!(view.error.as_deref(), Some("Image enhancement failed."));
        assert!(!view.is_enhancing);
    }

    #[tokio::test]
    async fn chat_failure_appends_an_apology() {
        let h = harness(FakeModel {
            chat: Err(TutorError::Backend("503".into())),
            ..Default::default()
        });

        assert_eq!(h.app.send_chat("   ").await, None);
        let reply = h.app.send_chat("Why JPEG ghosts?").await;
        assert_eq!(reply.as_deref(), Some(CHAT_APOLOGY));

        let view = h.app.view().await;
        let roles: Vec<_> = view.chat_messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [ChatRole::Model, ChatRole::User, ChatRole::Model]);
        assert_eq!(view.chat_messages[1].content, "Why JPEG ghosts?");
        assert!(!view.chat_loading);
    }

    #[tokio::test]
    async fn chat_success_appends_the_reply() {
        let h = harness(FakeModel::default());
        h.app.send_chat("hello").await;
        let view = h.app.view().await;
        assert_eq!(view.chat_messages.last().unwrap().content, "Look at the shadows.");
    }

    #[tokio::test]
    async fn example_selection_uploads_the_fetched_image() {
        let h = harness(FakeModel::default());
        h.app
            .select_example("https://example.test/desk.png")
            .await
            .unwrap()
            .await
            .unwrap();
        let view = h.app.view().await;
        assert!(view.has_image_file);
        assert_eq!(view.file_metadata.unwrap().name, "desk.png");
    }

    #[tokio::test]
    async fn failed_example_fetch_sets_an_error() {
        let speech = Arc::new(ScriptedSpeech::default());
        let (_hub, signals) = ForensicsHub::new();
        let app = AppController::new(
            &AppConfig::default(),
            Backends {
                model: Arc::new(FakeModel::default()),
                enhancer: Arc::new(FakeEnhancer(Ok(String::new()))),
                fetcher: Arc::new(FakeFetcher(Err(TutorError::Fetch("HTTP 404".into())))),
            },
            NarrationController::new(speech, &NarrationSettings::default()),
            sqlite_snapshots(),
            signals,
        );

        let err = app.select_example("https://example.test/x.jpg").await.unwrap_err();
        assert_eq!(err, TutorError::Fetch("HTTP 404".into()));
        let view = app.view().await;
        assert!(view.error.unwrap().contains("upload an image manually"));
        assert!(!view.has_image_file);
    }

    struct HangingFetcher;

    #[async_trait]
    impl ImageFetcher for HangingFetcher {
        async fn fetch(&self, _url: &str) -> TutorResult<ImageFile> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_example_fetch_reports_the_configured_deadline() {
        let speech = Arc::new(ScriptedSpeech::default());
        let (_hub, signals) = ForensicsHub::new();
        let app = AppController::new(
            &AppConfig::default(),
            Backends {
                model: Arc::new(FakeModel::default()),
                enhancer: Arc::new(FakeEnhancer(Ok(String::new()))),
                fetcher: Arc::new(HangingFetcher),
            },
            NarrationController::new(speech, &NarrationSettings::default()),
            sqlite_snapshots(),
            signals,
        );

        let err = app.select_example("https://example.test/x.jpg").await.unwrap_err();
        assert_eq!(err.to_string(), "example image fetch timed out after 60s");
        assert!(app.view().await.error.is_some());
    }

    #[tokio::test]
    async fn narration_toggle_cycles_play_pause_resume() {
        let h = harness(FakeModel::default());
        assert!(h.app.toggle_narration().await.is_none());

        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();
        settle().await;
        h.app.stop_narration();
        settle().await;
        assert_eq!(h.app.view().await.narration_state, NarrationState::Stopped);

        let playback = h.app.toggle_narration().await.expect("speaks the result");
        settle().await;
        assert_eq!(h.app.view().await.narration_state, NarrationState::Playing);
        h.app.toggle_narration().await;
        assert_eq!(h.app.view().await.narration_state, NarrationState::Paused);
        h.app.toggle_narration().await;
        assert_eq!(h.app.view().await.narration_state, NarrationState::Playing);

        h.speech.finish();
        playback.await.unwrap();
        assert_eq!(h.app.view().await.narration_state, NarrationState::Stopped);
    }

    #[tokio::test]
    async fn hub_signals_reach_the_hub() {
        let mut h = harness(FakeModel::default());
        h.app.jump_to_timeline("analysis");
        h.app.jump_to_timeline("analysis");
        h.app.find_similar_cases();

        assert_eq!(
            h.hub.pump(),
            [
                ScrollTarget::TimelineStep(2),
                ScrollTarget::TimelineStep(2),
                ScrollTarget::CaseLibrary
            ]
        );
        assert_eq!(h.hub.timeline.expanded(), Some("analysis"));
    }

    #[tokio::test]
    async fn tamper_distance_compares_original_and_tampered_images() {
        let tampered = png(32, 32, |x, y| [(x * 8) as u8, (y * 4) as u8, 0]);
        let h = harness(FakeModel {
            synthesis: Ok(encode_data_url("image/png", &tampered)),
            ..Default::default()
        });
        assert_eq!(h.app.tamper_distance().await, None);

        h.app.upload(photo()).await;
        h.app.analyze().await.unwrap();
        assert_eq!(h.app.tamper_distance().await, Some(0));
    }
}
