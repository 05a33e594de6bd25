use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use super::engine::{SpeechCompletion, SpeechEngine, Utterance};
use super::state::{NarrationEvent, NarrationState};
use crate::config::NarrationSettings;
use crate::error::{TutorError, TutorResult};

struct NarrationInner {
    state: NarrationState,
    /// Sequence number of the utterance that owns `state`.
    active: Option<u64>,
    next_id: u64,
}

/// Play/pause/resume/stop over a single active utterance.
#[derive(Clone)]
pub struct NarrationController {
    engine: Arc<dyn SpeechEngine>,
    inner: Arc<Mutex<NarrationInner>>,
    language: String,
    rate: f32,
}

impl NarrationController {
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: &NarrationSettings) -> Self {
        Self {
            engine,
            inner: Arc::new(Mutex::new(NarrationInner {
                state: NarrationState::Stopped,
                active: None,
                next_id: 0,
            })),
            language: settings.language.clone(),
            rate: settings.rate,
        }
    }

    fn lock(&self) -> MutexGuard<'_, NarrationInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn state(&self) -> NarrationState {
        self.lock().state
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    /// Cancel whatever is playing, then speak `text`. Resolves when the
    /// utterance ends; a later `speak` or `stop` ends it early without error.
    pub async fn speak(&self, text: &str, volume: f32) -> TutorResult<()> {
        self.start(text, volume)?.finished().await
    }

    /// Begin speaking `text` without waiting for it. The utterance is active
    /// by the time this returns, so a following `stop` always cuts it off.
    pub fn start(&self, text: &str, volume: f32) -> TutorResult<Playback> {
        if !self.engine.is_supported() {
            return Err(TutorError::UnsupportedCapability);
        }

        let utterance = Utterance {
            text: text.to_string(),
            language: self.language.clone(),
            rate: self.rate,
            volume: volume.clamp(0.0, 1.0),
        };

        let mut inner = self.lock();
        self.engine.cancel();
        inner.next_id += 1;
        let id = inner.next_id;
        let completion = match self.engine.speak(utterance) {
            Ok(completion) => completion,
            Err(err) => {
                inner.state = NarrationState::Stopped;
                inner.active = None;
                return Err(err);
            }
        };
        inner.state = inner.state.next(NarrationEvent::Speak);
        inner.active = Some(id);
        drop(inner);

        debug!("Narration {id} started ({} chars)", text.len());
        Ok(Playback {
            id,
            completion,
            owner: self.clone(),
        })
    }

    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state == NarrationState::Playing {
            self.engine.pause();
            inner.state = inner.state.next(NarrationEvent::Pause);
        }
    }

    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.state == NarrationState::Paused {
            self.engine.resume();
            inner.state = inner.state.next(NarrationEvent::Resume);
        }
    }

    pub fn stop(&self) {
        let mut inner = self.lock();
        self.engine.cancel();
        if inner.active.take().is_some() {
            info!("Narration stopped");
        }
        inner.state = inner.state.next(NarrationEvent::Stop);
    }

    /// Adjust the active utterance only; the next `speak` brings its own.
    pub fn set_volume(&self, volume: f32) {
        let inner = self.lock();
        if inner.active.is_some() {
            self.engine.set_volume(volume.clamp(0.0, 1.0));
        }
    }
}

/// An utterance that has started. Await [`Playback::finished`] to learn how
/// it ended; dropping it leaves the utterance playing.
pub struct Playback {
    id: u64,
    completion: SpeechCompletion,
    owner: NarrationController,
}

impl Playback {
    pub async fn finished(self) -> TutorResult<()> {
        let Playback {
            id,
            completion,
            owner,
        } = self;
        let outcome = completion
            .await
            .unwrap_or_else(|_| Err(TutorError::Playback("speech engine went away".into())));

        let mut inner = owner.lock();
        if inner.active == Some(id) {
            inner.active = None;
            inner.state = NarrationState::Stopped;
        }
        drop(inner);

        let end = outcome?;
        debug!("Narration {id} ended: {end:?}");
        Ok(())
    }
}
