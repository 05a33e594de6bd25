use tokio::sync::oneshot;

use crate::error::{TutorError, TutorResult};

/// One request to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
    pub volume: f32,
}

/// How an utterance ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEnd {
    Finished,
    Cancelled,
}

pub type SpeechCompletion = oneshot::Receiver<TutorResult<SpeechEnd>>;

/// A host speech capability. Pause, resume, cancel and volume only ever act
/// on the utterance currently playing.
pub trait SpeechEngine: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Begin speaking; the receiver resolves when the utterance ends.
    fn speak(&self, utterance: Utterance) -> TutorResult<SpeechCompletion>;

    fn pause(&self);
    fn resume(&self);
    fn cancel(&self);
    fn set_volume(&self, volume: f32);
}

/// Host without any speech capability.
pub struct NoSpeech;

impl SpeechEngine for NoSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: Utterance) -> TutorResult<SpeechCompletion> {
        Err(TutorError::UnsupportedCapability)
    }

    fn pause(&self) {}
    fn resume(&self) {}
    fn cancel(&self) {}
    fn set_volume(&self, _volume: f32) {}
}
