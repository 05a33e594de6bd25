pub mod controller;
pub mod engine;
#[cfg(feature = "speaker")]
pub mod speaker;
pub mod state;

pub use controller::{NarrationController, Playback};
pub use engine::{NoSpeech, SpeechEnd, SpeechEngine, Utterance};
#[cfg(feature = "speaker")]
pub use speaker::SpeakerEngine;
pub use state::NarrationState;
