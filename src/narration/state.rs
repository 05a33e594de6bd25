use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NarrationState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationEvent {
    Speak,
    Pause,
    Resume,
    Stop,
    Finished,
}

impl NarrationState {
    /// The only legal edges; every other event leaves the state unchanged.
    pub fn next(self, event: NarrationEvent) -> Self {
        use NarrationEvent::*;
        use NarrationState::*;

        match (self, event) {
            (_, Speak) => Playing,
            (Playing, Pause) => Paused,
            (Paused, Resume) => Playing,
            (Playing | Paused, Stop) => Stopped,
            (Playing, Finished) => Stopped,
            (state, _) => state,
        }
    }
}
