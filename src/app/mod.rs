//! Application controller: owns the cross-cutting state and sequences
//! upload, analysis, enhancement, reset, chat and narration.

mod controller;
mod state;

pub use controller::{AppController, Backends};
pub use state::{
    AnalysisTicket, AppState, AppView, Effect, EnhancementTicket, ENHANCEMENT_FAILED_MESSAGE, FETCH_FAILED_MESSAGE, NO_IMAGE_MESSAGE,
};
