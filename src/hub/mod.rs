//! Client-side state of the result panel and the forensics hub (workflow
//! timeline and case library). Nothing here performs I/O.

use log::{debug, warn};
use tokio::sync::mpsc;

pub mod cases;
pub mod data;
pub mod result_view;
pub mod reveal;
pub mod timeline;

pub use cases::{CaseLibrary, TypeFilter, SIMILAR_CASES_TERM};
pub use result_view::{ResultTab, ResultView};
pub use reveal::StaggeredReveal;
pub use timeline::TimelineView;

/// One-shot requests from the result panel to the hub. Each command is
/// consumed exactly once, so repeating a jump to the same step re-applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCommand {
    JumpToTimeline(String),
    FindSimilarCases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    TimelineStep(usize),
    CaseLibrary,
}

/// Sending half handed to the application controller.
#[derive(Debug, Clone)]
pub struct HubSignals {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubSignals {
    pub fn send(&self, command: HubCommand) {
        if self.tx.send(command).is_err() {
            warn!("Forensics hub is gone; dropping signal");
        }
    }
}

pub struct ForensicsHub {
    pub timeline: TimelineView,
    pub cases: CaseLibrary,
    commands: mpsc::UnboundedReceiver<HubCommand>,
}

impl ForensicsHub {
    pub fn new() -> (Self, HubSignals) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            timeline: TimelineView::default(),
            cases: CaseLibrary::default(),
            commands: rx,
        };
        (hub, HubSignals { tx })
    }

    pub fn apply(&mut self, command: HubCommand) -> Option<ScrollTarget> {
        debug!("Hub command {command:?}");
        match command {
            HubCommand::JumpToTimeline(step_id) => self
                .timeline
                .force_open(&step_id)
                .map(ScrollTarget::TimelineStep),
            HubCommand::FindSimilarCases => {
                self.cases.show_similar();
                Some(ScrollTarget::CaseLibrary)
            }
        }
    }

    /// Apply every pending command, returning where to scroll for each.
    pub fn pump(&mut self) -> Vec<ScrollTarget> {
        let mut targets = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            if let Some(target) = self.apply(command) {
                targets.push(target);
            }
        }
        targets
    }
}
