use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::reveal::StaggeredReveal;
use crate::config::PresentationSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResultTab {
    #[default]
    TamperingAnalysis,
    AiDetection,
    Metadata,
}

/// Client-only state of the result panel.
#[derive(Debug, Clone)]
pub struct ResultView {
    tab: ResultTab,
    reveal: StaggeredReveal,
}

impl ResultView {
    pub fn new(settings: &PresentationSettings) -> Self {
        Self {
            tab: ResultTab::default(),
            reveal: StaggeredReveal::new(settings.reveal_base(), settings.reveal_stride()),
        }
    }

    pub fn tab(&self) -> ResultTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: ResultTab) {
        self.tab = tab;
    }

    /// Called on every render with the identity and area count of the
    /// displayed result.
    pub fn render(&mut self, result_id: Option<u64>, area_count: usize, now: Instant) -> Vec<usize> {
        self.reveal.sync(result_id, area_count, now);
        self.reveal.visible(now)
    }

    pub fn next_reveal(&self, now: Instant) -> Option<Instant> {
        self.reveal.next_deadline(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tabs_switch_without_touching_anything_else() {
        let mut view = ResultView::new(&PresentationSettings::default());
        assert_eq!(view.tab(), ResultTab::TamperingAnalysis);
        view.select_tab(ResultTab::Metadata);
        view.select_tab(ResultTab::AiDetection);
        assert_eq!(view.tab(), ResultTab::AiDetection);
    }

    #[test]
    fn tab_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ResultTab::TamperingAnalysis).unwrap(),
            "\"tampering-analysis\""
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rerender_of_same_result_keeps_revealed_boxes() {
        let mut view = ResultView::new(&PresentationSettings::default());
        assert!(view.render(Some(3), 2, Instant::now()).is_empty());
        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(view.render(Some(3), 2, Instant::now()), [0, 1]);

        view.select_tab(ResultTab::Metadata);
        assert_eq!(view.render(Some(3), 2, Instant::now()), [0, 1]);

        assert!(view.render(Some(4), 1, Instant::now()).is_empty());
        assert!(view.next_reveal(Instant::now()).is_some());
    }
}
