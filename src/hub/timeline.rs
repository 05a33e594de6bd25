use super::data::{timeline_index, TIMELINE_STEPS};

/// Expansion state of the workflow timeline: at most one step open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineView {
    expanded: Option<&'static str>,
}

impl TimelineView {
    pub fn expanded(&self) -> Option<&'static str> {
        self.expanded
    }

    /// Open `step_id`, or close it if it is already the open step.
    pub fn toggle(&mut self, step_id: &str) {
        let Some(index) = timeline_index(step_id) else {
            return;
        };
        let id = TIMELINE_STEPS[index].id;
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }

    /// Force `step_id` open regardless of current state; returns its index
    /// for scrolling.
    pub fn force_open(&mut self, step_id: &str) -> Option<usize> {
        let index = timeline_index(step_id)?;
        self.expanded = Some(TIMELINE_STEPS[index].id);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_keeps_a_single_step_open() {
        let mut view = TimelineView::default();
        view.toggle("collection");
        assert_eq!(view.expanded(), Some("collection"));
        view.toggle("analysis");
        assert_eq!(view.expanded(), Some("analysis"));
        view.toggle("analysis");
        assert_eq!(view.expanded(), None);
    }

    #[test]
    fn force_open_does_not_toggle_closed() {
        let mut view = TimelineView::default();
        assert_eq!(view.force_open("analysis"), Some(2));
        assert_eq!(view.force_open("analysis"), Some(2));
        assert_eq!(view.expanded(), Some("analysis"));
    }

    #[test]
    fn unknown_steps_are_ignored() {
        let mut view = TimelineView::default();
        view.toggle("collection");
        view.toggle("triage");
        assert_eq!(view.force_open("triage"), None);
        assert_eq!(view.expanded(), Some("collection"));
    }
}
