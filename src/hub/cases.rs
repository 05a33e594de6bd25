use super::data::{find_case, Case, IncidentType, CASES};

/// Term applied by the "find similar cases" signal.
pub const SIMILAR_CASES_TERM: &str = "tampering";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(IncidentType),
}

impl TypeFilter {
    pub fn label(self) -> &'static str {
        match self {
            TypeFilter::All => "All",
            TypeFilter::Only(kind) => kind.label(),
        }
    }

    fn admits(self, kind: IncidentType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => wanted == kind,
        }
    }
}

/// `All` followed by each incident type in data order, without repeats.
pub fn type_filter_options() -> Vec<TypeFilter> {
    let mut options = vec![TypeFilter::All];
    for case in CASES.iter() {
        let option = TypeFilter::Only(case.incident_type);
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}

fn matches_term(case: &Case, needle: &str) -> bool {
    case.title.to_lowercase().contains(needle)
        || case.summary.to_lowercase().contains(needle)
        || case.tools.iter().any(|tool| tool.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseLibrary {
    search_term: String,
    filter: TypeFilter,
    selected: Option<&'static str>,
}

impl CaseLibrary {
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter(&self) -> TypeFilter {
        self.filter
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.filter = filter;
    }

    /// Substring match on title, summary or any tool, ignoring case, and an
    /// exact incident-type match.
    pub fn filtered(&self) -> Vec<&'static Case> {
        let needle = self.search_term.trim().to_lowercase();
        CASES
            .iter()
            .filter(|case| self.filter.admits(case.incident_type))
            .filter(|case| needle.is_empty() || matches_term(case, &needle))
            .collect()
    }

    pub fn show_similar(&mut self) {
        self.search_term = SIMILAR_CASES_TERM.to_string();
        self.filter = TypeFilter::All;
    }

    pub fn select(&mut self, case_id: &str) -> Option<&'static Case> {
        let case = find_case(case_id)?;
        self.selected = Some(case.id);
        Some(case)
    }

    pub fn close_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&'static Case> {
        self.selected.and_then(find_case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(cases: Vec<&'static Case>) -> Vec<&'static str> {
        cases.into_iter().map(|c| c.id).collect()
    }

    #[test]
    fn all_with_empty_term_returns_everything() {
        let library = CaseLibrary::default();
        assert_eq!(library.filtered().len(), CASES.len());

        let mut blank = CaseLibrary::default();
        blank.set_search_term("   ");
        assert_eq!(blank.filtered().len(), CASES.len());
    }

    #[test]
    fn search_is_case_insensitive_over_title_summary_and_tools() {
        let mut library = CaseLibrary::default();

        library.set_search_term("FINCORP");
        assert_eq!(ids(library.filtered()), ["case-1"]);

        library.set_search_term("battery drain");
        assert_eq!(ids(library.filtered()), ["case-3"]);

        library.set_search_term("regripper");
        assert_eq!(ids(library.filtered()), ["case-2"]);

        library.set_search_term("wireshark");
        assert_eq!(ids(library.filtered()), ["case-1", "case-3", "case-4"]);
    }

    #[test]
    fn type_filter_is_exact_and_combines_with_search() {
        let mut library = CaseLibrary::default();
        library.set_filter(TypeFilter::Only(IncidentType::Malware));
        assert_eq!(ids(library.filtered()), ["case-4"]);

        library.set_search_term("wireshark");
        assert_eq!(ids(library.filtered()), ["case-4"]);

        library.set_filter(TypeFilter::Only(IncidentType::DataBreach));
        assert!(library.filtered().is_empty());
    }

    #[test]
    fn non_matching_term_is_empty_for_every_type() {
        let mut library = CaseLibrary::default();
        library.set_search_term("zebra crossing");
        for option in type_filter_options() {
            library.set_filter(option);
            assert!(library.filtered().is_empty(), "{}", option.label());
        }
    }

    #[test]
    fn options_start_with_all_and_follow_data_order() {
        let labels: Vec<_> = type_filter_options().into_iter().map(TypeFilter::label).collect();
        assert_eq!(
            labels,
            ["All", "Phishing", "Insider Threat", "Mobile Device", "Malware"]
        );
    }

    #[test]
    fn show_similar_resets_the_type_filter() {
        let mut library = CaseLibrary::default();
        library.set_filter(TypeFilter::Only(IncidentType::Phishing));
        library.set_search_term("x");
        library.show_similar();
        assert_eq!(library.search_term(), SIMILAR_CASES_TERM);
        assert_eq!(library.filter(), TypeFilter::All);
    }

    #[test]
    fn selection_opens_and_closes() {
        let mut library = CaseLibrary::default();
        assert!(library.select("case-404").is_none());
        assert_eq!(library.select("case-2").map(|c| c.title), Some("Insider Data Theft at TechSolutions"));
        assert_eq!(library.selected().map(|c| c.id), Some("case-2"));
        library.close_selection();
        assert!(library.selected().is_none());
    }
}
