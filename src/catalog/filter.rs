use crate::api::CatalogEntry;

/// The user's current filter intent.
///
/// Lives in the preference store but is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub selected_category: Option<String>,
}

impl FilterState {
    pub fn new(search_term: impl Into<String>, selected_category: Option<&str>) -> Self {
        Self {
            search_term: search_term.into(),
            selected_category: selected_category.map(str::to_owned),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty() || self.selected_category.is_some()
    }
}

/// Entries whose name contains `term`, ignoring case, in source order.
///
/// An empty term keeps every entry.
pub fn filter_entries<'a>(entries: &'a [CatalogEntry], term: &str) -> Vec<&'a CatalogEntry> {
    if term.is_empty() {
        return entries.iter().collect();
    }
    let needle = term.to_lowercase();
    entries
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn entries(names: &[&str]) -> Vec<CatalogEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| CatalogEntry::new(*n, format!("https://pokeapi.co/api/v2/pokemon/{}/", i + 1)))
            .collect()
    }

    fn names<'a>(filtered: &[&'a CatalogEntry]) -> Vec<&'a str> {
        filtered.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_case_insensitive_substring_keeps_order() {
        let all = entries(&["a", "b", "c", "aron"]);
        assert_eq!(names(&filter_entries(&all, "A")), vec!["a", "aron"]);
        assert_eq!(names(&filter_entries(&all, "ro")), vec!["aron"]);
    }

    #[test]
    fn test_empty_term_keeps_everything() {
        let all = entries(&["pidgey", "rattata"]);
        assert_eq!(filter_entries(&all, "").len(), 2);
    }

    #[test]
    fn test_no_match_is_empty() {
        let all = entries(&["charmander", "vulpix"]);
        assert!(filter_entries(&all, "z").is_empty());
    }

    #[test]
    fn test_filter_state_activity() {
        assert!(!FilterState::default().is_active());
        assert!(FilterState::new("pi", None).is_active());
        assert!(FilterState::new("", Some("fire")).is_active());
    }

    proptest! {
        #[test]
        fn prop_results_contain_term(
            list in proptest::collection::vec("[a-zA-Z]{1,8}", 0..40),
            term in "[a-zA-Z]{0,3}",
        ) {
            let all: Vec<_> = list.iter().map(|n| CatalogEntry::new(n.clone(), "u")).collect();
            let needle = term.to_lowercase();
            for entry in filter_entries(&all, &term) {
                prop_assert!(entry.name.to_lowercase().contains(&needle));
            }
        }

        #[test]
        fn prop_results_are_ordered_subsequence(
            list in proptest::collection::vec("[a-c]{1,4}", 0..40),
            term in "[a-c]{0,2}",
        ) {
            let all: Vec<_> = list.iter().map(|n| CatalogEntry::new(n.clone(), "u")).collect();
            let filtered = filter_entries(&all, &term);
            let mut source = all.iter();
            for entry in filtered {
                prop_assert!(source.any(|e| std::ptr::eq(e, entry)));
            }
        }
    }
}
