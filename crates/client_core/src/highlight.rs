use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::criteria::SearchCriteria;

/// The most recent item search term, kept for presentation-only emphasis.
///
/// The term is matched as a literal, case-insensitive substring; regex
/// metacharacters typed by the user carry no pattern meaning.
#[derive(Debug, Clone, Default)]
pub struct HighlightTerm {
    term: Option<String>,
    matcher: Option<Regex>,
}

impl HighlightTerm {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(term: impl Into<String>) -> Self {
        let term = term.into().trim().to_string();
        if term.is_empty() {
            return Self::none();
        }

        let matcher = match RegexBuilder::new(&regex::escape(&term))
            .case_insensitive(true)
            .build()
        {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                warn!(term = %term, error = %err, "highlight term rejected");
                None
            }
        };
        Self {
            term: Some(term),
            matcher,
        }
    }

    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        criteria.item_term().map(Self::new).unwrap_or_default()
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(name))
    }
}

impl PartialEq for HighlightTerm {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}
