//! Keyword matching shared by the classifier and the impact scorer.
//!
//! Terms are lowercase strings from config. Multi-word phrases match as
//! substrings; single tokens match whole words only, so "mp" hits "MP quits"
//! but not "campaign". Haystacks are expected pre-lowercased
//! (`NewsItem::search_text`).

/// True if `term` occurs in `text`.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if term.contains(' ') {
        text.contains(term)
    } else {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|token| token == term)
    }
}

/// True if any of `terms` occurs in `text`.
pub fn any_term(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| contains_term(text, t))
}

/// Number of `terms` that occur in `text`.
pub fn count_terms(text: &str, terms: &[String]) -> usize {
    terms.iter().filter(|t| contains_term(text, t)).count()
}
