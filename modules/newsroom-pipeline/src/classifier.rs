//! Channel assignment. Priority order, first match wins; every item gets
//! exactly one category.

use newsroom_common::config::ClassifierConfig;
use newsroom_common::{Category, NewsItem};

use crate::keywords::any_term;

/// Classify an item by its title plus source label.
///
/// Sports outranks everything. Macro requires a macro term AND the absence
/// of politics/celebrity terms — political and royal coverage is full of
/// incidental economic vocabulary ("minister", "budget") that would
/// otherwise flood the macro channel. Everything else is breaking.
pub fn classify(item: &NewsItem, config: &ClassifierConfig) -> Category {
    let text = item.search_text();

    if any_term(&text, &config.sports) {
        return Category::Sports;
    }

    if any_term(&text, &config.macro_terms)
        && !any_term(&text, &config.politics)
        && !any_term(&text, &config.celebrity)
    {
        return Category::Macro;
    }

    Category::Breaking
}
