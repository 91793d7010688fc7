//! Outbound message formatting: header, shouted title, source, hashtags.

use newsroom_common::{Category, NewsItem};

fn header(category: Category) -> &'static str {
    match category {
        Category::Breaking => "🇬🇧 BREAKING",
        Category::Macro => "📊 MACRO",
        Category::Sports => "⚽ SPORTS",
    }
}

fn hashtag(category: Category) -> &'static str {
    match category {
        Category::Breaking => "#Breaking",
        Category::Macro => "#Macro",
        Category::Sports => "#Sports",
    }
}

/// Build the delivery text for an accepted item.
pub fn build_message(item: &NewsItem, category: Category) -> String {
    let title = item.title.trim().to_uppercase();
    let source = if item.source.trim().is_empty() {
        "Unknown"
    } else {
        item.source.trim()
    };

    format!(
        "{}\n\n{}\n\nSource: {}\n\n{} #UK",
        header(category),
        title,
        source,
        hashtag(category),
    )
}
