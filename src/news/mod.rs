pub mod cryptocompare;
pub mod cryptopanic;
pub mod newsapi;

use chrono::{DateTime, Utc};

/// A headline fetched from one of the news providers
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

impl NewsItem {
    /// Build an item stamped with the current time.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_at: Utc::now(),
        }
    }
}

/// Case-insensitive substring match on the title.
pub fn title_matches(title: &str, ticker: &str) -> bool {
    title.to_uppercase().contains(&ticker.to_uppercase())
}

/// Keep only items whose title mentions `ticker`. `None` keeps everything.
pub fn filter_by_ticker(items: Vec<NewsItem>, ticker: Option<&str>) -> Vec<NewsItem> {
    match ticker {
        Some(t) if !t.is_empty() => items
            .into_iter()
            .filter(|item| title_matches(&item.title, t))
            .collect(),
        _ => items,
    }
}

/// Render a digest as a header followed by one title/url block per item.
pub fn format_digest(header: &str, items: &[NewsItem]) -> String {
    let mut out = format!("{}\n", header);
    for item in items {
        out.push_str(&format!("{}\n{}\n\n", item.title, item.url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(titles: &[&str]) -> Vec<NewsItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| NewsItem::new(*t, format!("https://example.com/{}", i)))
            .collect()
    }

    #[test]
    fn test_filter_case_insensitive() {
        let filtered = filter_by_ticker(
            items(&["BTC rally", "ETH news", "Doge update"]),
            Some("btc"),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "BTC rally");
    }

    #[test]
    fn test_filter_none_keeps_all() {
        let all = items(&["BTC rally", "ETH news"]);
        assert_eq!(filter_by_ticker(all.clone(), None), all);
        assert_eq!(filter_by_ticker(all.clone(), Some("")), all);
    }

    #[test]
    fn test_filter_no_match() {
        assert!(filter_by_ticker(items(&["ETH news"]), Some("SOL")).is_empty());
    }

    #[test]
    fn test_format_digest() {
        let out = format_digest("Latest Crypto News:", &items(&["A", "B"]));
        assert_eq!(
            out,
            "Latest Crypto News:\nA\nhttps://example.com/0\n\nB\nhttps://example.com/1\n\n"
        );
    }

    #[test]
    fn test_format_empty_digest() {
        assert_eq!(format_digest("Latest Market News:", &[]), "Latest Market News:\n");
    }
}
