//! Ticker symbol helpers.

use indexmap::IndexSet;

/// A ticker made only of letters, as kept in the investable universe.
///
/// Class-share and preferred tickers (`BRK.B`, `BF-B`) fail this check.
pub fn is_alphabetic_ticker(ticker: &str) -> bool {
    !ticker.is_empty() && ticker.chars().all(|c| c.is_ascii_alphabetic())
}

/// Normalize a ticker: trimmed, uppercase.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Parse a comma-separated ticker list, dropping blanks and duplicates.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_ticker)
        .filter(|t| !t.is_empty())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
