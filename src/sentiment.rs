use std::fmt;

pub const POSITIVE_KEYWORDS: &[&str] = &[
    "growth",
    "upward",
    "bullish",
    "surge",
    "rally",
    "record high",
    "advancing",
    "gains",
    "profit",
    "outperform",
];

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "ban",
    "hack",
    "crash",
    "plunge",
    "downward",
    "bearish",
    "losses",
    "decline",
    "sell-off",
    "underperform",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "Buy"),
            Decision::Sell => write!(f, "Sell"),
            Decision::Hold => write!(f, "Hold"),
        }
    }
}

/// Map free text to a trading decision by keyword presence.
/// Positive keywords are checked before negative ones.
pub fn classify(text: &str) -> Decision {
    let lower = text.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Decision::Buy
    } else if NEGATIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Decision::Sell
    } else {
        Decision::Hold
    }
}
