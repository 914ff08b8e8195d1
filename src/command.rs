/// A parsed chat message: a known verb with its optional argument, or a free-text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PanicNews(Option<String>),
    CompareNews(Option<String>),
    News(Option<String>),
    Analyze(Option<String>),
    Help,
    Prompt(String),
}

pub const HELP_TEXT: &str = "Commands:\n\
    /panic-news [ticker] - CryptoPanic headlines (saved locally)\n\
    /compare-news [ticker] - CryptoCompare market news\n\
    /news [topic] - latest article with sentiment analysis\n\
    /analyze [topic] - same as /news\n\n\
    Anything else is answered by the AI model.";

/// Split text into the first whitespace-delimited token and the trimmed remainder.
pub fn split_verb(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => {
            let arg = trimmed[idx..].trim();
            (&trimmed[..idx], (!arg.is_empty()).then_some(arg))
        }
        None => (trimmed.trim_end(), None),
    }
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let (verb, arg) = split_verb(text);
        // "/news@SomeBot" addresses this bot in group chats
        let verb = match verb.split_once('@') {
            Some((bare, _)) if bare.starts_with('/') => bare,
            _ => verb,
        };
        let arg = arg.map(str::to_string);

        match verb {
            "/panic-news" => Command::PanicNews(arg),
            "/compare-news" => Command::CompareNews(arg),
            "/news" => Command::News(arg),
            "/analyze" => Command::Analyze(arg),
            "/start" | "/help" => Command::Help,
            _ => Command::Prompt(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_news_with_ticker() {
        assert_eq!(
            Command::parse("/panic-news BTC"),
            Command::PanicNews(Some("BTC".to_string()))
        );
    }

    #[test]
    fn test_verbs_without_argument() {
        assert_eq!(Command::parse("/panic-news"), Command::PanicNews(None));
        assert_eq!(Command::parse("/compare-news   "), Command::CompareNews(None));
        assert_eq!(Command::parse("/news"), Command::News(None));
        assert_eq!(Command::parse("/analyze"), Command::Analyze(None));
    }

    #[test]
    fn test_remainder_is_single_argument() {
        assert_eq!(
            Command::parse("/news  solana  etf "),
            Command::News(Some("solana  etf".to_string()))
        );
    }

    #[test]
    fn test_free_text_is_prompt() {
        assert_eq!(
            Command::parse("hello there"),
            Command::Prompt("hello there".to_string())
        );
    }

    #[test]
    fn test_unknown_verb_keeps_full_text() {
        assert_eq!(
            Command::parse("/price BTC"),
            Command::Prompt("/price BTC".to_string())
        );
    }

    #[test]
    fn test_verb_must_match_exactly() {
        assert_eq!(
            Command::parse("/NEWS btc"),
            Command::Prompt("/NEWS btc".to_string())
        );
        assert_eq!(
            Command::parse("/newsletter"),
            Command::Prompt("/newsletter".to_string())
        );
    }

    #[test]
    fn test_bot_mention_suffix() {
        assert_eq!(
            Command::parse("/compare-news@CryptoNewsBot eth"),
            Command::CompareNews(Some("eth".to_string()))
        );
    }

    #[test]
    fn test_help_commands() {
        assert_eq!(Command::parse("/start"), Command::Help);
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn test_split_verb() {
        assert_eq!(split_verb("  /news\tbtc"), ("/news", Some("btc")));
        assert_eq!(split_verb("word"), ("word", None));
        assert_eq!(split_verb(""), ("", None));
    }
}
