use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::update_listeners;
use teloxide::{ApiError, RequestError};
use tracing::{error, info, warn};

use crate::command::{Command, HELP_TEXT};
use crate::config::Config;
use crate::llm::{is_decode_error, LlmClient};
use crate::messenger::Messenger;
use crate::news::cryptocompare::{self, CryptoCompareClient};
use crate::news::cryptopanic::{self, CryptoPanicClient};
use crate::news::newsapi::{self, NewsApiClient};
use crate::news::format_digest;
use crate::sentiment;
use crate::storage::NewsStore;

const PROCESSING_ERROR: &str = "Error processing news data.";

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub messenger: Messenger,
    llm: LlmClient,
    cryptopanic: CryptoPanicClient,
    cryptocompare: CryptoCompareClient,
    newsapi: NewsApiClient,
}

impl AppState {
    pub fn new(config: Config, messenger: Messenger) -> Self {
        let llm = LlmClient::new(config.llm.clone());
        let news = &config.news;
        let cryptopanic =
            CryptoPanicClient::new(news.cryptopanic_url.clone(), news.cryptopanic_token.clone());
        let cryptocompare = CryptoCompareClient::new(
            news.cryptocompare_url.clone(),
            news.cryptocompare_key.clone(),
            news.cryptocompare_categories.clone(),
        );
        let newsapi = NewsApiClient::new(
            news.newsapi_url.clone(),
            news.newsapi_key.clone(),
            news.newsapi_page_size,
        );
        Self {
            config,
            messenger,
            llm,
            cryptopanic,
            cryptocompare,
            newsapi,
        }
    }
}

/// Authorize the bot and consume Telegram updates until the dispatcher stops.
///
/// Polling errors are logged and retried, except a rejected token, which
/// stops the dispatcher and is returned as an error.
pub async fn run(bot: Bot, state: Arc<AppState>) -> Result<()> {
    let me = bot.get_me().await.context("Failed to authorize bot")?;
    info!("Authorized on account {}", me.username());

    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build();

    let token = dispatcher.shutdown_token();
    let revoked = Arc::new(AtomicBool::new(false));
    let flag = revoked.clone();
    let on_listener_error = move |err: RequestError| {
        let token = token.clone();
        let flag = flag.clone();
        async move {
            if token_rejected(&err) {
                error!("Telegram rejected the bot token, stopping update loop");
                flag.store(true, Ordering::SeqCst);
                // Don't await: the dispatcher waits on this handler before it can stop
                let _ = token.shutdown();
            } else {
                warn!("Polling error: {}", err);
            }
        }
    };

    let listener = update_listeners::polling_default(bot).await;
    dispatcher
        .dispatch_with_listener(listener, Arc::new(on_listener_error))
        .await;

    if revoked.load(Ordering::SeqCst) {
        anyhow::bail!("Telegram rejected the bot token");
    }

    info!("Update loop stopped");
    Ok(())
}

fn token_rejected(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::InvalidToken))
}

/// Text worth routing: absent and blank messages are ignored.
fn message_text(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = match message_text(msg.text()) {
        Some(t) => t,
        None => return Ok(()),
    };

    info!("[{}] {}", msg.chat.id, text);

    dispatch(&state, msg.chat.id.0, msg.id.0, text).await;
    Ok(())
}

/// Route one chat message to its handler. Failures are reported to the chat, never returned.
pub async fn dispatch(state: &AppState, chat_id: i64, message_id: i32, text: &str) {
    match Command::parse(text) {
        Command::PanicNews(ticker) => panic_news(state, chat_id, ticker.as_deref()).await,
        Command::CompareNews(ticker) => compare_news(state, chat_id, ticker.as_deref()).await,
        Command::News(topic) | Command::Analyze(topic) => {
            analyze_news(state, chat_id, topic.as_deref()).await
        }
        Command::Help => {
            state.messenger.send(chat_id, HELP_TEXT).await;
        }
        Command::Prompt(prompt) => {
            let response = state.llm.reply(&prompt).await;
            state.messenger.reply(chat_id, &response, message_id).await;
        }
    }
}

/// Pick the user-facing text for a failed fetch.
fn failure_text(err: &anyhow::Error, fetch_text: &'static str) -> &'static str {
    if is_decode_error(err) {
        PROCESSING_ERROR
    } else {
        fetch_text
    }
}

async fn panic_news(state: &AppState, chat_id: i64, ticker: Option<&str>) {
    let store = match NewsStore::open(&state.config.storage.database_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Error opening news database: {:#}", e);
            state
                .messenger
                .send(chat_id, "Error opening news database.")
                .await;
            return;
        }
    };

    let items = match state.cryptopanic.fetch(ticker).await {
        Ok(items) => items,
        Err(e) => {
            error!("Error fetching crypto news: {:#}", e);
            let text = failure_text(&e, "Error fetching crypto news.");
            state.messenger.send(chat_id, text).await;
            return;
        }
    };

    let stored = store.insert_all(&items);
    drop(store);
    info!("Stored {}/{} CryptoPanic items", stored, items.len());

    let digest = format_digest(cryptopanic::DIGEST_HEADER, &items);
    state.messenger.send(chat_id, &digest).await;
}

async fn compare_news(state: &AppState, chat_id: i64, ticker: Option<&str>) {
    let items = match state.cryptocompare.fetch(ticker).await {
        Ok(items) => items,
        Err(e) => {
            error!("Error fetching CryptoCompare news: {:#}", e);
            let text = failure_text(&e, "Error fetching news.");
            state.messenger.send(chat_id, text).await;
            return;
        }
    };

    let digest = format_digest(cryptocompare::DIGEST_HEADER, &items);
    state.messenger.send(chat_id, &digest).await;
}

async fn analyze_news(state: &AppState, chat_id: i64, topic: Option<&str>) {
    let query = topic.unwrap_or(&state.config.news.default_query);

    let response = match state.newsapi.search(query).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error fetching news from NewsAPI: {:#}", e);
            let text = failure_text(&e, "Error fetching news.");
            state.messenger.send(chat_id, text).await;
            return;
        }
    };

    if response.status == "error" {
        warn!("NewsAPI reported an error status for query '{}'", query);
    }

    if response.articles.is_empty() {
        state
            .messenger
            .send(chat_id, "No relevant articles found for analysis.")
            .await;
    } else {
        for article in &response.articles {
            let sentiment = state.llm.reply(&article.sentiment_prompt()).await;
            let decision = sentiment::classify(&sentiment);
            let text = format!(
                "Article: {}\nSentiment: {}\nDecision: {}\nURL: {}\n",
                article.title, sentiment, decision, article.url
            );
            state.messenger.send(chat_id, &text).await;
        }
    }

    state
        .messenger
        .send(chat_id, &newsapi::format_articles(&response))
        .await;
}
