use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_cryptopanic_url")]
    pub cryptopanic_url: String,
    #[serde(default = "default_cryptocompare_url")]
    pub cryptocompare_url: String,
    #[serde(default = "default_cryptocompare_categories")]
    pub cryptocompare_categories: String,
    #[serde(default = "default_newsapi_url")]
    pub newsapi_url: String,
    #[serde(default = "default_newsapi_page_size")]
    pub newsapi_page_size: u32,
    /// Query used by /news and /analyze when no ticker is given
    #[serde(default = "default_query")]
    pub default_query: String,
    #[serde(skip)]
    pub cryptopanic_token: String,
    #[serde(skip)]
    pub cryptocompare_key: String,
    #[serde(skip)]
    pub newsapi_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Chat that receives forwarded trading alerts
    #[serde(default)]
    pub alert_chat_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(skip)]
    pub bot_token: String,
    #[serde(default = "default_llm_config")]
    pub llm: LlmConfig,
    #[serde(default = "default_news_config")]
    pub news: NewsConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
    #[serde(default = "default_webhook_config")]
    pub webhook: WebhookConfig,
    /// Resolved destination for webhook alerts (env over file)
    #[serde(skip)]
    pub alert_chat_id: i64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4-0125-preview".to_string()
}

fn default_cryptopanic_url() -> String {
    "https://cryptopanic.com/api/v1/posts/".to_string()
}

fn default_cryptocompare_url() -> String {
    "https://min-api.cryptocompare.com/data/v2/news/".to_string()
}

fn default_cryptocompare_categories() -> String {
    "BTC,ETH".to_string()
}

fn default_newsapi_url() -> String {
    "https://newsapi.org/v2/everything".to_string()
}

fn default_newsapi_page_size() -> u32 {
    1
}

fn default_query() -> String {
    "cryptocurrency".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("crypto_news.db")
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_llm_config() -> LlmConfig {
    LlmConfig {
        base_url: default_llm_base_url(),
        model: default_llm_model(),
        api_key: String::new(),
    }
}

fn default_news_config() -> NewsConfig {
    NewsConfig {
        cryptopanic_url: default_cryptopanic_url(),
        cryptocompare_url: default_cryptocompare_url(),
        cryptocompare_categories: default_cryptocompare_categories(),
        newsapi_url: default_newsapi_url(),
        newsapi_page_size: default_newsapi_page_size(),
        default_query: default_query(),
        cryptopanic_token: String::new(),
        cryptocompare_key: String::new(),
        newsapi_key: String::new(),
    }
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
    }
}

fn default_webhook_config() -> WebhookConfig {
    WebhookConfig {
        listen_addr: default_listen_addr(),
        alert_chat_id: None,
    }
}

/// Read a required setting, failing with the variable name if it is unset or blank.
pub fn required_var<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("Environment variable {} is not set", key),
    }
}

impl Config {
    /// Load settings from an optional TOML file, then secrets from the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?
        } else {
            String::new()
        };

        Self::from_parts(&content, |key| std::env::var(key).ok())
    }

    /// Build a config from TOML text and an environment lookup.
    pub fn from_parts<F>(toml_text: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config =
            toml::from_str(toml_text).context("Failed to parse config file")?;

        config.bot_token = required_var(&env, "TELEGRAM_BOT_TOKEN")?;
        config.llm.api_key = required_var(&env, "OPENAI_API_KEY")?;
        config.news.cryptopanic_token = required_var(&env, "CRYPTOPANIC_AUTH_TOKEN")?;
        config.news.cryptocompare_key = required_var(&env, "CRYPTOCOMPARE_API_KEY")?;
        config.news.newsapi_key = required_var(&env, "NEWSAPI_API_KEY")?;

        let from_env = match env("ALERT_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .with_context(|| format!("ALERT_CHAT_ID is not a valid chat id: {}", raw))?,
            ),
            None => None,
        };

        config.alert_chat_id = from_env.or(config.webhook.alert_chat_id).context(
            "No alert chat configured: set ALERT_CHAT_ID or [webhook] alert_chat_id",
        )?;

        Ok(config)
    }
}
