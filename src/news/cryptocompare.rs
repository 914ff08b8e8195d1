use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{filter_by_ticker, NewsItem};

pub const DIGEST_HEADER: &str = "Latest Market News:";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(rename = "Data", default)]
    data: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published_on: Option<i64>,
}

/// Client for the CryptoCompare news API. Ticker filtering is client-side only.
pub struct CryptoCompareClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    categories: String,
}

impl CryptoCompareClient {
    pub fn new(base_url: String, api_key: String, categories: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            categories,
        }
    }

    pub async fn fetch(&self, ticker: Option<&str>) -> Result<Vec<NewsItem>> {
        debug!("Fetching CryptoCompare news (ticker: {:?})", ticker);

        let body = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lang", "EN"),
                ("api_key", self.api_key.as_str()),
                ("categories", self.categories.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach CryptoCompare")?
            .bytes()
            .await
            .context("Failed to read CryptoCompare response")?;

        let items = parse_news(&body)?;
        Ok(filter_by_ticker(items, ticker))
    }
}

fn parse_news(body: &[u8]) -> Result<Vec<NewsItem>> {
    let response: NewsResponse =
        serde_json::from_slice(body).context("Failed to decode CryptoCompare response")?;
    Ok(response
        .data
        .into_iter()
        .map(|a| {
            let published_at = a
                .published_on
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .unwrap_or_else(Utc::now);
            NewsItem {
                title: a.title,
                url: a.url,
                published_at,
            }
        })
        .collect())
}
