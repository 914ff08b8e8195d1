use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::{filter_by_ticker, NewsItem};

pub const DIGEST_HEADER: &str = "Latest Crypto News:";

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

/// Client for the CryptoPanic posts API
pub struct CryptoPanicClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl CryptoPanicClient {
    pub fn new(base_url: String, auth_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            auth_token,
        }
    }

    /// Fetch news posts. The ticker is sent as a server-side filter and
    /// also applied to titles locally.
    pub async fn fetch(&self, ticker: Option<&str>) -> Result<Vec<NewsItem>> {
        let mut query = vec![("auth_token", self.auth_token.as_str()), ("kind", "news")];
        if let Some(t) = ticker {
            query.push(("filter", t));
        }

        debug!("Fetching CryptoPanic posts (ticker: {:?})", ticker);

        let body = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .context("Failed to reach CryptoPanic")?
            .bytes()
            .await
            .context("Failed to read CryptoPanic response")?;

        let items = parse_posts(&body)?;
        Ok(filter_by_ticker(items, ticker))
    }
}

fn parse_posts(body: &[u8]) -> Result<Vec<NewsItem>> {
    let response: PostsResponse =
        serde_json::from_slice(body).context("Failed to decode CryptoPanic response")?;
    Ok(response
        .results
        .into_iter()
        .map(|p| NewsItem::new(p.title, p.url))
        .collect())
}
