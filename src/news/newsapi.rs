use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

pub const NO_RESULTS: &str = "No recent news found for the given topic.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Prompt asking the model for the sentiment of this article.
    pub fn sentiment_prompt(&self) -> String {
        format!(
            "Analyze the sentiment of this news article titled '{}': {}",
            self.title,
            self.description.as_deref().unwrap_or_default()
        )
    }
}

/// Client for the NewsAPI `everything` endpoint; the keyword query is server-side.
pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl NewsApiClient {
    pub fn new(base_url: String, api_key: String, page_size: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            page_size,
        }
    }

    pub async fn search(&self, query: &str) -> Result<NewsApiResponse> {
        let page_size = self.page_size.to_string();
        let request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("q", query),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .build()
            .context("Failed to build NewsAPI request")?;

        debug!("NewsAPI request for query '{}' ({})", query, request.url().path());

        let body = self
            .client
            .execute(request)
            .await
            .context("Failed to reach NewsAPI")?
            .bytes()
            .await
            .context("Failed to read NewsAPI response")?;

        parse_response(&body)
    }
}

fn parse_response(body: &[u8]) -> Result<NewsApiResponse> {
    serde_json::from_slice(body).context("Failed to decode NewsAPI response")
}

/// Render the article list, or [`NO_RESULTS`] when the provider reported none.
pub fn format_articles(response: &NewsApiResponse) -> String {
    if response.total_results == 0 {
        return NO_RESULTS.to_string();
    }

    let mut out = String::from("Latest News:\n");
    for article in &response.articles {
        let published = article
            .published_at
            .map(|t| t.format("%a, %d %b %Y %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "Title: {}\nAuthor: {}\nSource: {}\nPublished: {}\nURL: {}\n\n",
            article.title,
            article.author.as_deref().unwrap_or_default(),
            article.source.name.as_deref().unwrap_or_default(),
            published,
            article.url
        ));
    }
    out
}
