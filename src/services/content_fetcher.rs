use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::{FetchError, Result};

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36";

pub trait HtmlFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Only absolute http(s) URLs with a host are fetched.
pub fn validate_http_url(raw: &str) -> std::result::Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("de-DE,de;q=0.9,en;q=0.8"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

impl HtmlFetcher for ContentFetcher {
    async fn fetch(&self, article_url: &str) -> std::result::Result<String, FetchError> {
        let url = validate_http_url(article_url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Failed to fetch {}: {}", article_url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        tracing::debug!(url = %article_url, bytes = html.len(), "Fetched article HTML");
        Ok(html)
    }
}
