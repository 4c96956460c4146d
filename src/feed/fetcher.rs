use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;

use crate::config::FeedSource;
use crate::error::Result;

/// One entry of a feed, as handed to the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    /// Plain-text rendering of the entry's content or summary, if any.
    pub summary: Option<String>,
}

pub trait FeedReader {
    async fn fetch_items(&self, source: &FeedSource, limit: usize) -> Result<Vec<FeedItem>>;
}

/// Parses RSS/Atom bytes into at most `limit` items, in feed order.
pub fn parse_items(bytes: &[u8], limit: usize) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .take(limit)
        .map(|entry| {
            // Try content first, then fall back to summary
            let content_html = entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_ref())
                .or_else(|| entry.summary.as_ref().map(|s| &s.content));

            let summary = content_html
                .and_then(|html| html2text::from_read(html.as_bytes(), 80).ok())
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());

            FeedItem {
                title: entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string()),
                link: entry.links.first().map(|l| l.href.clone()),
                summary,
            }
        })
        .collect();

    Ok(items)
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("newsguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl FeedReader for FeedFetcher {
    async fn fetch_items(&self, source: &FeedSource, limit: usize) -> Result<Vec<FeedItem>> {
        let response = self.client.get(&source.url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed {}: HTTP {}", source.name, response.status()).into());
        }

        let bytes = response.bytes().await?;
        let items = parse_items(&bytes[..], limit)?;
        tracing::debug!("Fetched {} items from {}", items.len(), source.name);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Testfeed</title>
    <link>https://example.org/</link>
    <description>Nachrichten</description>
    <item>
      <title>Erste Meldung</title>
      <link>https://example.org/eins</link>
      <description>&lt;p&gt;Kurzer &lt;b&gt;Teaser&lt;/b&gt; zur Meldung&lt;/p&gt;</description>
    </item>
    <item>
      <title>Zweite Meldung</title>
      <link>https://example.org/zwei</link>
    </item>
    <item>
      <title>Dritte Meldung</title>
      <link>https://example.org/drei</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_links_and_summaries_up_to_limit() {
        let items = parse_items(RSS.as_bytes(), 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Erste Meldung");
        assert_eq!(items[0].link.as_deref(), Some("https://example.org/eins"));
        let summary = items[0].summary.as_deref().unwrap();
        assert!(summary.contains("Teaser"));
        assert!(!summary.contains("<b>"));
        assert_eq!(items[1].summary, None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_items(b"definitely not a feed", 3).is_err());
    }
}
