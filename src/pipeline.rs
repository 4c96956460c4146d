use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::ai::{HttpLlmGateway, LlmGateway};
use crate::analysis::{extract_features, HybridClassifier};
use crate::config::{Config, FeedSource};
use crate::db::AnalysisStore;
use crate::error::{AppError, Result};
use crate::feed::{FeedItem, FeedReader};
use crate::models::{ClassificationResult, NewAnalysis, NewArticle};
use crate::services::{
    extract, validate_http_url, ContentFetcher, ExtractedPage, HtmlFetcher, EXCERPT_CHARS,
};

/// Counters for one pass over the configured feeds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fetch, extract, score and optionally persist a single article.
pub struct Pipeline<F, G> {
    fetcher: F,
    classifier: HybridClassifier<G>,
}

impl Pipeline<ContentFetcher, HttpLlmGateway> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ContentFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
        let gateway = HttpLlmGateway::new(&config.llm)?;
        Ok(Self::new(fetcher, gateway))
    }
}

impl<F: HtmlFetcher, G: LlmGateway> Pipeline<F, G> {
    pub fn new(fetcher: F, gateway: G) -> Self {
        Self {
            fetcher,
            classifier: HybridClassifier::new(gateway),
        }
    }

    async fn analyze(&self, url: &str) -> Result<(ExtractedPage, ClassificationResult)> {
        let html = self.fetcher.fetch(url).await?;
        let page = extract(&html, url);
        let features = extract_features(&page.text, url);
        debug!(%url, words = features.word_count, "Extracted article");

        let result = self
            .classifier
            .classify(&page.title, url, &page.text, &page.excerpt, &features)
            .await;
        Ok((page, result))
    }

    /// Classifies the article at `url` without persisting anything.
    #[instrument(level = "info", skip(self))]
    pub async fn classify_from_url(&self, url: &str) -> Result<ClassificationResult> {
        let (_, result) = self.analyze(url).await?;
        Ok(result)
    }

    /// Classifies text the caller already has, e.g. a feed item's summary.
    pub async fn classify_text(&self, title: &str, url: &str, text: &str) -> ClassificationResult {
        let features = extract_features(text, url);
        let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
        self.classifier
            .classify(title, url, text, &excerpt, &features)
            .await
    }

    /// Classifies `url`, makes sure its article row exists and appends one
    /// analysis row. Fetch failures abort before anything is written.
    #[instrument(level = "info", skip(self, store))]
    pub async fn run_and_store<S: AnalysisStore>(
        &self,
        url: &str,
        store: &S,
    ) -> Result<ClassificationResult> {
        let (page, result) = self.analyze(url).await?;

        let article_id = resolve_article_id(
            store,
            NewArticle {
                url: url.to_string(),
                title: page.title,
                text: page.text,
                word_count: result.word_count,
            },
        )
        .await?;

        store
            .insert_analysis(NewAnalysis {
                article_id,
                label: result.label.as_str().to_string(),
                confidence: result.confidence,
                category: result.category.as_str().to_string(),
                reasoning_summary: result.reasoning_summary.clone(),
                red_flags: result.red_flags.clone(),
            })
            .await?;

        info!(
            %url,
            label = result.label.as_str(),
            confidence = result.confidence,
            category = result.category.as_str(),
            method = result.method.as_str(),
            llm_status = %result.llm_status,
            "Stored analysis"
        );
        Ok(result)
    }

    /// Analyses the newest items of every source. One bad feed or item never
    /// stops the rest.
    pub async fn run_batch<R, S>(
        &self,
        reader: &R,
        sources: &[FeedSource],
        items_per_feed: usize,
        max_concurrent: usize,
        store: &S,
    ) -> BatchReport
    where
        R: FeedReader,
        S: AnalysisStore,
    {
        let mut report = BatchReport::default();
        let mut links = Vec::new();

        for source in sources {
            let items = match reader.fetch_items(source, items_per_feed).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(feed = %source.name, error = %e, "Feed could not be read");
                    report.failed += 1;
                    continue;
                }
            };
            for item in items {
                match valid_link(&item) {
                    Some(link) => links.push(link),
                    None => {
                        warn!(feed = %source.name, link = ?item.link, "Skipping feed item without a valid link");
                        report.skipped += 1;
                    }
                }
            }
        }

        let outcomes: Vec<bool> = stream::iter(links)
            .map(|link| async move {
                match self.run_and_store(&link, store).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(%link, error = %e, "Analysis failed");
                        false
                    }
                }
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;

        for ok in outcomes {
            if ok {
                report.analyzed += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            analyzed = report.analyzed,
            skipped = report.skipped,
            failed = report.failed,
            "Feed batch finished"
        );
        report
    }
}

fn valid_link(item: &FeedItem) -> Option<String> {
    let link = item.link.as_deref()?;
    validate_http_url(link).ok().map(|_| link.trim().to_string())
}

/// Looks the article up by URL and creates it when missing. A concurrent
/// insert of the same URL surfaces as a conflict and is resolved by reading
/// the winner's row.
pub async fn resolve_article_id<S: AnalysisStore>(store: &S, article: NewArticle) -> Result<i64> {
    if let Some(existing) = store.find_article_by_url(&article.url).await? {
        return Ok(existing.id);
    }

    let url = article.url.clone();
    match store.insert_article(article).await {
        Ok(id) => Ok(id),
        Err(AppError::DuplicateArticle(_)) => {
            debug!(%url, "Article inserted concurrently, re-reading");
            store
                .find_article_by_url(&url)
                .await?
                .map(|a| a.id)
                .ok_or_else(|| anyhow::anyhow!("article {url} vanished after insert conflict").into())
        }
        Err(e) => Err(e),
    }
}
