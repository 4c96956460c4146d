use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per unique URL, written on the first successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub text: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub text: String,
    pub word_count: usize,
}

/// One verdict in an article's time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub article_id: i64,
    pub label: String,
    pub confidence: u8,
    pub category: String,
    pub reasoning_summary: String,
    pub red_flags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub article_id: i64,
    pub label: String,
    pub confidence: u8,
    pub category: String,
    pub reasoning_summary: String,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentAnalysis {
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub topic: String,
    pub count: i64,
}
