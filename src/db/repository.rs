use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{AnalysisRecord, Article, CategoryCount, NewAnalysis, NewArticle, RecentAnalysis};

use super::schema::SCHEMA;

/// The three writes/reads the pipeline needs from persistence.
pub trait AnalysisStore {
    async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Fails with [`AppError::DuplicateArticle`] when the URL already exists.
    async fn insert_article(&self, article: NewArticle) -> Result<i64>;

    async fn insert_analysis(&self, analysis: NewAnalysis) -> Result<i64>;
}

pub struct Repository {
    conn: Connection,
}

fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
    matches!(
        err,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
    )
}

impl Repository {
    /// Opens (or creates) the database, creating missing parent directories.
    pub async fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Article operations

    pub async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let url = url.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, title, text, word_count, created_at FROM articles WHERE url = ?1",
                )?;
                let article = stmt.query_row(params![url], article_from_row).optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    pub async fn create_article(&self, article: NewArticle) -> Result<i64> {
        let url = article.url.clone();
        let result = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (url, title, text, word_count) VALUES (?1, ?2, ?3, ?4)",
                    params![article.url, article.title, article.text, article.word_count as i64],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await;

        match result {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateArticle(url)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count_articles(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    // Analysis operations

    pub async fn create_analysis(&self, analysis: NewAnalysis) -> Result<i64> {
        let red_flags = serde_json::to_string(&analysis.red_flags)?;
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO analysis (article_id, label, confidence, category, reasoning_summary, red_flags)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        analysis.article_id,
                        analysis.label,
                        analysis.confidence,
                        analysis.category,
                        analysis.reasoning_summary,
                        red_flags,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Verdict history for one article, newest first.
    pub async fn analyses_for_article(&self, article_id: i64) -> Result<Vec<AnalysisRecord>> {
        let analyses = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, article_id, label, confidence, category, reasoning_summary, red_flags, created_at
                       FROM analysis WHERE article_id = ?1
                       ORDER BY created_at DESC, id DESC"#,
                )?;
                let analyses = stmt
                    .query_map(params![article_id], analysis_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(analyses)
            })
            .await?;
        Ok(analyses)
    }

    pub async fn recent_analyses(&self, limit: usize) -> Result<Vec<RecentAnalysis>> {
        let analyses = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT an.id, an.article_id, an.label, an.confidence, an.category,
                              an.reasoning_summary, an.red_flags, an.created_at,
                              a.url, a.title
                       FROM analysis an
                       JOIN articles a ON an.article_id = a.id
                       ORDER BY an.created_at DESC, an.id DESC
                       LIMIT ?1"#,
                )?;
                let analyses = stmt
                    .query_map(params![limit as i64], |row| {
                        Ok(RecentAnalysis {
                            analysis: analysis_from_row(row)?,
                            url: row.get(8)?,
                            title: row.get(9)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(analyses)
            })
            .await?;
        Ok(analyses)
    }

    /// Category counts over the last `days`, for verdicts at or above
    /// `min_confidence`, most frequent first.
    pub async fn trending_categories(
        &self,
        days: u32,
        min_confidence: u8,
        limit: usize,
    ) -> Result<Vec<CategoryCount>> {
        let window = format!("-{days} days");
        let counts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT COALESCE(category, 'Unbekannt') AS topic, COUNT(id) AS hits
                       FROM analysis
                       WHERE confidence >= ?1 AND created_at >= datetime('now', ?2)
                       GROUP BY topic
                       ORDER BY hits DESC, topic ASC
                       LIMIT ?3"#,
                )?;
                let counts = stmt
                    .query_map(params![min_confidence, window, limit as i64], |row| {
                        Ok(CategoryCount {
                            topic: row.get(0)?,
                            count: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(counts)
            })
            .await?;
        Ok(counts)
    }
}

impl AnalysisStore for Repository {
    async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        self.get_article_by_url(url).await
    }

    async fn insert_article(&self, article: NewArticle) -> Result<i64> {
        self.create_article(article).await
    }

    async fn insert_analysis(&self, analysis: NewAnalysis) -> Result<i64> {
        self.create_analysis(analysis).await
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime, optionally with fractional seconds
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        text: row.get(3)?,
        word_count: row.get::<_, i64>(4)?.max(0) as usize,
        created_at: timestamp_at(row, 5)?,
    })
}

fn analysis_from_row(row: &Row) -> rusqlite::Result<AnalysisRecord> {
    let red_flags: String = row.get(6)?;
    Ok(AnalysisRecord {
        id: row.get(0)?,
        article_id: row.get(1)?,
        label: row.get(2)?,
        confidence: row.get::<_, i64>(3)?.clamp(0, 100) as u8,
        category: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "Unbekannt".to_string()),
        reasoning_summary: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        red_flags: serde_json::from_str(&red_flags).unwrap_or_default(),
        created_at: timestamp_at(row, 7)?,
    })
}
